use std::str::FromStr;

use agora_core::{AppError, AppResult, AssociationId};
use agora_domain::UserId;
use serde_json::json;
use tracing::info;

use crate::client_context::ClientContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Status,
    SignIn { email: String, password: String },
    SignOut,
    ResetPassword { email: String },
    Permissions { association_id: AssociationId },
    Onboarded,
}

impl Command {
    pub fn parse(arguments: &[String]) -> AppResult<Self> {
        let words: Vec<&str> = arguments.iter().map(String::as_str).collect();

        match words.as_slice() {
            [] | ["status"] => Ok(Self::Status),
            ["sign-in", email, password] => Ok(Self::SignIn {
                email: (*email).to_owned(),
                password: (*password).to_owned(),
            }),
            ["sign-out"] => Ok(Self::SignOut),
            ["reset-password", email] => Ok(Self::ResetPassword {
                email: (*email).to_owned(),
            }),
            ["permissions", association_id] => Ok(Self::Permissions {
                association_id: AssociationId::from_str(association_id)?,
            }),
            ["onboarded"] => Ok(Self::Onboarded),
            _ => Err(AppError::Validation(format!(
                "unknown command '{}'; expected one of: status, sign-in <email> <password>, \
                 sign-out, reset-password <email>, permissions <association-id>, onboarded",
                words.join(" ")
            ))),
        }
    }
}

pub async fn run(context: &ClientContext, command: Command) -> AppResult<()> {
    match command {
        Command::Status => {
            let route = context.auth.launch_route().await;
            let user = context.auth.current_session().map(|session| session.user);
            println!(
                "{}",
                json!({
                    "route": route.as_str(),
                    "user": user.as_ref().map(|user| user.display_name()),
                })
            );
        }
        Command::SignIn { email, password } => {
            let session = context.auth.sign_in(email.as_str(), password.as_str()).await?;
            println!("signed in as {}", session.user.display_name());
        }
        Command::SignOut => {
            context.auth.sign_out().await?;
            println!("signed out");
        }
        Command::ResetPassword { email } => {
            context.auth.request_password_reset(email.as_str()).await?;
            println!("password reset email requested for {email}");
        }
        Command::Permissions { association_id } => {
            let subject = context
                .auth
                .current_session()
                .map(|session| UserId::from_identity(&session.user));
            if subject.is_none() {
                info!("no signed-in user, permissions resolve to no role");
            }

            let snapshot = context
                .permissions
                .resolve(subject, Some(association_id))
                .await;
            let role = snapshot.role();
            println!(
                "{}",
                json!({
                    "association_id": association_id,
                    "role": role,
                    "label": role.label(),
                    "icon": role.icon(),
                    "description": role.description(),
                    "lookup_failed": snapshot.lookup_failed(),
                    "capabilities": snapshot.capabilities(),
                })
            );
        }
        Command::Onboarded => {
            context.auth.complete_onboarding().await?;
            println!("onboarding marked as completed");
        }
    }

    Ok(())
}
