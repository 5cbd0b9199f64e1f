use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use agora_core::{AppError, AssociationId};
use agora_domain::UserId;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipSeed {
    pub association_id: AssociationId,
    pub subject: UserId,
    pub role: String,
}

#[derive(Debug, Clone)]
pub enum MembershipStoreConfig {
    Rest { table: String },
    Postgres { database_url: String },
    Memory { seed: Vec<MembershipSeed> },
}

#[derive(Debug, Clone)]
pub enum DeviceStoreConfig {
    File(PathBuf),
    Memory,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub backend_url: String,
    pub anon_key: String,
    pub membership_store: MembershipStoreConfig,
    pub device_store: DeviceStoreConfig,
    pub password_reset_redirect: String,
    pub http_timeout_seconds: u64,
}

impl ClientConfig {
    pub fn load() -> Result<Self, AppError> {
        let backend_url = required_non_empty_env("AGORA_BACKEND_URL")?;
        let anon_key = required_non_empty_env("AGORA_ANON_KEY")?;

        let membership_store = match env::var("AGORA_MEMBERSHIP_STORE")
            .unwrap_or_else(|_| "rest".to_owned())
            .as_str()
        {
            "rest" => MembershipStoreConfig::Rest {
                table: env::var("AGORA_MEMBERSHIP_TABLE")
                    .unwrap_or_else(|_| "association_members".to_owned()),
            },
            "postgres" => MembershipStoreConfig::Postgres {
                database_url: required_non_empty_env("DATABASE_URL")?,
            },
            "memory" => MembershipStoreConfig::Memory {
                seed: parse_membership_seed(
                    env::var("AGORA_DEV_MEMBERSHIPS").unwrap_or_default().as_str(),
                )?,
            },
            other => {
                return Err(AppError::Validation(format!(
                    "AGORA_MEMBERSHIP_STORE must be one of 'rest', 'postgres' or 'memory', got '{other}'"
                )));
            }
        };

        let device_store = match env::var("AGORA_DEVICE_STORE")
            .unwrap_or_else(|_| "file".to_owned())
            .as_str()
        {
            "file" => DeviceStoreConfig::File(PathBuf::from(
                env::var("AGORA_DEVICE_STORE_PATH")
                    .unwrap_or_else(|_| ".agora/device.json".to_owned()),
            )),
            "memory" => DeviceStoreConfig::Memory,
            other => {
                return Err(AppError::Validation(format!(
                    "AGORA_DEVICE_STORE must be either 'file' or 'memory', got '{other}'"
                )));
            }
        };

        let password_reset_redirect = env::var("AGORA_PASSWORD_RESET_REDIRECT")
            .unwrap_or_else(|_| "agora://reset-password".to_owned());

        let http_timeout_seconds = match env::var("AGORA_HTTP_TIMEOUT_SECONDS") {
            Ok(value) => value.parse::<u64>().map_err(|error| {
                AppError::Validation(format!("invalid AGORA_HTTP_TIMEOUT_SECONDS: {error}"))
            })?,
            Err(_) => 15,
        };

        Ok(Self {
            backend_url,
            anon_key,
            membership_store,
            device_store,
            password_reset_redirect,
            http_timeout_seconds,
        })
    }
}

/// Parses `association_id:user_id:role` entries separated by commas.
pub fn parse_membership_seed(value: &str) -> Result<Vec<MembershipSeed>, AppError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| -> Result<MembershipSeed, AppError> {
            let mut parts = entry.splitn(3, ':');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(association_id), Some(subject), Some(role)) => Ok(MembershipSeed {
                    association_id: AssociationId::from_str(association_id)?,
                    subject: UserId::from_str(subject)?,
                    role: role.trim().to_owned(),
                }),
                _ => Err(AppError::Validation(format!(
                    "AGORA_DEV_MEMBERSHIPS entry '{entry}' must be association_id:user_id:role"
                ))),
            }
        })
        .collect()
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::parse_membership_seed;

    #[test]
    fn empty_seed_is_allowed() {
        assert_eq!(parse_membership_seed("").ok().map(|seed| seed.len()), Some(0));
    }

    #[test]
    fn seed_entries_are_parsed() {
        let seed = parse_membership_seed(
            "11111111-1111-1111-1111-111111111111:a2c8ea5f-4f39-4724-97f5-932f97f54f76:president, \
             11111111-1111-1111-1111-111111111111:96d11e90-7403-4654-9727-cb1043f8bd31:editor",
        );
        let roles: Vec<String> = seed
            .map(|seed| seed.into_iter().map(|entry| entry.role).collect())
            .unwrap_or_default();
        assert_eq!(roles, vec!["president".to_owned(), "editor".to_owned()]);
    }

    #[test]
    fn malformed_seed_entry_is_rejected() {
        assert!(parse_membership_seed("not-a-triple").is_err());
        assert!(parse_membership_seed("x:y:admin").is_err());
    }
}
