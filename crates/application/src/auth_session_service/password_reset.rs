use agora_domain::EmailAddress;
use tracing::info;

use super::*;

impl AuthSessionService {
    /// Asks the identity service to email a password reset link.
    ///
    /// Malformed addresses are rejected before any request is made; errors
    /// reported by the service are returned so the UI can show them.
    pub async fn request_password_reset(&self, email: &str) -> AppResult<()> {
        let email = EmailAddress::new(email)?;

        self.identity_provider
            .request_password_reset(&email, self.password_reset_redirect.as_str())
            .await?;

        info!("password reset requested");
        Ok(())
    }
}
