use std::sync::Arc;

use tracing::info;

use crate::app::ports::{
    AccountRepository, MailerPort, SendEmailData, TokenPayload, TokenPort, TokenProfiles,
};
use crate::constants::{RECOVER_EMAIL_SUBJECT, RECOVER_PASSWORD_TEMPLATE};
use crate::error::Result;

/// Mails a recover token to the owner of an e-mail address.
pub struct SendRecoverEmailUseCase {
    accounts: Arc<dyn AccountRepository>,
    token: Arc<dyn TokenPort>,
    mailer: Arc<dyn MailerPort>,
    profiles: TokenProfiles,
    port: u16,
}

impl SendRecoverEmailUseCase {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        token: Arc<dyn TokenPort>,
        mailer: Arc<dyn MailerPort>,
        profiles: TokenProfiles,
        port: u16,
    ) -> Self {
        Self {
            accounts,
            token,
            mailer,
            profiles,
            port,
        }
    }

    /// Returns `false` when no account uses the address.
    pub async fn send(&self, email: &str) -> Result<bool> {
        let Some(account) = self.accounts.find_by_email(email).await? else {
            return Ok(false);
        };

        let payload = TokenPayload {
            id: account.id.clone(),
            fingerprint: Some(account.password_fingerprint()),
        };
        let recover_token = self.token.generate(&payload, &self.profiles.recover).await?;

        let html = RECOVER_PASSWORD_TEMPLATE
            .replace("{TOKEN}", &recover_token)
            .replace("{PORT}", &self.port.to_string());

        self.mailer
            .send(&SendEmailData {
                to: account.email.clone(),
                subject: RECOVER_EMAIL_SUBJECT.to_string(),
                html: Some(html),
            })
            .await?;

        crate::observability::metrics::auth::recover_email_sent();
        info!("Recover e-mail sent for account {}", account.id);
        Ok(true)
    }
}
