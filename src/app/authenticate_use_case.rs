use std::sync::Arc;

use tracing::{debug, info};

use crate::app::outcome::{DomainFailure, Outcome};
use crate::app::ports::{AccountRepository, HasherPort, TokenPayload, TokenPort, TokenProfiles};
use crate::domain::{Account, AccountChanges, Credentials};
use crate::error::Result;
use crate::observability::metrics;

/// Login. A successful login always issues a new token pair, which makes every earlier
/// pair stale.
pub struct AuthenticateUseCase {
    accounts: Arc<dyn AccountRepository>,
    hasher: Arc<dyn HasherPort>,
    token: Arc<dyn TokenPort>,
    profiles: TokenProfiles,
}

impl AuthenticateUseCase {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        hasher: Arc<dyn HasherPort>,
        token: Arc<dyn TokenPort>,
        profiles: TokenProfiles,
    ) -> Self {
        Self {
            accounts,
            hasher,
            token,
            profiles,
        }
    }

    pub async fn auth(&self, credentials: &Credentials) -> Result<Outcome<Account>> {
        let Some(account) = self.accounts.find_by_email(&credentials.email).await? else {
            metrics::auth::login_failed();
            return Ok(Err(DomainFailure::AccountNotFound));
        };

        if !self
            .hasher
            .parse(&credentials.password, &account.password)
            .await?
        {
            metrics::auth::login_failed();
            debug!("Rejected login for account {}", account.id);
            return Ok(Err(DomainFailure::IncorrectPassword));
        }

        let payload = TokenPayload::for_account(account.id.clone());
        let access_token = self.token.generate(&payload, &self.profiles.access).await?;
        let refresh_token = self.token.generate(&payload, &self.profiles.refresh).await?;

        let updated = self
            .accounts
            .update(AccountChanges::tokens(access_token, refresh_token), &account.id)
            .await?;

        match updated {
            Some(account) => {
                metrics::auth::login_success();
                info!("Account {} logged in", account.id);
                Ok(Ok(account))
            }
            None => Ok(Err(DomainFailure::AccountNotFound)),
        }
    }
}
