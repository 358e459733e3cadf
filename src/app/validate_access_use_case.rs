use std::sync::Arc;

use crate::app::ports::{AccountRepository, TokenPort, TokenProfiles};
use crate::domain::Account;
use crate::error::Result;

/// Resolves an access token to its account. Only the most recently issued access token
/// of an account is accepted.
pub struct ValidateAccessUseCase {
    accounts: Arc<dyn AccountRepository>,
    token: Arc<dyn TokenPort>,
    profiles: TokenProfiles,
}

impl ValidateAccessUseCase {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        token: Arc<dyn TokenPort>,
        profiles: TokenProfiles,
    ) -> Self {
        Self {
            accounts,
            token,
            profiles,
        }
    }

    pub async fn validate(&self, access_token: &str) -> Result<Option<Account>> {
        let Ok(parsed) = self.token.parse(access_token, &self.profiles.access).await else {
            return Ok(None);
        };

        let account = self.accounts.find_by_id(&parsed.payload.id).await?;
        Ok(account.filter(|a| a.access_token.as_deref() == Some(access_token)))
    }
}
