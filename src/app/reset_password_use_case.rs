use std::sync::Arc;

use tracing::info;

use crate::app::outcome::{DomainFailure, Outcome};
use crate::app::ports::{AccountRepository, HasherPort};
use crate::domain::{Account, AccountChanges};
use crate::error::Result;

/// Data taken from a verified recover token plus the new password.
#[derive(Debug, Clone)]
pub struct ResetPasswordData {
    pub password: String,
    pub account_id: String,
    /// Password fingerprint the recover token was issued against.
    pub fingerprint: Option<String>,
}

/// Replaces the password of the account a recover token was issued for.
///
/// The token stays usable only while the password it was issued against is unchanged,
/// so the first successful reset retires it.
pub struct ResetPasswordUseCase {
    accounts: Arc<dyn AccountRepository>,
    hasher: Arc<dyn HasherPort>,
}

impl ResetPasswordUseCase {
    pub fn new(accounts: Arc<dyn AccountRepository>, hasher: Arc<dyn HasherPort>) -> Self {
        Self { accounts, hasher }
    }

    pub async fn reset(&self, data: ResetPasswordData) -> Result<Outcome<Account>> {
        let Some(account) = self.accounts.find_by_id(&data.account_id).await? else {
            return Ok(Err(DomainFailure::AccountNotFound));
        };

        if data.fingerprint.as_deref() != Some(account.password_fingerprint().as_str()) {
            return Ok(Err(DomainFailure::RecoverTokenUsed));
        }

        let password = self.hasher.encrypt(&data.password).await?;
        let changes = AccountChanges {
            password: Some(password),
            ..Default::default()
        };

        match self.accounts.update(changes, &account.id).await? {
            Some(updated) => {
                crate::observability::metrics::auth::password_reset();
                info!("Password reset for account {}", updated.id);
                Ok(Ok(updated))
            }
            None => Ok(Err(DomainFailure::AccountNotFound)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::{seed_account, FakeHasher};
    use crate::storage::InMemoryStore;

    #[tokio::test]
    async fn test_reset_hashes_new_password_and_retires_token() {
        let store = InMemoryStore::new();
        let account = seed_account(&store, "acc-1", "a@x").await;
        let use_case = ResetPasswordUseCase::new(Arc::new(store.accounts()), Arc::new(FakeHasher));
        let data = ResetPasswordData {
            password: "new-secret".into(),
            account_id: "acc-1".into(),
            fingerprint: Some(account.password_fingerprint()),
        };

        let updated = use_case.reset(data.clone()).await.unwrap().unwrap();
        assert_eq!(updated.password, "hashed:new-secret");

        // Same token again: the password it was bound to is gone
        assert_eq!(
            use_case.reset(data).await.unwrap(),
            Err(DomainFailure::RecoverTokenUsed)
        );
    }

    #[tokio::test]
    async fn test_unknown_account_and_missing_fingerprint() {
        let store = InMemoryStore::new();
        seed_account(&store, "acc-1", "a@x").await;
        let use_case = ResetPasswordUseCase::new(Arc::new(store.accounts()), Arc::new(FakeHasher));

        let ghost = ResetPasswordData {
            password: "new-secret".into(),
            account_id: "ghost".into(),
            fingerprint: None,
        };
        assert_eq!(
            use_case.reset(ghost).await.unwrap(),
            Err(DomainFailure::AccountNotFound)
        );

        let unbound = ResetPasswordData {
            password: "new-secret".into(),
            account_id: "acc-1".into(),
            fingerprint: None,
        };
        assert_eq!(
            use_case.reset(unbound).await.unwrap(),
            Err(DomainFailure::RecoverTokenUsed)
        );
    }
}
