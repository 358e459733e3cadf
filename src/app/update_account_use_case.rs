use std::sync::Arc;

use crate::app::outcome::{DomainFailure, Outcome};
use crate::app::ports::{AccountRepository, HasherPort};
use crate::domain::{Account, AccountChanges};
use crate::error::{Result, TaskerError};

/// Changes name, e-mail or password. Unspecified fields keep their values.
pub struct UpdateAccountUseCase {
    accounts: Arc<dyn AccountRepository>,
    hasher: Arc<dyn HasherPort>,
}

impl UpdateAccountUseCase {
    pub fn new(accounts: Arc<dyn AccountRepository>, hasher: Arc<dyn HasherPort>) -> Self {
        Self { accounts, hasher }
    }

    pub async fn update(&self, changes: AccountChanges, account_id: &str) -> Result<Outcome<Account>> {
        let Some(account) = self.accounts.find_by_id(account_id).await? else {
            return Ok(Err(DomainFailure::AccountNotFound));
        };

        if let Some(email) = &changes.email {
            if let Some(owner) = self.accounts.find_by_email(email).await? {
                if owner.id != account.id {
                    return Ok(Err(DomainFailure::EmailAlreadyExists));
                }
            }
        }

        let password = match &changes.password {
            Some(plain) => Some(self.hasher.encrypt(plain).await?),
            None => None,
        };

        // Tokens only change through login and refresh
        let changes = AccountChanges {
            name: changes.name,
            email: changes.email,
            password,
            access_token: None,
            refresh_token: None,
        };

        match self.accounts.update(changes, &account.id).await {
            Ok(Some(updated)) => Ok(Ok(updated)),
            Ok(None) => Ok(Err(DomainFailure::AccountNotFound)),
            Err(TaskerError::DuplicateEmail) => Ok(Err(DomainFailure::EmailAlreadyExists)),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::{seed_account, FakeHasher};
    use crate::storage::InMemoryStore;

    fn use_case(store: &InMemoryStore) -> UpdateAccountUseCase {
        UpdateAccountUseCase::new(Arc::new(store.accounts()), Arc::new(FakeHasher))
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let store = InMemoryStore::new();
        let before = seed_account(&store, "acc-1", "a@x").await;

        let changes = AccountChanges {
            name: Some("Ada Lovelace".into()),
            password: Some("brand-new".into()),
            ..Default::default()
        };
        let updated = use_case(&store).update(changes, "acc-1").await.unwrap().unwrap();

        assert_eq!(updated.name, "Ada Lovelace");
        assert_eq!(updated.email, before.email);
        assert_eq!(updated.password, "hashed:brand-new");
    }

    #[tokio::test]
    async fn test_same_update_twice_is_stable() {
        let store = InMemoryStore::new();
        seed_account(&store, "acc-1", "a@x").await;
        let use_case = use_case(&store);
        let changes = AccountChanges {
            name: Some("Grace".into()),
            email: Some("a@x".into()),
            ..Default::default()
        };

        let first = use_case.update(changes.clone(), "acc-1").await.unwrap().unwrap();
        let second = use_case.update(changes, "acc-1").await.unwrap().unwrap();
        assert_eq!(first.name, second.name);
        assert_eq!(first.email, second.email);
        assert_eq!(first.password, second.password);
    }

    #[tokio::test]
    async fn test_email_taken_by_other_account() {
        let store = InMemoryStore::new();
        seed_account(&store, "acc-1", "a@x").await;
        seed_account(&store, "acc-2", "b@x").await;

        let changes = AccountChanges {
            email: Some("b@x".into()),
            ..Default::default()
        };
        assert_eq!(
            use_case(&store).update(changes, "acc-1").await.unwrap(),
            Err(DomainFailure::EmailAlreadyExists)
        );
    }

    /// Another account claims the e-mail while the password is being hashed.
    struct RacingHasher {
        store: InMemoryStore,
    }

    #[async_trait::async_trait]
    impl HasherPort for RacingHasher {
        async fn encrypt(&self, plain: &str) -> Result<String> {
            seed_account(&self.store, "acc-2", "b@x").await;
            Ok(format!("hashed:{plain}"))
        }

        async fn parse(&self, plain: &str, hash: &str) -> Result<bool> {
            Ok(hash == format!("hashed:{plain}"))
        }
    }

    #[tokio::test]
    async fn test_email_claimed_during_update() {
        let store = InMemoryStore::new();
        seed_account(&store, "acc-1", "a@x").await;
        let use_case = UpdateAccountUseCase::new(
            Arc::new(store.accounts()),
            Arc::new(RacingHasher {
                store: store.clone(),
            }),
        );

        let changes = AccountChanges {
            email: Some("b@x".into()),
            password: Some("brand-new".into()),
            ..Default::default()
        };
        assert_eq!(
            use_case.update(changes, "acc-1").await.unwrap(),
            Err(DomainFailure::EmailAlreadyExists)
        );
    }

    #[tokio::test]
    async fn test_missing_account() {
        let store = InMemoryStore::new();
        assert_eq!(
            use_case(&store)
                .update(AccountChanges::default(), "ghost")
                .await
                .unwrap(),
            Err(DomainFailure::AccountNotFound)
        );
    }
}
