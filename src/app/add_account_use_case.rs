use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::app::ports::{AccountRepository, HasherPort, TokenPayload, TokenPort, TokenProfiles};
use crate::domain::{Account, AddAccountData};
use crate::error::{Result, TaskerError};

/// Signup: creates an account with a hashed password and a first token pair.
pub struct AddAccountUseCase {
    accounts: Arc<dyn AccountRepository>,
    hasher: Arc<dyn HasherPort>,
    token: Arc<dyn TokenPort>,
    profiles: TokenProfiles,
}

impl AddAccountUseCase {
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

    /// Returns `None` when the e-mail is already registered.
    pub async fn add(&self, data: AddAccountData) -> Result<Option<Account>> {
        if self.accounts.find_by_email(&data.email).await?.is_some() {
            return Ok(None);
        }

        let password = self.hasher.encrypt(&data.password).await?;
        let id = uuid::Uuid::new_v4().to_string();

        let payload = TokenPayload::for_account(id.clone());
        let access_token = self.token.generate(&payload, &self.profiles.access).await?;
        let refresh_token = self.token.generate(&payload, &self.profiles.refresh).await?;

        let now = Utc::now();
        let created = self
            .accounts
            .create(Account {
                id,
                name: data.name,
                email: data.email,
                password,
                access_token: Some(access_token),
                refresh_token: Some(refresh_token),
                created_at: now,
                updated_at: now,
            })
            .await;
        // A concurrent signup may claim the e-mail after the lookup above
        let account = match created {
            Ok(account) => account,
            Err(TaskerError::DuplicateEmail) => return Ok(None),
            Err(e) => return Err(e),
        };

        crate::observability::metrics::accounts::created();
        info!("Account {} created", account.id);
        Ok(Some(account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::{token_port, token_profiles, FakeHasher};
    use crate::storage::InMemoryStore;

    fn use_case(store: &InMemoryStore) -> AddAccountUseCase {
        AddAccountUseCase::new(
            Arc::new(store.accounts()),
            Arc::new(FakeHasher),
            token_port(),
            token_profiles(),
        )
    }

    fn signup() -> AddAccountData {
        AddAccountData {
            name: "Ada".into(),
            email: "a@x".into(),
            password: "hunter22".into(),
        }
    }

    #[tokio::test]
    async fn test_creates_account_with_hashed_password_and_tokens() {
        let store = InMemoryStore::new();
        let account = use_case(&store).add(signup()).await.unwrap().unwrap();

        assert_eq!(account.password, "hashed:hunter22");
        assert!(account.access_token.as_deref().is_some_and(|t| !t.is_empty()));
        assert!(account.refresh_token.as_deref().is_some_and(|t| !t.is_empty()));

        let stored = store.accounts().find_by_email("a@x").await.unwrap().unwrap();
        assert_eq!(stored, account);
    }

    #[tokio::test]
    async fn test_duplicate_email_returns_none() {
        let store = InMemoryStore::new();
        let use_case = use_case(&store);
        use_case.add(signup()).await.unwrap().unwrap();

        assert!(use_case.add(signup()).await.unwrap().is_none());
    }

    /// Gives up the executor while hashing, like bcrypt on a blocking thread.
    struct YieldingHasher;

    #[async_trait::async_trait]
    impl HasherPort for YieldingHasher {
        async fn encrypt(&self, plain: &str) -> Result<String> {
            tokio::task::yield_now().await;
            Ok(format!("hashed:{plain}"))
        }

        async fn parse(&self, plain: &str, hash: &str) -> Result<bool> {
            Ok(hash == format!("hashed:{plain}"))
        }
    }

    #[tokio::test]
    async fn test_concurrent_signups_with_same_email() {
        let store = InMemoryStore::new();
        let use_case = AddAccountUseCase::new(
            Arc::new(store.accounts()),
            Arc::new(YieldingHasher),
            token_port(),
            token_profiles(),
        );

        let (first, second) = tokio::join!(use_case.add(signup()), use_case.add(signup()));
        let created = [first.unwrap(), second.unwrap()];

        assert_eq!(created.iter().filter(|a| a.is_some()).count(), 1);
        assert!(store.accounts().find_by_email("a@x").await.unwrap().is_some());
    }
}
