use std::sync::Arc;

use crate::app::ports::AccountRepository;
use crate::domain::AccountDto;
use crate::error::Result;

/// Public view of an account; `None` when it does not exist.
pub struct GetAccountUseCase {
    accounts: Arc<dyn AccountRepository>,
}

impl GetAccountUseCase {
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self { accounts }
    }

    pub async fn get(&self, account_id: &str) -> Result<Option<AccountDto>> {
        let account = self.accounts.find_by_id(account_id).await?;
        Ok(account.as_ref().map(AccountDto::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::seed_account;
    use crate::storage::InMemoryStore;

    #[tokio::test]
    async fn test_returns_public_fields_only() {
        let store = InMemoryStore::new();
        let account = seed_account(&store, "acc-1", "a@x").await;
        let use_case = GetAccountUseCase::new(Arc::new(store.accounts()));

        let dto = use_case.get("acc-1").await.unwrap().unwrap();
        assert_eq!(dto.name, account.name);
        assert_eq!(dto.email, "a@x");

        let json = serde_json::to_value(&dto).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("createdAt").is_some());

        assert!(use_case.get("ghost").await.unwrap().is_none());
    }
}
