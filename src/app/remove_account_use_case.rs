use std::sync::Arc;

use tracing::info;

use crate::app::ports::{transaction, AccountRepository, TaskRepository, TransactionManager};
use crate::error::Result;

/// Deletes an account together with all of its tasks, atomically.
pub struct RemoveAccountUseCase {
    accounts: Arc<dyn AccountRepository>,
    tasks: Arc<dyn TaskRepository>,
    transactions: Arc<dyn TransactionManager>,
}

impl RemoveAccountUseCase {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        tasks: Arc<dyn TaskRepository>,
        transactions: Arc<dyn TransactionManager>,
    ) -> Self {
        Self {
            accounts,
            tasks,
            transactions,
        }
    }

    /// Returns `false` when the account does not exist.
    pub async fn remove(&self, account_id: &str) -> Result<bool> {
        let Some(account) = self.accounts.find_by_id(account_id).await? else {
            return Ok(false);
        };

        let accounts = Arc::clone(&self.accounts);
        let tasks = Arc::clone(&self.tasks);
        let id = account.id.clone();
        transaction(self.transactions.as_ref(), move |tx| {
            Box::pin(async move {
                accounts.delete(&id, Some(tx)).await?;
                tasks.delete_all_from_account(&id, Some(tx)).await
            })
        })
        .await?;

        crate::observability::metrics::accounts::removed();
        info!("Account {} removed with its tasks", account.id);
        Ok(true)
    }
}
