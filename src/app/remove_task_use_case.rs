use std::sync::Arc;

use crate::app::outcome::{DomainFailure, Outcome};
use crate::app::ports::{AccountRepository, TaskRepository};
use crate::error::Result;

pub struct RemoveTaskUseCase {
    tasks: Arc<dyn TaskRepository>,
    accounts: Arc<dyn AccountRepository>,
}

impl RemoveTaskUseCase {
    pub fn new(tasks: Arc<dyn TaskRepository>, accounts: Arc<dyn AccountRepository>) -> Self {
        Self { tasks, accounts }
    }

    /// Deletes a task owned by `account_id` and returns a confirmation message.
    pub async fn remove(&self, task_id: &str, account_id: &str) -> Result<Outcome<String>> {
        let Some(task) = self.tasks.find_by_id(task_id).await? else {
            return Ok(Err(DomainFailure::TaskNotFound));
        };

        let owner = self.accounts.find_by_id(account_id).await?;
        if owner.map(|a| a.id).as_deref() != Some(task.account_id.as_str()) {
            return Ok(Err(DomainFailure::InvalidAccount));
        }

        self.tasks.delete(&task.id).await?;
        crate::observability::metrics::tasks::removed();
        Ok(Ok("task successfully removed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::{seed_account, seed_task};
    use crate::storage::InMemoryStore;

    #[tokio::test]
    async fn test_owner_removes_task() {
        let store = InMemoryStore::new();
        seed_account(&store, "acc-1", "a@x").await;
        seed_task(&store, "t1", "acc-1").await;
        let use_case = RemoveTaskUseCase::new(Arc::new(store.tasks()), Arc::new(store.accounts()));

        assert_eq!(
            use_case.remove("t1", "acc-1").await.unwrap(),
            Ok("task successfully removed".to_string())
        );
        assert!(store.tasks().find_by_id("t1").await.unwrap().is_none());
        assert_eq!(
            use_case.remove("t1", "acc-1").await.unwrap(),
            Err(DomainFailure::TaskNotFound)
        );
    }

    #[tokio::test]
    async fn test_other_account_cannot_remove() {
        let store = InMemoryStore::new();
        seed_account(&store, "acc-1", "a@x").await;
        seed_account(&store, "acc-2", "b@x").await;
        seed_task(&store, "t1", "acc-1").await;
        let use_case = RemoveTaskUseCase::new(Arc::new(store.tasks()), Arc::new(store.accounts()));

        assert_eq!(
            use_case.remove("t1", "acc-2").await.unwrap(),
            Err(DomainFailure::InvalidAccount)
        );
        assert_eq!(
            use_case.remove("t1", "ghost").await.unwrap(),
            Err(DomainFailure::InvalidAccount)
        );
        assert!(store.tasks().find_by_id("t1").await.unwrap().is_some());
    }
}
