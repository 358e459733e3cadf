use std::sync::Arc;

use chrono::Local;
use tracing::info;

use crate::app::ports::{AccountRepository, TaskRepository};
use crate::domain::{Task, TaskChanges, TaskStatus};
use crate::error::Result;

/// Lists an account's tasks, first moving every open task whose end date has passed
/// to `delayed`.
pub struct GetTasksFromAccountUseCase {
    accounts: Arc<dyn AccountRepository>,
    tasks: Arc<dyn TaskRepository>,
}

impl GetTasksFromAccountUseCase {
    pub fn new(accounts: Arc<dyn AccountRepository>, tasks: Arc<dyn TaskRepository>) -> Self {
        Self { accounts, tasks }
    }

    /// `None` when the account does not exist.
    pub async fn get(&self, account_id: &str) -> Result<Option<Vec<Task>>> {
        if self.accounts.find_by_id(account_id).await?.is_none() {
            return Ok(None);
        }

        let now = Local::now();
        let mut tasks = self.tasks.find_all_by_account(account_id).await?;
        let mut delayed = 0;

        for task in tasks.iter_mut() {
            let overdue = task
                .end_date
                .and_then(|end| end.to_local())
                .is_some_and(|end| end < now);
            if !overdue || !task.status.is_delayable() {
                continue;
            }

            if let Some(updated) = self
                .tasks
                .update(TaskChanges::status(TaskStatus::Delayed), &task.id)
                .await?
            {
                *task = updated;
                delayed += 1;
            }
        }

        if delayed > 0 {
            crate::observability::metrics::tasks::delayed(delayed);
            info!("Moved {} overdue task(s) of account {} to delayed", delayed, account_id);
        }
        Ok(Some(tasks))
    }
}
