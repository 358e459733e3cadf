use std::sync::Arc;

use chrono::{Local, Utc};
use tracing::info;

use crate::app::outcome::{DateRangeViolation, DomainFailure, Outcome};
use crate::app::ports::{AccountRepository, TaskRepository};
use crate::domain::{AddTaskData, CalendarDate, Task, TaskStatus};
use crate::error::Result;

/// Date rules shared by task creation and update.
///
/// `supplied_end` is checked against the current time; the notification rules run
/// against the effective `notify`/`end` pair when `is_notify` is set.
pub(crate) fn check_schedule(
    supplied_end: Option<&CalendarDate>,
    is_notify: bool,
    notify: Option<&CalendarDate>,
    end: Option<&CalendarDate>,
) -> std::result::Result<(), DateRangeViolation> {
    if let Some(end) = supplied_end {
        let end = end.to_local().ok_or(DateRangeViolation::UnrepresentableDate)?;
        if end < Local::now() {
            return Err(DateRangeViolation::EndDateInPast);
        }
    }

    if is_notify {
        let notify = notify
            .ok_or(DateRangeViolation::MissingNotifyDate)?
            .to_local()
            .ok_or(DateRangeViolation::UnrepresentableDate)?;
        if let Some(end) = end {
            let end = end.to_local().ok_or(DateRangeViolation::UnrepresentableDate)?;
            if notify > end {
                return Err(DateRangeViolation::NotifyAfterEnd);
            }
        }
    }

    Ok(())
}

pub struct CreateTaskUseCase {
    accounts: Arc<dyn AccountRepository>,
    tasks: Arc<dyn TaskRepository>,
}

impl CreateTaskUseCase {
    pub fn new(accounts: Arc<dyn AccountRepository>, tasks: Arc<dyn TaskRepository>) -> Self {
        Self { accounts, tasks }
    }

    pub async fn create(&self, data: AddTaskData) -> Result<Outcome<Task>> {
        if self.accounts.find_by_id(&data.account_id).await?.is_none() {
            return Ok(Err(DomainFailure::AccountNotFound));
        }

        if let Err(violation) = check_schedule(
            data.end_date.as_ref(),
            data.is_notify,
            data.notify_date.as_ref(),
            data.end_date.as_ref(),
        ) {
            return Ok(Err(DomainFailure::InvalidDateRange(violation)));
        }

        let now = Utc::now();
        let task = self
            .tasks
            .create(Task {
                id: uuid::Uuid::new_v4().to_string(),
                account_id: data.account_id,
                name: data.name,
                description: data.description,
                notify_date: data.notify_date,
                end_date: data.end_date,
                is_notify: data.is_notify,
                status: TaskStatus::Pending,
                created_at: now,
                updated_at: now,
            })
            .await?;

        crate::observability::metrics::tasks::created();
        info!("Task {} created for account {}", task.id, task.account_id);
        Ok(Ok(task))
    }
}
