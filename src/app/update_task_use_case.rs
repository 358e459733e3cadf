use std::sync::Arc;

use crate::app::create_task_use_case::check_schedule;
use crate::app::outcome::{DomainFailure, Outcome};
use crate::app::ports::TaskRepository;
use crate::domain::{Task, TaskChanges};
use crate::error::Result;

/// Partial task update by the task's owner.
///
/// Missing fields keep their stored values. Date rules run against the merged task
/// whenever the schedule is touched, and status changes must follow the task life cycle.
pub struct UpdateTaskUseCase {
    tasks: Arc<dyn TaskRepository>,
}

impl UpdateTaskUseCase {
    pub fn new(tasks: Arc<dyn TaskRepository>) -> Self {
        Self { tasks }
    }

    pub async fn update(
        &self,
        changes: TaskChanges,
        task_id: &str,
        account_id: &str,
    ) -> Result<Outcome<Task>> {
        let Some(task) = self.tasks.find_by_id(task_id).await? else {
            return Ok(Err(DomainFailure::TaskNotFound));
        };
        if task.account_id != account_id {
            return Ok(Err(DomainFailure::InvalidAccount));
        }

        if let Some(next) = changes.status {
            if !task.status.can_transition_to(next) {
                return Ok(Err(DomainFailure::InvalidStatusTransition {
                    from: task.status.to_string(),
                    to: next.to_string(),
                }));
            }
        }

        if changes.touches_schedule() {
            let merged = changes.apply_to(&task);
            if let Err(violation) = check_schedule(
                changes.end_date.as_ref(),
                merged.is_notify,
                merged.notify_date.as_ref(),
                merged.end_date.as_ref(),
            ) {
                return Ok(Err(DomainFailure::InvalidDateRange(violation)));
            }
        }

        match self.tasks.update(changes, task_id).await? {
            Some(updated) => {
                crate::observability::metrics::tasks::updated();
                Ok(Ok(updated))
            }
            None => Ok(Err(DomainFailure::TaskNotFound)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::outcome::DateRangeViolation;
    use crate::app::test_support::{days_from_now, seed_account, seed_task};
    use crate::domain::{CalendarDate, TaskStatus};
    use crate::storage::InMemoryStore;

    async fn setup() -> (InMemoryStore, UpdateTaskUseCase) {
        let store = InMemoryStore::new();
        seed_account(&store, "acc-1", "a@x").await;
        seed_account(&store, "acc-2", "b@x").await;
        seed_task(&store, "t1", "acc-1").await;
        let use_case = UpdateTaskUseCase::new(Arc::new(store.tasks()));
        (store, use_case)
    }

    #[tokio::test]
    async fn test_merges_supplied_fields() {
        let (_store, use_case) = setup().await;
        let changes = TaskChanges {
            description: Some("around the block".into()),
            status: Some(TaskStatus::InProgress),
            ..Default::default()
        };

        let task = use_case.update(changes, "t1", "acc-1").await.unwrap().unwrap();
        assert_eq!(task.name, "Walk the dog");
        assert_eq!(task.description.as_deref(), Some("around the block"));
        assert_eq!(task.status, TaskStatus::InProgress);
    }

    #[tokio::test]
    async fn test_false_clears_notify_flag() {
        let (store, use_case) = setup().await;
        store
            .tasks()
            .update(
                TaskChanges {
                    is_notify: Some(true),
                    notify_date: Some(days_from_now(1)),
                    ..Default::default()
                },
                "t1",
            )
            .await
            .unwrap();

        let task = use_case
            .update(TaskChanges::is_notify(false), "t1", "acc-1")
            .await
            .unwrap()
            .unwrap();
        assert!(!task.is_notify);
    }

    #[tokio::test]
    async fn test_not_found_and_foreign_task() {
        let (_store, use_case) = setup().await;
        assert_eq!(
            use_case
                .update(TaskChanges::status(TaskStatus::Concluded), "ghost", "acc-1")
                .await
                .unwrap(),
            Err(DomainFailure::TaskNotFound)
        );
        assert_eq!(
            use_case
                .update(TaskChanges::status(TaskStatus::Concluded), "t1", "acc-2")
                .await
                .unwrap(),
            Err(DomainFailure::InvalidAccount)
        );
    }

    #[tokio::test]
    async fn test_status_life_cycle_is_enforced() {
        let (_store, use_case) = setup().await;
        assert!(matches!(
            use_case
                .update(TaskChanges::status(TaskStatus::Delayed), "t1", "acc-1")
                .await
                .unwrap(),
            Err(DomainFailure::InvalidStatusTransition { .. })
        ));

        use_case
            .update(TaskChanges::status(TaskStatus::Concluded), "t1", "acc-1")
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            use_case
                .update(TaskChanges::status(TaskStatus::Pending), "t1", "acc-1")
                .await
                .unwrap(),
            Err(DomainFailure::InvalidStatusTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_date_rules_use_merged_task() {
        let (store, use_case) = setup().await;
        store
            .tasks()
            .update(
                TaskChanges {
                    end_date: Some(days_from_now(2)),
                    ..Default::default()
                },
                "t1",
            )
            .await
            .unwrap();

        // Stored end date bounds the new notify date
        let late_notify = TaskChanges {
            is_notify: Some(true),
            notify_date: Some(days_from_now(5)),
            ..Default::default()
        };
        assert_eq!(
            use_case.update(late_notify, "t1", "acc-1").await.unwrap(),
            Err(DomainFailure::InvalidDateRange(DateRangeViolation::NotifyAfterEnd))
        );

        let notify_without_date = TaskChanges::is_notify(true);
        assert_eq!(
            use_case.update(notify_without_date, "t1", "acc-1").await.unwrap(),
            Err(DomainFailure::InvalidDateRange(DateRangeViolation::MissingNotifyDate))
        );

        let past_end = TaskChanges {
            end_date: Some(CalendarDate::new(2000, 1, 1, 0, 0)),
            ..Default::default()
        };
        assert_eq!(
            use_case.update(past_end, "t1", "acc-1").await.unwrap(),
            Err(DomainFailure::InvalidDateRange(DateRangeViolation::EndDateInPast))
        );
    }
}
