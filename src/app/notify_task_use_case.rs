use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::app::ports::{AccountRepository, MailerPort, SendEmailData, TaskRepository};
use crate::constants::task_notification_subject;
use crate::domain::{CalendarDate, Task, TaskChanges};
use crate::error::{Result, TaskerError};
use crate::observability::metrics;

/// Counts for one notification sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub selected: usize,
    pub notified: usize,
    pub failed: usize,
}

/// One notification sweep: mails the owner of every task whose notify date is due and
/// clears the task's flag. A task whose mail or flag update fails keeps `isNotify` set
/// and is retried on the next sweep; it never stops the remaining tasks.
pub struct NotifyTaskUseCase {
    tasks: Arc<dyn TaskRepository>,
    accounts: Arc<dyn AccountRepository>,
    mailer: Arc<dyn MailerPort>,
    window_minutes: u32,
}

impl NotifyTaskUseCase {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        accounts: Arc<dyn AccountRepository>,
        mailer: Arc<dyn MailerPort>,
        window_minutes: u32,
    ) -> Self {
        Self {
            tasks,
            accounts,
            mailer,
            window_minutes,
        }
    }

    pub async fn notify(&self) -> Result<SweepReport> {
        self.notify_at(CalendarDate::now()).await
    }

    pub async fn notify_at(&self, now: CalendarDate) -> Result<SweepReport> {
        let due = self.tasks.find_by_is_notify(&now, self.window_minutes).await?;
        let mut report = SweepReport {
            selected: due.len(),
            ..Default::default()
        };

        for task in &due {
            match self.notify_one(task).await {
                Ok(()) => {
                    report.notified += 1;
                    metrics::notifications::sent();
                }
                Err(e) => {
                    report.failed += 1;
                    metrics::notifications::failed();
                    warn!("Notification for task {} failed: {}", task.id, e);
                }
            }
        }

        metrics::notifications::sweep_completed();
        if report.selected > 0 {
            info!(
                selected = report.selected,
                notified = report.notified,
                failed = report.failed,
                "Notification sweep finished"
            );
        } else {
            debug!("Notification sweep found nothing due");
        }
        Ok(report)
    }

    async fn notify_one(&self, task: &Task) -> Result<()> {
        let account = self
            .accounts
            .find_by_id(&task.account_id)
            .await?
            .ok_or_else(|| TaskerError::database(format!("owner {} not found", task.account_id)))?;

        self.mailer
            .send(&SendEmailData {
                to: account.email,
                subject: task_notification_subject(&task.name),
                html: None,
            })
            .await?;

        self.tasks
            .update(TaskChanges::is_notify(false), &task.id)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::{seed_account, seed_task, RecordingMailer};
    use crate::constants::NOTIFY_WINDOW_MINUTES;
    use crate::storage::InMemoryStore;

    async fn schedule(store: &InMemoryStore, id: &str, at: CalendarDate) {
        store
            .tasks()
            .update(
                TaskChanges {
                    is_notify: Some(true),
                    notify_date: Some(at),
                    ..Default::default()
                },
                id,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_due_task_is_mailed_once() {
        let store = InMemoryStore::new();
        seed_account(&store, "acc-1", "a@x").await;
        seed_task(&store, "t1", "acc-1").await;
        let now = CalendarDate::new(2030, 9, 9, 14, 30);
        schedule(&store, "t1", now).await;

        let mailer = RecordingMailer::new();
        let sent = mailer.sent.clone();
        let use_case = NotifyTaskUseCase::new(
            Arc::new(store.tasks()),
            Arc::new(store.accounts()),
            Arc::new(mailer),
            NOTIFY_WINDOW_MINUTES,
        );

        let first = use_case.notify_at(now).await.unwrap();
        assert_eq!(
            first,
            SweepReport {
                selected: 1,
                notified: 1,
                failed: 0
            }
        );
        {
            let sent = sent.lock().await;
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0].to, "a@x");
            assert_eq!(sent[0].subject, "It's time to do your task: Walk the dog");
        }

        let second = use_case.notify_at(now).await.unwrap();
        assert_eq!(second.selected, 0);
        assert_eq!(sent.lock().await.len(), 1);
        assert!(!store.tasks().find_by_id("t1").await.unwrap().unwrap().is_notify);
    }

    #[tokio::test]
    async fn test_failure_is_isolated_and_retried() {
        let store = InMemoryStore::new();
        seed_account(&store, "acc-1", "a@x").await;
        seed_account(&store, "acc-2", "b@x").await;
        seed_task(&store, "t1", "acc-1").await;
        seed_task(&store, "t2", "acc-2").await;
        let now = CalendarDate::new(2030, 9, 9, 14, 30);
        schedule(&store, "t1", CalendarDate::new(2030, 9, 9, 14, 28)).await;
        schedule(&store, "t2", CalendarDate::new(2030, 9, 9, 14, 32)).await;

        let mailer = RecordingMailer::failing_for("a@x");
        let sent = mailer.sent.clone();
        let use_case = NotifyTaskUseCase::new(
            Arc::new(store.tasks()),
            Arc::new(store.accounts()),
            Arc::new(mailer),
            NOTIFY_WINDOW_MINUTES,
        );

        let report = use_case.notify_at(now).await.unwrap();
        assert_eq!(report.selected, 2);
        assert_eq!(report.notified, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(sent.lock().await[0].to, "b@x");

        // The failed task is still flagged for the next sweep
        assert!(store.tasks().find_by_id("t1").await.unwrap().unwrap().is_notify);
        assert!(!store.tasks().find_by_id("t2").await.unwrap().unwrap().is_notify);
    }

    #[tokio::test]
    async fn test_outside_window_is_ignored() {
        let store = InMemoryStore::new();
        seed_account(&store, "acc-1", "a@x").await;
        seed_task(&store, "t1", "acc-1").await;
        schedule(&store, "t1", CalendarDate::new(2030, 9, 9, 14, 27)).await;

        let use_case = NotifyTaskUseCase::new(
            Arc::new(store.tasks()),
            Arc::new(store.accounts()),
            Arc::new(RecordingMailer::new()),
            NOTIFY_WINDOW_MINUTES,
        );
        let report = use_case
            .notify_at(CalendarDate::new(2030, 9, 9, 14, 30))
            .await
            .unwrap();
        assert_eq!(report, SweepReport::default());
    }
}
