use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::app::notify_task_use_case::NotifyTaskUseCase;
use crate::domain::CalendarDate;

/// Runs the notification sweep every `period` on the current runtime.
///
/// A tick that falls behind is skipped rather than replayed. A failed sweep is logged and
/// the ticker keeps going.
pub fn spawn_notification_sweep(use_case: Arc<NotifyTaskUseCase>, period: Duration) -> JoinHandle<()> {
    spawn_sweep_with_clock(use_case, period, CalendarDate::now)
}

/// Like [`spawn_notification_sweep`], reading the sweep time from `clock` on every tick.
pub fn spawn_sweep_with_clock<C>(
    use_case: Arc<NotifyTaskUseCase>,
    period: Duration,
    clock: C,
) -> JoinHandle<()>
where
    C: Fn() -> CalendarDate + Send + 'static,
{
    info!("Notification sweep scheduled every {:?}", period);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Err(e) = use_case.notify_at(clock()).await {
                error!("Notification sweep failed: {}", e);
            }
        }
    })
}
