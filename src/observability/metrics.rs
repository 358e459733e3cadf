//! Metrics for the tasker service.
//!
//! Counters are recorded through the `metrics` facade and rendered in Prometheus text
//! format by the `/metrics` route once [`init`] has installed the recorder.

use std::fmt;
use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// All metric names used by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Accounts
    AccountsCreated,
    AccountsRemoved,

    // Authentication
    LoginsSuccess,
    LoginsFailed,
    TokensRefreshed,
    RecoverEmailsSent,
    PasswordResets,

    // Tasks
    TasksCreated,
    TasksUpdated,
    TasksRemoved,
    TasksDelayed,

    // Notification sweep
    NotificationsSent,
    NotificationsFailed,
    SweepsTotal,

    // HTTP
    HttpRequests,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::AccountsCreated => "tasker_accounts_created_total",
            MetricName::AccountsRemoved => "tasker_accounts_removed_total",

            MetricName::LoginsSuccess => "tasker_logins_success_total",
            MetricName::LoginsFailed => "tasker_logins_failed_total",
            MetricName::TokensRefreshed => "tasker_tokens_refreshed_total",
            MetricName::RecoverEmailsSent => "tasker_recover_emails_sent_total",
            MetricName::PasswordResets => "tasker_password_resets_total",

            MetricName::TasksCreated => "tasker_tasks_created_total",
            MetricName::TasksUpdated => "tasker_tasks_updated_total",
            MetricName::TasksRemoved => "tasker_tasks_removed_total",
            MetricName::TasksDelayed => "tasker_tasks_delayed_total",

            MetricName::NotificationsSent => "tasker_notifications_sent_total",
            MetricName::NotificationsFailed => "tasker_notifications_failed_total",
            MetricName::SweepsTotal => "tasker_sweeps_total",

            MetricName::HttpRequests => "tasker_http_requests_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the Prometheus recorder. Calling it again is a no-op.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;

    let _ = METRICS_HANDLE.set(handle);
    info!("Metrics recorder installed");
    Ok(())
}

/// Current metrics in Prometheus text format, `None` before [`init`].
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

fn increment(name: MetricName) {
    ::metrics::counter!(name.as_str()).increment(1);
}

// ============================================================================
// Account Metrics
// ============================================================================

pub mod accounts {
    use super::{increment, MetricName};

    pub fn created() {
        increment(MetricName::AccountsCreated);
    }

    pub fn removed() {
        increment(MetricName::AccountsRemoved);
    }
}

// ============================================================================
// Auth Metrics
// ============================================================================

pub mod auth {
    use super::{increment, MetricName};

    pub fn login_success() {
        increment(MetricName::LoginsSuccess);
    }

    pub fn login_failed() {
        increment(MetricName::LoginsFailed);
    }

    pub fn token_refreshed() {
        increment(MetricName::TokensRefreshed);
    }

    pub fn recover_email_sent() {
        increment(MetricName::RecoverEmailsSent);
    }

    pub fn password_reset() {
        increment(MetricName::PasswordResets);
    }
}

// ============================================================================
// Task Metrics
// ============================================================================

pub mod tasks {
    use super::{increment, MetricName};

    pub fn created() {
        increment(MetricName::TasksCreated);
    }

    pub fn updated() {
        increment(MetricName::TasksUpdated);
    }

    pub fn removed() {
        increment(MetricName::TasksRemoved);
    }

    /// Record tasks moved to `delayed` while listing
    pub fn delayed(count: usize) {
        ::metrics::counter!(MetricName::TasksDelayed.as_str()).increment(count as u64);
    }
}

// ============================================================================
// Notification Metrics
// ============================================================================

pub mod notifications {
    use super::{increment, MetricName};

    pub fn sent() {
        increment(MetricName::NotificationsSent);
    }

    pub fn failed() {
        increment(MetricName::NotificationsFailed);
    }

    pub fn sweep_completed() {
        increment(MetricName::SweepsTotal);
    }
}

// ============================================================================
// HTTP Metrics
// ============================================================================

pub mod http {
    use super::MetricName;

    pub fn request(method: &str, status: u16) {
        ::metrics::counter!(
            MetricName::HttpRequests.as_str(),
            "method" => method.to_string(),
            "status" => status.to_string()
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_are_prefixed() {
        for name in [
            MetricName::AccountsCreated,
            MetricName::LoginsFailed,
            MetricName::TasksDelayed,
            MetricName::SweepsTotal,
            MetricName::HttpRequests,
        ] {
            assert!(name.as_str().starts_with("tasker_"));
            assert_eq!(name.to_string(), name.as_str());
        }
    }

    #[test]
    fn test_recording_without_recorder_is_harmless() {
        tasks::created();
        tasks::delayed(3);
        http::request("GET", 200);
    }
}
