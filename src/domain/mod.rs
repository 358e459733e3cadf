mod calendar_date;

pub use calendar_date::CalendarDate;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Authenticated user record. `password` always holds the hasher's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// SHA-256 hex digest of the stored password hash. Changes whenever the password does.
    pub fn password_fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.password.as_bytes()))
    }
}

/// Signup payload.
#[derive(Debug, Clone, Deserialize)]
pub struct AddAccountData {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Partial account update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(skip)]
    pub access_token: Option<String>,
    #[serde(skip)]
    pub refresh_token: Option<String>,
}

impl AccountChanges {
    pub fn tokens(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token: Some(access_token),
            refresh_token: Some(refresh_token),
            ..Default::default()
        }
    }
}

/// Public view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Account> for AccountDto {
    fn from(account: &Account) -> Self {
        Self {
            name: account.name.clone(),
            email: account.email.clone(),
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "concluded")]
    Concluded,
    #[serde(rename = "delayed")]
    Delayed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in progress",
            TaskStatus::Concluded => "concluded",
            TaskStatus::Delayed => "delayed",
        }
    }

    /// Transitions a user may request through an update. `delayed` is only ever entered
    /// automatically when a task is listed past its end date.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        match (self, next) {
            (current, next) if *current == next => true,
            (Pending, InProgress) => true,
            (Pending | InProgress | Delayed, Concluded) => true,
            _ => false,
        }
    }

    /// Whether the automatic past-end-date transition applies.
    pub fn is_delayable(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::InProgress)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "in progress" => Ok(TaskStatus::InProgress),
            "concluded" => Ok(TaskStatus::Concluded),
            "delayed" => Ok(TaskStatus::Delayed),
            other => Err(format!("unknown task status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub account_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_date: Option<CalendarDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<CalendarDate>,
    pub is_notify: bool,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Task creation payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTaskData {
    pub account_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notify_date: Option<CalendarDate>,
    #[serde(default)]
    pub end_date: Option<CalendarDate>,
    pub is_notify: bool,
}

/// Partial task update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub notify_date: Option<CalendarDate>,
    pub end_date: Option<CalendarDate>,
    pub is_notify: Option<bool>,
    pub status: Option<TaskStatus>,
}

impl TaskChanges {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_notify(is_notify: bool) -> Self {
        Self {
            is_notify: Some(is_notify),
            ..Default::default()
        }
    }

    pub fn touches_schedule(&self) -> bool {
        self.is_notify.is_some() || self.notify_date.is_some() || self.end_date.is_some()
    }

    /// Applies the changes onto a task snapshot, without touching timestamps.
    pub fn apply_to(&self, task: &Task) -> Task {
        Task {
            name: self.name.clone().unwrap_or_else(|| task.name.clone()),
            description: self.description.clone().or_else(|| task.description.clone()),
            notify_date: self.notify_date.or(task.notify_date),
            end_date: self.end_date.or(task.end_date),
            is_notify: self.is_notify.unwrap_or(task.is_notify),
            status: self.status.unwrap_or(task.status),
            ..task.clone()
        }
    }
}
