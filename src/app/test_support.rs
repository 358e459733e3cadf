//! Collaborators shared by the use case tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::app::ports::{
    HasherPort, MailerPort, SendEmailData, TokenPayload, TokenPort, TokenProfile, TokenProfiles,
    TokenPurpose,
};
use crate::domain::{Account, CalendarDate, Task, TaskStatus};
use crate::error::{Result, TaskerError};
use crate::infra::jwt_token_adapter::JwtTokenAdapter;
use crate::storage::InMemoryStore;

/// Reversible stand-in for bcrypt.
pub struct FakeHasher;

#[async_trait]
impl HasherPort for FakeHasher {
    async fn encrypt(&self, plain: &str) -> Result<String> {
        Ok(format!("hashed:{plain}"))
    }

    async fn parse(&self, plain: &str, hash: &str) -> Result<bool> {
        Ok(hash == format!("hashed:{plain}"))
    }
}

pub struct RecordingMailer {
    pub sent: Arc<tokio::sync::Mutex<Vec<SendEmailData>>>,
    /// Recipient whose deliveries fail.
    pub failing_recipient: Option<String>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(tokio::sync::Mutex::new(Vec::new())),
            failing_recipient: None,
        }
    }

    pub fn failing_for(recipient: &str) -> Self {
        Self {
            failing_recipient: Some(recipient.to_string()),
            ..Self::new()
        }
    }
}

#[async_trait]
impl MailerPort for RecordingMailer {
    async fn send(&self, mail: &SendEmailData) -> Result<()> {
        if self.failing_recipient.as_deref() == Some(mail.to.as_str()) {
            return Err(TaskerError::Mail {
                message: "connection refused".to_string(),
            });
        }
        self.sent.lock().await.push(mail.clone());
        Ok(())
    }
}

pub fn token_profiles() -> TokenProfiles {
    let profile = |purpose, secret: &str, ttl| TokenProfile {
        purpose,
        secret_key: secret.to_string(),
        expires_in_secs: ttl,
    };
    TokenProfiles {
        access: profile(TokenPurpose::Access, "access-secret", 1200),
        refresh: profile(TokenPurpose::Refresh, "refresh-secret", 604_800),
        recover: profile(TokenPurpose::Recover, "recover-secret", 1800),
    }
}

pub fn token_port() -> Arc<dyn TokenPort> {
    Arc::new(JwtTokenAdapter::new())
}

pub async fn issue(payload: TokenPayload, profile: &TokenProfile) -> String {
    JwtTokenAdapter::new().generate(&payload, profile).await.unwrap()
}

/// Stores an account whose password is `hunter22` under [`FakeHasher`].
pub async fn seed_account(store: &InMemoryStore, id: &str, email: &str) -> Account {
    use crate::app::ports::AccountRepository;
    store
        .accounts()
        .create(Account {
            id: id.to_string(),
            name: "Ada".to_string(),
            email: email.to_string(),
            password: "hashed:hunter22".to_string(),
            access_token: None,
            refresh_token: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
        .await
        .unwrap()
}

pub async fn seed_task(store: &InMemoryStore, id: &str, account_id: &str) -> Task {
    use crate::app::ports::TaskRepository;
    store
        .tasks()
        .create(Task {
            id: id.to_string(),
            account_id: account_id.to_string(),
            name: "Walk the dog".to_string(),
            description: None,
            notify_date: None,
            end_date: None,
            is_notify: false,
            status: TaskStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
        .await
        .unwrap()
}

/// Local wall-clock date `days` from now.
pub fn days_from_now(days: i64) -> CalendarDate {
    CalendarDate::from_local(&(chrono::Local::now() + chrono::Duration::days(days)))
}
