use std::any::Any;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{Account, AccountChanges, CalendarDate, Task, TaskChanges};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Repositories
// ---------------------------------------------------------------------------

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Account>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;
    async fn create(&self, account: Account) -> Result<Account>;
    /// Applies the changes and returns the stored record, `None` if no such account.
    async fn update(&self, changes: AccountChanges, id: &str) -> Result<Option<Account>>;
    async fn delete(&self, id: &str, tx: Option<&dyn Transaction>) -> Result<()>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, task: Task) -> Result<Task>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Task>>;
    /// Tasks flagged for notification whose notify date falls within `window_minutes`
    /// of `now` (see [`CalendarDate::matches_sweep_window`]).
    async fn find_by_is_notify(
        &self,
        now: &CalendarDate,
        window_minutes: u32,
    ) -> Result<Vec<Task>>;
    async fn update(&self, changes: TaskChanges, id: &str) -> Result<Option<Task>>;
    async fn delete(&self, id: &str) -> Result<()>;
    async fn find_all_by_account(&self, account_id: &str) -> Result<Vec<Task>>;
    async fn delete_all_from_account(
        &self,
        account_id: &str,
        tx: Option<&dyn Transaction>,
    ) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// Handle to an open transaction. Repositories recognise their own adapter's handle
/// through [`Transaction::as_any`].
#[async_trait]
pub trait Transaction: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    async fn commit(self: Box<Self>) -> Result<()>;
    async fn rollback(self: Box<Self>) -> Result<()>;
}

#[async_trait]
pub trait TransactionManager: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn Transaction>>;
}

/// Runs `work` inside a transaction: commits on `Ok`, rolls back on `Err` and returns the
/// original error. `work` must hand the handle to every mutation that should be atomic.
pub async fn transaction<T, F>(manager: &dyn TransactionManager, work: F) -> Result<T>
where
    F: for<'t> FnOnce(&'t dyn Transaction) -> BoxFuture<'t, Result<T>> + Send,
    T: Send,
{
    let tx = manager.begin().await?;
    let outcome = work(tx.as_ref()).await;
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_error) = tx.rollback().await {
                warn!("Rollback failed after error '{}': {}", e, rollback_error);
            }
            Err(e)
        }
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    Access,
    Refresh,
    Recover,
}

/// Secret and lifetime a token is signed with. A token only parses under the profile it
/// was generated with.
#[derive(Clone)]
pub struct TokenProfile {
    pub purpose: TokenPurpose,
    pub secret_key: String,
    pub expires_in_secs: i64,
}

impl std::fmt::Debug for TokenProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProfile")
            .field("purpose", &self.purpose)
            .field("expires_in_secs", &self.expires_in_secs)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct TokenProfiles {
    pub access: TokenProfile,
    pub refresh: TokenProfile,
    pub recover: TokenProfile,
}

impl TokenProfiles {
    pub fn from_secrets(secrets: &crate::config::TokenSecrets) -> Self {
        use crate::constants::*;
        Self {
            access: TokenProfile {
                purpose: TokenPurpose::Access,
                secret_key: secrets.access.clone(),
                expires_in_secs: ACCESS_TOKEN_TTL_SECS,
            },
            refresh: TokenProfile {
                purpose: TokenPurpose::Refresh,
                secret_key: secrets.refresh.clone(),
                expires_in_secs: REFRESH_TOKEN_TTL_SECS,
            },
            recover: TokenProfile {
                purpose: TokenPurpose::Recover,
                secret_key: secrets.recover.clone(),
                expires_in_secs: RECOVER_TOKEN_TTL_SECS,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub id: String,
    /// Digest of the password hash at issue time; carried by recover tokens only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl TokenPayload {
    pub fn for_account(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fingerprint: None,
        }
    }
}

/// A verified token: its payload plus `iat` and `exp` in seconds since the epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedToken {
    pub payload: TokenPayload,
    pub created_in: i64,
    pub expires_in: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenParseError {
    pub name: String,
    pub message: String,
}

#[async_trait]
pub trait TokenPort: Send + Sync {
    async fn generate(&self, payload: &TokenPayload, profile: &TokenProfile) -> Result<String>;
    /// Fails on malformed, expired, wrongly signed or wrong-purpose tokens.
    async fn parse(
        &self,
        token: &str,
        profile: &TokenProfile,
    ) -> std::result::Result<ParsedToken, TokenParseError>;
}

// ---------------------------------------------------------------------------
// Hashing, mail, validation
// ---------------------------------------------------------------------------

#[async_trait]
pub trait HasherPort: Send + Sync {
    async fn encrypt(&self, plain: &str) -> Result<String>;
    async fn parse(&self, plain: &str, hash: &str) -> Result<bool>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendEmailData {
    pub to: String,
    pub subject: String,
    pub html: Option<String>,
}

#[async_trait]
pub trait MailerPort: Send + Sync {
    async fn send(&self, mail: &SendEmailData) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamError {
    pub param_name: String,
    pub message: String,
}

impl ParamError {
    pub fn new(param_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            param_name: param_name.into(),
            message: message.into(),
        }
    }
}

pub trait Validator: Send + Sync {
    fn validate(&self, input: &serde_json::Value) -> std::result::Result<(), Vec<ParamError>>;
}
