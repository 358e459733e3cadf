use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::app::ports::{AccountRepository, TaskRepository, Transaction, TransactionManager};
use crate::domain::{Account, AccountChanges, CalendarDate, Task, TaskChanges};
use crate::error::{Result, TaskerError};

#[derive(Debug, Clone, Default)]
struct State {
    accounts: HashMap<String, Account>,
    tasks: HashMap<String, Task>,
}

/// In-memory storage for development and tests. Hands out repositories and a
/// transaction manager that all share one state.
///
/// Transactions snapshot the state when they begin and restore it on rollback. They are
/// not isolated: writes made by others while a transaction is open are undone by its
/// rollback as well.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accounts(&self) -> InMemoryAccountRepository {
        InMemoryAccountRepository {
            state: Arc::clone(&self.state),
        }
    }

    pub fn tasks(&self) -> InMemoryTaskRepository {
        InMemoryTaskRepository {
            state: Arc::clone(&self.state),
        }
    }

    pub fn transactions(&self) -> InMemoryTransactionManager {
        InMemoryTransactionManager {
            state: Arc::clone(&self.state),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryAccountRepository {
    state: Arc<RwLock<State>>,
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Account>> {
        Ok(self.state.read().await.accounts.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let state = self.state.read().await;
        Ok(state.accounts.values().find(|a| a.email == email).cloned())
    }

    async fn create(&self, account: Account) -> Result<Account> {
        let mut state = self.state.write().await;
        if state.accounts.values().any(|a| a.email == account.email) {
            return Err(TaskerError::DuplicateEmail);
        }
        state.accounts.insert(account.id.clone(), account.clone());
        debug!("Created account {}", account.id);
        Ok(account)
    }

    async fn update(&self, changes: AccountChanges, id: &str) -> Result<Option<Account>> {
        let mut state = self.state.write().await;
        if let Some(email) = &changes.email {
            if state.accounts.values().any(|a| &a.email == email && a.id != id) {
                return Err(TaskerError::DuplicateEmail);
            }
        }

        let Some(account) = state.accounts.get_mut(id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            account.name = name;
        }
        if let Some(email) = changes.email {
            account.email = email;
        }
        if let Some(password) = changes.password {
            account.password = password;
        }
        if let Some(access_token) = changes.access_token {
            account.access_token = Some(access_token);
        }
        if let Some(refresh_token) = changes.refresh_token {
            account.refresh_token = Some(refresh_token);
        }
        account.updated_at = Utc::now();
        Ok(Some(account.clone()))
    }

    async fn delete(&self, id: &str, _tx: Option<&dyn Transaction>) -> Result<()> {
        let mut state = self.state.write().await;
        state.accounts.remove(id);
        // Mirrors the ON DELETE CASCADE of the SQL schema
        state.tasks.retain(|_, t| t.account_id != id);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<State>>,
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create(&self, task: Task) -> Result<Task> {
        let mut state = self.state.write().await;
        if !state.accounts.contains_key(&task.account_id) {
            return Err(TaskerError::database("FOREIGN KEY constraint failed"));
        }
        state.tasks.insert(task.id.clone(), task.clone());
        debug!("Created task {} for account {}", task.id, task.account_id);
        Ok(task)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Task>> {
        Ok(self.state.read().await.tasks.get(id).cloned())
    }

    async fn find_by_is_notify(
        &self,
        now: &CalendarDate,
        window_minutes: u32,
    ) -> Result<Vec<Task>> {
        let state = self.state.read().await;
        let mut due: Vec<Task> = state
            .tasks
            .values()
            .filter(|t| t.is_notify)
            .filter(|t| {
                t.notify_date
                    .map(|d| d.matches_sweep_window(now, window_minutes))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        due.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(due)
    }

    async fn update(&self, changes: TaskChanges, id: &str) -> Result<Option<Task>> {
        let mut state = self.state.write().await;
        let Some(task) = state.tasks.get_mut(id) else {
            return Ok(None);
        };
        let mut merged = changes.apply_to(task);
        merged.updated_at = Utc::now();
        *task = merged.clone();
        Ok(Some(merged))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.state.write().await.tasks.remove(id);
        Ok(())
    }

    async fn find_all_by_account(&self, account_id: &str) -> Result<Vec<Task>> {
        let state = self.state.read().await;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|t| t.account_id == account_id)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(tasks)
    }

    async fn delete_all_from_account(
        &self,
        account_id: &str,
        _tx: Option<&dyn Transaction>,
    ) -> Result<()> {
        self.state
            .write()
            .await
            .tasks
            .retain(|_, t| t.account_id != account_id);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryTransactionManager {
    state: Arc<RwLock<State>>,
}

#[async_trait]
impl TransactionManager for InMemoryTransactionManager {
    async fn begin(&self) -> Result<Box<dyn Transaction>> {
        let snapshot = self.state.read().await.clone();
        Ok(Box::new(InMemoryTransaction {
            state: Arc::clone(&self.state),
            snapshot: Mutex::new(Some(snapshot)),
        }))
    }
}

pub struct InMemoryTransaction {
    state: Arc<RwLock<State>>,
    snapshot: Mutex<Option<State>>,
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.snapshot.lock().await.take();
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        if let Some(snapshot) = self.snapshot.lock().await.take() {
            *self.state.write().await = snapshot;
        }
        Ok(())
    }
}
