use std::any::Any;
use std::path::Path;

use async_trait::async_trait;
use libsql::{Builder, Connection, Database};
use tracing::{debug, info, warn};

use crate::app::ports::{Transaction, TransactionManager};
use crate::config::DatabaseConfig;
use crate::error::{Result, TaskerError};

/// Owns the libsql database and hands out configured connections.
pub struct DatabaseManager {
    db: Database,
}

impl DatabaseManager {
    /// Opens a local database file (creating its directory) or connects to a remote one.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let db = match config {
            DatabaseConfig::Local { path } => {
                if let Some(parent) = Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                info!("Opening local database at {}", path);
                Builder::new_local(path).build().await
            }
            DatabaseConfig::Remote { url, auth_token } => {
                info!("Connecting to remote database at {}", url);
                Builder::new_remote(url.clone(), auth_token.clone())
                    .build()
                    .await
            }
        }
        .map_err(|e| TaskerError::database(format!("Failed to open database: {e}")))?;

        Ok(Self { db })
    }

    /// New connection with foreign keys enforced.
    pub async fn get_connection(&self) -> Result<Connection> {
        let conn = self
            .db
            .connect()
            .map_err(|e| TaskerError::database(format!("Failed to get database connection: {e}")))?;

        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| TaskerError::database(format!("Failed to configure connection: {e}")))?;

        // busy_timeout answers with the new value as a row
        let mut rows = conn
            .query("PRAGMA busy_timeout = 5000", ())
            .await
            .map_err(|e| TaskerError::database(format!("Failed to set busy timeout: {e}")))?;
        while rows
            .next()
            .await
            .map_err(|e| TaskerError::database(format!("Failed to set busy timeout: {e}")))?
            .is_some()
        {}

        Ok(conn)
    }

    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");

        let conn = self.get_connection().await?;
        let migration_sql = include_str!("../../migrations/001_create_accounts_and_tasks.sql");

        conn.execute_batch(migration_sql)
            .await
            .map_err(|e| TaskerError::database(format!("Failed to run migrations: {e}")))?;

        info!("Database migrations completed successfully");
        Ok(())
    }
}

/// Starts transactions on dedicated connections.
pub struct LibsqlTransactionManager {
    manager: std::sync::Arc<DatabaseManager>,
}

impl LibsqlTransactionManager {
    pub fn new(manager: std::sync::Arc<DatabaseManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl TransactionManager for LibsqlTransactionManager {
    async fn begin(&self) -> Result<Box<dyn Transaction>> {
        let conn = self.manager.get_connection().await?;
        conn.execute("BEGIN IMMEDIATE", ())
            .await
            .map_err(|e| TaskerError::database(format!("Failed to begin transaction: {e}")))?;
        debug!("Transaction started");
        Ok(Box::new(LibsqlTransaction { conn }))
    }
}

/// Open transaction. Every statement run on [`LibsqlTransaction::connection`] belongs to it.
pub struct LibsqlTransaction {
    conn: Connection,
}

impl LibsqlTransaction {
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Resolves a port-level handle to a libsql transaction.
    pub fn from_handle(tx: &dyn Transaction) -> Result<&LibsqlTransaction> {
        tx.as_any()
            .downcast_ref::<LibsqlTransaction>()
            .ok_or_else(|| TaskerError::database("Transaction handle does not belong to libsql"))
    }
}

#[async_trait]
impl Transaction for LibsqlTransaction {
    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.conn
            .execute("COMMIT", ())
            .await
            .map_err(|e| TaskerError::database(format!("Failed to commit transaction: {e}")))?;
        debug!("Transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.conn
            .execute("ROLLBACK", ())
            .await
            .map_err(|e| TaskerError::database(format!("Failed to roll back transaction: {e}")))?;
        warn!("Transaction rolled back");
        Ok(())
    }
}
