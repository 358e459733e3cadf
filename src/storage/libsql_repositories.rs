use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Connection, Row};

use crate::app::ports::{AccountRepository, TaskRepository, Transaction};
use crate::domain::{Account, AccountChanges, CalendarDate, Task, TaskChanges, TaskStatus};
use crate::error::{Result, TaskerError};
use crate::storage::database::{DatabaseManager, LibsqlTransaction};

const ACCOUNT_COLUMNS: &str =
    "id, name, email, password, accessToken, refreshToken, createdAt, updatedAt";
const TASK_COLUMNS: &str =
    "id, accountId, name, description, notifyDate, endDate, isNotify, status, createdAt, updatedAt";

/// Connection for a statement: the transaction's own connection when one is given.
async fn connection_for(
    manager: &DatabaseManager,
    tx: Option<&dyn Transaction>,
) -> Result<Connection> {
    match tx {
        Some(tx) => Ok(LibsqlTransaction::from_handle(tx)?.connection().clone()),
        None => manager.get_connection().await,
    }
}

fn text(row: &Row, idx: i32, name: &str) -> Result<String> {
    row.get::<String>(idx)
        .map_err(|e| TaskerError::database(format!("Failed to read column {name}: {e}")))
}

fn optional_text(row: &Row, idx: i32, name: &str) -> Result<Option<String>> {
    row.get::<Option<String>>(idx)
        .map_err(|e| TaskerError::database(format!("Failed to read column {name}: {e}")))
}

fn integer(row: &Row, idx: i32, name: &str) -> Result<i64> {
    row.get::<i64>(idx)
        .map_err(|e| TaskerError::database(format!("Failed to read column {name}: {e}")))
}

fn account_write_error(action: &str, e: libsql::Error) -> TaskerError {
    let message = e.to_string();
    if message.contains("UNIQUE constraint failed: accounts.email") {
        TaskerError::DuplicateEmail
    } else {
        TaskerError::database(format!("Failed to {action} account: {message}"))
    }
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
fn format_timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| TaskerError::database(format!("Invalid timestamp '{raw}': {e}")))
}

fn encode_date(date: &Option<CalendarDate>) -> Result<Option<String>> {
    date.as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(TaskerError::from)
}

fn decode_date(raw: Option<String>) -> Result<Option<CalendarDate>> {
    raw.map(|s| serde_json::from_str(&s))
        .transpose()
        .map_err(TaskerError::from)
}

fn account_from_row(row: &Row) -> Result<Account> {
    Ok(Account {
        id: text(row, 0, "id")?,
        name: text(row, 1, "name")?,
        email: text(row, 2, "email")?,
        password: text(row, 3, "password")?,
        access_token: optional_text(row, 4, "accessToken")?,
        refresh_token: optional_text(row, 5, "refreshToken")?,
        created_at: parse_timestamp(&text(row, 6, "createdAt")?)?,
        updated_at: parse_timestamp(&text(row, 7, "updatedAt")?)?,
    })
}

fn task_from_row(row: &Row) -> Result<Task> {
    let status = text(row, 7, "status")?;
    Ok(Task {
        id: text(row, 0, "id")?,
        account_id: text(row, 1, "accountId")?,
        name: text(row, 2, "name")?,
        description: optional_text(row, 3, "description")?,
        notify_date: decode_date(optional_text(row, 4, "notifyDate")?)?,
        end_date: decode_date(optional_text(row, 5, "endDate")?)?,
        is_notify: integer(row, 6, "isNotify")? != 0,
        status: status.parse::<TaskStatus>().map_err(TaskerError::database)?,
        created_at: parse_timestamp(&text(row, 8, "createdAt")?)?,
        updated_at: parse_timestamp(&text(row, 9, "updatedAt")?)?,
    })
}

async fn query_accounts(
    conn: &Connection,
    sql: &str,
    params: impl libsql::params::IntoParams,
) -> Result<Vec<Account>> {
    let mut rows = conn
        .query(sql, params)
        .await
        .map_err(|e| TaskerError::database(format!("Failed to query accounts: {e}")))?;

    let mut accounts = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| TaskerError::database(format!("Failed to fetch account row: {e}")))?
    {
        accounts.push(account_from_row(&row)?);
    }
    Ok(accounts)
}

async fn query_tasks(
    conn: &Connection,
    sql: &str,
    params: impl libsql::params::IntoParams,
) -> Result<Vec<Task>> {
    let mut rows = conn
        .query(sql, params)
        .await
        .map_err(|e| TaskerError::database(format!("Failed to query tasks: {e}")))?;

    let mut tasks = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| TaskerError::database(format!("Failed to fetch task row: {e}")))?
    {
        tasks.push(task_from_row(&row)?);
    }
    Ok(tasks)
}

pub struct LibsqlAccountRepository {
    manager: Arc<DatabaseManager>,
}

impl LibsqlAccountRepository {
    pub fn new(manager: Arc<DatabaseManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl AccountRepository for LibsqlAccountRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Account>> {
        let conn = self.manager.get_connection().await?;
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1");
        Ok(query_accounts(&conn, &sql, libsql::params![id])
            .await?
            .into_iter()
            .next())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let conn = self.manager.get_connection().await?;
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?1");
        Ok(query_accounts(&conn, &sql, libsql::params![email])
            .await?
            .into_iter()
            .next())
    }

    async fn create(&self, account: Account) -> Result<Account> {
        let conn = self.manager.get_connection().await?;
        conn.execute(
            "INSERT INTO accounts (id, name, email, password, accessToken, refreshToken, createdAt, updatedAt) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            libsql::params![
                account.id.as_str(),
                account.name.as_str(),
                account.email.as_str(),
                account.password.as_str(),
                account.access_token.clone(),
                account.refresh_token.clone(),
                format_timestamp(&account.created_at),
                format_timestamp(&account.updated_at)
            ],
        )
        .await
        .map_err(|e| account_write_error("insert", e))?;

        Ok(account)
    }

    async fn update(&self, changes: AccountChanges, id: &str) -> Result<Option<Account>> {
        let conn = self.manager.get_connection().await?;
        let affected = conn
            .execute(
                "UPDATE accounts SET \
                   name = COALESCE(?1, name), \
                   email = COALESCE(?2, email), \
                   password = COALESCE(?3, password), \
                   accessToken = COALESCE(?4, accessToken), \
                   refreshToken = COALESCE(?5, refreshToken), \
                   updatedAt = ?6 \
                 WHERE id = ?7",
                libsql::params![
                    changes.name,
                    changes.email,
                    changes.password,
                    changes.access_token,
                    changes.refresh_token,
                    format_timestamp(&Utc::now()),
                    id
                ],
            )
            .await
            .map_err(|e| account_write_error("update", e))?;

        if affected == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn delete(&self, id: &str, tx: Option<&dyn Transaction>) -> Result<()> {
        let conn = connection_for(&self.manager, tx).await?;
        conn.execute("DELETE FROM accounts WHERE id = ?1", libsql::params![id])
            .await
            .map_err(|e| TaskerError::database(format!("Failed to delete account: {e}")))?;
        Ok(())
    }
}

pub struct LibsqlTaskRepository {
    manager: Arc<DatabaseManager>,
}

impl LibsqlTaskRepository {
    pub fn new(manager: Arc<DatabaseManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl TaskRepository for LibsqlTaskRepository {
    async fn create(&self, task: Task) -> Result<Task> {
        let conn = self.manager.get_connection().await?;
        conn.execute(
            "INSERT INTO tasks (id, accountId, name, description, notifyDate, endDate, isNotify, status, createdAt, updatedAt) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            libsql::params![
                task.id.as_str(),
                task.account_id.as_str(),
                task.name.as_str(),
                task.description.clone(),
                encode_date(&task.notify_date)?,
                encode_date(&task.end_date)?,
                i64::from(task.is_notify),
                task.status.as_str(),
                format_timestamp(&task.created_at),
                format_timestamp(&task.updated_at)
            ],
        )
        .await
        .map_err(|e| TaskerError::database(format!("Failed to insert task: {e}")))?;

        Ok(task)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Task>> {
        let conn = self.manager.get_connection().await?;
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1");
        Ok(query_tasks(&conn, &sql, libsql::params![id])
            .await?
            .into_iter()
            .next())
    }

    async fn find_by_is_notify(
        &self,
        now: &CalendarDate,
        window_minutes: u32,
    ) -> Result<Vec<Task>> {
        let conn = self.manager.get_connection().await?;
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE isNotify = 1 AND notifyDate IS NOT NULL \
               AND json_extract(notifyDate, '$.year') = ?1 \
               AND json_extract(notifyDate, '$.month') = ?2 \
               AND json_extract(notifyDate, '$.day') = ?3 \
               AND json_extract(notifyDate, '$.hour') = ?4 \
               AND json_extract(notifyDate, '$.minute') BETWEEN ?5 AND ?6 \
             ORDER BY createdAt"
        );
        let minute = i64::from(now.minute);
        let window = i64::from(window_minutes);
        query_tasks(
            &conn,
            &sql,
            libsql::params![
                i64::from(now.year),
                i64::from(now.month),
                i64::from(now.day),
                i64::from(now.hour),
                minute - window,
                minute + window
            ],
        )
        .await
    }

    async fn update(&self, changes: TaskChanges, id: &str) -> Result<Option<Task>> {
        let conn = self.manager.get_connection().await?;
        let affected = conn
            .execute(
                "UPDATE tasks SET \
                   name = COALESCE(?1, name), \
                   description = COALESCE(?2, description), \
                   notifyDate = COALESCE(?3, notifyDate), \
                   endDate = COALESCE(?4, endDate), \
                   isNotify = COALESCE(?5, isNotify), \
                   status = COALESCE(?6, status), \
                   updatedAt = ?7 \
                 WHERE id = ?8",
                libsql::params![
                    changes.name,
                    changes.description,
                    encode_date(&changes.notify_date)?,
                    encode_date(&changes.end_date)?,
                    changes.is_notify.map(i64::from),
                    changes.status.map(|s| s.as_str().to_string()),
                    format_timestamp(&Utc::now()),
                    id
                ],
            )
            .await
            .map_err(|e| TaskerError::database(format!("Failed to update task: {e}")))?;

        if affected == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let conn = self.manager.get_connection().await?;
        conn.execute("DELETE FROM tasks WHERE id = ?1", libsql::params![id])
            .await
            .map_err(|e| TaskerError::database(format!("Failed to delete task: {e}")))?;
        Ok(())
    }

    async fn find_all_by_account(&self, account_id: &str) -> Result<Vec<Task>> {
        let conn = self.manager.get_connection().await?;
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE accountId = ?1 ORDER BY createdAt");
        query_tasks(&conn, &sql, libsql::params![account_id]).await
    }

    async fn delete_all_from_account(
        &self,
        account_id: &str,
        tx: Option<&dyn Transaction>,
    ) -> Result<()> {
        let conn = connection_for(&self.manager, tx).await?;
        conn.execute(
            "DELETE FROM tasks WHERE accountId = ?1",
            libsql::params![account_id],
        )
        .await
        .map_err(|e| TaskerError::database(format!("Failed to delete account tasks: {e}")))?;
        Ok(())
    }
}
