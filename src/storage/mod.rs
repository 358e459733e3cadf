//! Repository and transaction implementations: an in-memory store for development and
//! tests, and libsql-backed storage behind the `db` feature.

pub mod in_memory;

#[cfg(feature = "db")]
pub mod database;
#[cfg(feature = "db")]
pub mod libsql_repositories;

pub use in_memory::InMemoryStore;

#[cfg(feature = "db")]
pub use database::{DatabaseManager, LibsqlTransactionManager};
#[cfg(feature = "db")]
pub use libsql_repositories::{LibsqlAccountRepository, LibsqlTaskRepository};
