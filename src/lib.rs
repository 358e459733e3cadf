//! Multi-user task management service: accounts with rotating JWT credentials, tasks with
//! end and notification dates, and a periodic e-mail notification sweep.

pub mod config;
pub mod constants;
pub mod error;

// Domain records and the application layer (ports, outcomes, use cases)
pub mod app;
pub mod domain;

// Adapters and storage
pub mod infra;
pub mod storage;

// HTTP boundary
pub mod controllers;
pub mod middleware;
pub mod server;

pub mod observability;
pub mod scheduler;
pub mod services;

pub use error::{Result, TaskerError};
