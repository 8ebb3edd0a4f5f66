//! PostgreSQL pool backend for lazypool
//!
//! Materializes `sqlx::PgPool` handles from lazypool credentials.

mod backend;

#[cfg(test)]
mod backend_tests;

pub use backend::{PostgresBackend, PostgresBackendError, classify_sqlx_error};

/// Re-exported so callers can name the handle without depending on sqlx
pub use sqlx::PgPool;
