//! MySQL/MariaDB pool backend for lazypool

mod backend;

#[cfg(test)]
mod backend_tests;

pub use backend::{MySqlBackend, MySqlBackendError, classify_sqlx_error};

pub use sqlx::MySqlPool;
