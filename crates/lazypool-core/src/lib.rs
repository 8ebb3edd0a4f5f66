//! lazypool core - the lazy connection-pool factory contract
//!
//! This crate defines the pieces every backend crate builds on:
//!
//! - `Credentials` - validated, immutable description of a database to reach
//! - `PoolTuning` - pool sizing/timeouts plus backend-specific parameters
//! - `PoolBackend` - the boundary to an underlying pooling library
//! - `PoolFactory` / `LazyPoolFactory` - defer all I/O until `materialize()`
//! - `ValidationError` / `FactoryError` - the only two error kinds callers see
//!
//! Constructors are pure. Nothing here opens a socket until `materialize()`
//! is awaited.

mod address;
mod backend;
pub mod config;
mod credentials;
mod error;
mod factory;
pub mod retry;
mod tuning;

pub use address::*;
pub use backend::*;
pub use config::{ConfigError, CredentialsConfig, FactoryConfig};
pub use credentials::*;
pub use error::*;
pub use factory::*;
pub use tuning::*;
