//! Lazy pool factories
//!
//! A factory is fully configured when built and performs no I/O until
//! `materialize()` is awaited.
//!
//! # Example
//!
//! ```ignore
//! use lazypool_core::{Credentials, LazyPoolFactory, PoolFactory, PoolTuning};
//!
//! let creds = Credentials::new("postgresql", "db.internal", 5432, "orders", "app", password)?;
//! let factory = LazyPoolFactory::new(PostgresBackend::new(), creds, PoolTuning::default())?;
//!
//! // Nothing has connected yet.
//! let pool = factory.materialize().await?;
//! ```

mod cached;
mod lazy;


use async_trait::async_trait;

use crate::FactoryError;

pub use cached::CachedPoolFactory;
pub use lazy::LazyPoolFactory;

/// Single-operation capability: turn configuration into a live pool.
#[async_trait]
pub trait PoolFactory: Send + Sync {
    type Handle: Send + 'static;

    /// Build (or hand out) a pool handle.
    ///
    /// May be called any number of times. Whether each call yields a fresh
    /// handle is documented by the implementation.
    async fn materialize(&self) -> Result<Self::Handle, FactoryError>;
}

#[async_trait]
impl<F: PoolFactory> PoolFactory for std::sync::Arc<F> {
    type Handle = F::Handle;

    async fn materialize(&self) -> Result<Self::Handle, FactoryError> {
        (**self).materialize().await
    }
}
