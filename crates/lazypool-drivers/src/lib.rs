//! lazypool drivers - concrete pool backends
//!
//! Each backend lives in its own crate and is enabled by a feature of the
//! same name. `AnyBackend` picks one at runtime from the credentials'
//! dbms name, so configuration-driven callers don't need to know which
//! pooling library ends up serving them.

#[cfg(not(any(feature = "postgres", feature = "mysql")))]
compile_error!("enable at least one backend feature: `postgres` or `mysql`");

#[cfg(feature = "mysql")]
pub use lazypool_driver_mysql as mysql;
#[cfg(feature = "postgres")]
pub use lazypool_driver_postgres as postgres;

mod any;

pub use any::{AnyBackend, AnyBackendError, AnyPool, factory_from_config, lazy_factory};

/// Re-export commonly used types from lazypool-core
pub use lazypool_core::{
    CachedPoolFactory, ConfigError, Credentials, FactoryConfig, FactoryError, FactoryErrorKind,
    LazyPoolFactory, PoolBackend, PoolFactory, PoolTuning, ValidationError,
};
