//! Boundary to an underlying pooling implementation

use async_trait::async_trait;

use crate::{FactoryErrorKind, Password, PoolTuning, ValidationError};

/// Everything a backend receives to build one pool.
#[derive(Debug, Clone, Copy)]
pub struct PoolRequest<'a> {
    /// `<scheme>://<host>:<port>/<schema>`
    pub address: &'a str,
    pub username: &'a str,
    pub password: &'a Password,
    pub tuning: &'a PoolTuning,
}

/// An underlying pooling library, seen as a black box.
///
/// Implementations wrap one library (sqlx, deadpool, ...) and expose its
/// native construction routine through `build_pool`. Everything else is
/// structural validation run while a factory is being built, so bad
/// configuration is rejected before any I/O happens.
#[async_trait]
pub trait PoolBackend: Send + Sync {
    /// The live pool handed to callers
    type Handle: Send + 'static;

    /// The library's native error
    type Error: std::error::Error + Send + Sync + 'static;

    /// Short backend name used in logs and errors (e.g. "postgres")
    fn name(&self) -> &'static str;

    /// URL scheme for a dbms name, or `None` if this backend can't serve it.
    fn scheme_for(&self, dbms_name: &str) -> Option<&'static str>;

    /// Backend-specific tuning keys this backend understands
    fn supported_params(&self) -> &'static [&'static str] {
        &[]
    }

    /// Check one backend-specific tuning parameter.
    ///
    /// The default accepts any value for a key listed in
    /// `supported_params()`. Backends override this to also check values.
    fn check_param(&self, key: &str, _value: &str) -> Result<(), ValidationError> {
        if self.supported_params().contains(&key) {
            Ok(())
        } else {
            Err(ValidationError::UnsupportedParam {
                key: key.to_string(),
                backend: self.name(),
            })
        }
    }

    /// Build a pool. This is where all network I/O happens.
    async fn build_pool(&self, request: PoolRequest<'_>) -> Result<Self::Handle, Self::Error>;

    /// Map a native error onto a factory error kind
    fn classify(&self, _error: &Self::Error) -> FactoryErrorKind {
        FactoryErrorKind::Backend
    }
}
