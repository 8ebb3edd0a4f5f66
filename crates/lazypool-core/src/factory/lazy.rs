//! Stateless lazy factory over a `PoolBackend`

use std::sync::Arc;

use async_trait::async_trait;

use super::PoolFactory;
use crate::{Credentials, FactoryError, PoolBackend, PoolRequest, PoolTuning, ValidationError};

/// Factory that builds a fresh pool on every `materialize()` call.
///
/// Holds only immutable configuration, so concurrent calls are
/// independent of each other. Handles are never retained; wrap in
/// `CachedPoolFactory` to reuse one.
pub struct LazyPoolFactory<B: PoolBackend> {
    backend: B,
    credentials: Arc<Credentials>,
    tuning: PoolTuning,
    scheme: &'static str,
}

impl<B: PoolBackend> LazyPoolFactory<B> {
    /// Configure a factory. Pure: validates, never connects.
    ///
    /// Fails if the backend does not serve the credentials' dbms, if a
    /// tuning parameter is unsupported or malformed, or if the pool bounds
    /// are inconsistent.
    pub fn new(
        backend: B,
        credentials: impl Into<Arc<Credentials>>,
        tuning: PoolTuning,
    ) -> Result<Self, ValidationError> {
        let credentials = credentials.into();
        let scheme = backend.scheme_for(credentials.dbms_name()).ok_or_else(|| {
            ValidationError::UnsupportedDbms {
                dbms: credentials.dbms_name().to_string(),
                backend: backend.name(),
            }
        })?;

        tuning.validate()?;
        for (key, value) in tuning.params() {
            backend.check_param(key, value)?;
        }

        tracing::debug!(
            backend = backend.name(),
            dbms = credentials.dbms_name(),
            host = credentials.host(),
            "pool factory configured"
        );

        Ok(Self {
            backend,
            credentials,
            tuning,
            scheme,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn tuning(&self) -> &PoolTuning {
        &self.tuning
    }

    /// The address handed to the backend
    pub fn address(&self) -> String {
        self.credentials.address(self.scheme)
    }
}

#[async_trait]
impl<B: PoolBackend> PoolFactory for LazyPoolFactory<B> {
    type Handle = B::Handle;

    #[tracing::instrument(skip(self))]
    async fn materialize(&self) -> Result<B::Handle, FactoryError> {
        let address = self.address();
        tracing::debug!(
            backend = self.backend.name(),
            address = %address,
            username = self.credentials.username(),
            "materializing pool"
        );

        let request = PoolRequest {
            address: &address,
            username: self.credentials.username(),
            password: self.credentials.password(),
            tuning: &self.tuning,
        };

        match self.backend.build_pool(request).await {
            Ok(handle) => {
                tracing::info!(address = %address, "pool materialized");
                Ok(handle)
            }
            Err(err) => {
                let kind = self.backend.classify(&err);
                tracing::warn!(
                    address = %address,
                    kind = %kind,
                    error = %err,
                    "failed to materialize pool"
                );
                Err(FactoryError::wrap(
                    kind,
                    format!(
                        "{} backend could not build a pool for {} as {}",
                        self.backend.name(),
                        address,
                        self.credentials.username()
                    ),
                    &err,
                ))
            }
        }
    }
}

impl<B: PoolBackend> std::fmt::Debug for LazyPoolFactory<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyPoolFactory")
            .field("backend", &self.backend.name())
            .field("credentials", &self.credentials)
            .field("tuning", &self.tuning)
            .finish()
    }
}
