//! Factory wrapper that keeps the first successful handle

use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::PoolFactory;
use crate::FactoryError;

/// Caches the first handle produced by the wrapped factory.
///
/// Later calls return clones of that handle, which for reference-counted
/// pools (`sqlx::Pool`, `Arc<..>`) means the same pool. Concurrent first
/// calls are serialized: only one reaches the inner factory and the rest
/// wait for its result. A failed attempt is not cached, so the next call
/// tries again.
pub struct CachedPoolFactory<F>
where
    F: PoolFactory,
    F::Handle: Clone + Sync,
{
    inner: F,
    handle: OnceCell<F::Handle>,
}

impl<F> CachedPoolFactory<F>
where
    F: PoolFactory,
    F::Handle: Clone + Sync,
{
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            handle: OnceCell::new(),
        }
    }

    /// Whether a handle has been materialized and cached
    pub fn is_materialized(&self) -> bool {
        self.handle.initialized()
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    /// Drop the cache and return the wrapped factory.
    ///
    /// The cached handle, if any, is dropped here; callers still holding
    /// clones keep the pool alive.
    pub fn into_inner(self) -> F {
        self.inner
    }
}

#[async_trait]
impl<F> PoolFactory for CachedPoolFactory<F>
where
    F: PoolFactory,
    F::Handle: Clone + Sync,
{
    type Handle = F::Handle;

    async fn materialize(&self) -> Result<F::Handle, FactoryError> {
        let handle = self
            .handle
            .get_or_try_init(|| async {
                tracing::debug!("no cached pool, materializing");
                self.inner.materialize().await
            })
            .await?;
        Ok(handle.clone())
    }
}
