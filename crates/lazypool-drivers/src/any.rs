//! Runtime backend selection by dbms name

use async_trait::async_trait;
use lazypool_core::{
    ConfigError, Credentials, Dbms, FactoryConfig, FactoryErrorKind, LazyPoolFactory, PoolBackend,
    PoolRequest, PoolTuning, ValidationError,
};

#[cfg(feature = "mysql")]
use crate::mysql::{MySqlBackend, MySqlBackendError, MySqlPool};
#[cfg(feature = "postgres")]
use crate::postgres::{PgPool, PostgresBackend, PostgresBackendError};

const ANY: &str = "any";

/// Any of the compiled-in backends
#[derive(Debug, Clone)]
pub enum AnyBackend {
    #[cfg(feature = "postgres")]
    Postgres(PostgresBackend),
    #[cfg(feature = "mysql")]
    MySql(MySqlBackend),
}

impl AnyBackend {
    /// Pick the backend serving `dbms_name` (aliases allowed)
    pub fn for_dbms(dbms_name: &str) -> Result<Self, ValidationError> {
        let unsupported = || ValidationError::UnsupportedDbms {
            dbms: dbms_name.to_string(),
            backend: ANY,
        };
        let dbms = Dbms::from_name(dbms_name).ok_or_else(unsupported)?;
        let backend = match dbms {
            #[cfg(feature = "postgres")]
            Dbms::Postgres => Self::Postgres(PostgresBackend::new()),
            #[cfg(feature = "mysql")]
            Dbms::MySql => Self::MySql(MySqlBackend::new()),
            #[allow(unreachable_patterns)]
            _ => {
                tracing::warn!(dbms = %dbms, "backend for dbms not compiled in");
                return Err(unsupported());
            }
        };
        tracing::debug!(dbms = %dbms, backend = backend.name(), "selected pool backend");
        Ok(backend)
    }

    /// Canonical names of every dbms a compiled-in backend serves
    pub fn available() -> Vec<&'static str> {
        let mut names = Vec::new();
        #[cfg(feature = "postgres")]
        names.push(Dbms::Postgres.scheme());
        #[cfg(feature = "mysql")]
        names.push(Dbms::MySql.scheme());
        names
    }
}

/// A live pool from whichever backend built it
#[derive(Debug, Clone)]
pub enum AnyPool {
    #[cfg(feature = "postgres")]
    Postgres(PgPool),
    #[cfg(feature = "mysql")]
    MySql(MySqlPool),
}

impl AnyPool {
    #[cfg(feature = "postgres")]
    pub fn as_postgres(&self) -> Option<&PgPool> {
        match self {
            Self::Postgres(pool) => Some(pool),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    #[cfg(feature = "mysql")]
    pub fn as_mysql(&self) -> Option<&MySqlPool> {
        match self {
            Self::MySql(pool) => Some(pool),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    /// Number of connections currently open, idle or in use
    pub fn size(&self) -> u32 {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(pool) => pool.size(),
            #[cfg(feature = "mysql")]
            Self::MySql(pool) => pool.size(),
        }
    }

    pub fn is_closed(&self) -> bool {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(pool) => pool.is_closed(),
            #[cfg(feature = "mysql")]
            Self::MySql(pool) => pool.is_closed(),
        }
    }

    /// Close every connection and wait for them to be released.
    pub async fn close(&self) {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(pool) => pool.close().await,
            #[cfg(feature = "mysql")]
            Self::MySql(pool) => pool.close().await,
        }
    }
}

/// Native error of whichever backend failed
#[derive(Debug, thiserror::Error)]
pub enum AnyBackendError {
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    Postgres(#[from] PostgresBackendError),

    #[cfg(feature = "mysql")]
    #[error(transparent)]
    MySql(#[from] MySqlBackendError),
}

#[async_trait]
impl PoolBackend for AnyBackend {
    type Handle = AnyPool;
    type Error = AnyBackendError;

    fn name(&self) -> &'static str {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(backend) => backend.name(),
            #[cfg(feature = "mysql")]
            Self::MySql(backend) => backend.name(),
        }
    }

    fn scheme_for(&self, dbms_name: &str) -> Option<&'static str> {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(backend) => backend.scheme_for(dbms_name),
            #[cfg(feature = "mysql")]
            Self::MySql(backend) => backend.scheme_for(dbms_name),
        }
    }

    fn supported_params(&self) -> &'static [&'static str] {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(backend) => backend.supported_params(),
            #[cfg(feature = "mysql")]
            Self::MySql(backend) => backend.supported_params(),
        }
    }

    fn check_param(&self, key: &str, value: &str) -> Result<(), ValidationError> {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(backend) => backend.check_param(key, value),
            #[cfg(feature = "mysql")]
            Self::MySql(backend) => backend.check_param(key, value),
        }
    }

    async fn build_pool(&self, request: PoolRequest<'_>) -> Result<AnyPool, AnyBackendError> {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(backend) => Ok(AnyPool::Postgres(backend.build_pool(request).await?)),
            #[cfg(feature = "mysql")]
            Self::MySql(backend) => Ok(AnyPool::MySql(backend.build_pool(request).await?)),
        }
    }

    fn classify(&self, error: &AnyBackendError) -> FactoryErrorKind {
        match (self, error) {
            #[cfg(feature = "postgres")]
            (Self::Postgres(backend), AnyBackendError::Postgres(e)) => backend.classify(e),
            #[cfg(feature = "mysql")]
            (Self::MySql(backend), AnyBackendError::MySql(e)) => backend.classify(e),
            #[allow(unreachable_patterns)]
            _ => FactoryErrorKind::Backend,
        }
    }
}

/// Build a factory for `credentials`, picking the backend from its dbms name.
pub fn lazy_factory(
    credentials: Credentials,
    tuning: PoolTuning,
) -> Result<LazyPoolFactory<AnyBackend>, ValidationError> {
    let backend = AnyBackend::for_dbms(credentials.dbms_name())?;
    LazyPoolFactory::new(backend, credentials, tuning)
}

/// Build a factory from a loaded configuration.
///
/// Performs no I/O beyond resolving `password_env`.
pub fn factory_from_config(
    config: &FactoryConfig,
) -> Result<LazyPoolFactory<AnyBackend>, ConfigError> {
    let credentials = config.credentials()?;
    Ok(lazy_factory(credentials, config.pool.clone())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("postgresql", "postgres")]
    #[case("pg", "postgres")]
    #[case("MySQL", "mysql")]
    #[case("mariadb", "mysql")]
    fn test_for_dbms_selects_backend(#[case] dbms: &str, #[case] expected: &str) {
        let backend = AnyBackend::for_dbms(dbms).expect("known dbms");
        assert_eq!(backend.name(), expected);
    }

    #[test]
    fn test_for_dbms_rejects_unknown_engine() {
        assert_eq!(
            AnyBackend::for_dbms("oracle").unwrap_err(),
            ValidationError::UnsupportedDbms {
                dbms: "oracle".into(),
                backend: "any",
            }
        );
    }

    #[test]
    fn test_available_lists_both_engines() {
        assert_eq!(AnyBackend::available(), vec!["postgresql", "mysql"]);
    }

    #[test]
    fn test_lazy_factory_builds_address_per_engine() {
        let pg = Credentials::new("postgres", "db", 5432, "orders", "app", "pw").expect("valid");
        let my = Credentials::new("mariadb", "db", 3306, "orders", "app", "pw").expect("valid");

        let pg = lazy_factory(pg, PoolTuning::default()).expect("factory");
        let my = lazy_factory(my, PoolTuning::default()).expect("factory");

        assert_eq!(pg.address(), "postgresql://db:5432/orders");
        assert_eq!(my.address(), "mysql://db:3306/orders");
    }

    #[test]
    fn test_lazy_factory_checks_params_against_selected_backend() {
        let creds = Credentials::new("mysql", "db", 3306, "orders", "app", "").expect("valid");
        let tuning = PoolTuning::default().with_param("application_name", "orders-api");
        assert!(matches!(
            lazy_factory(creds, tuning),
            Err(ValidationError::UnsupportedParam { backend: "mysql", .. })
        ));
    }

    #[rstest]
    #[case("pg", "postgresql://bad host:5432/orders")]
    #[case("mysql", "mysql://bad host:3306/orders")]
    #[tokio::test]
    async fn test_classify_delegates_to_matching_backend(
        #[case] dbms: &str,
        #[case] address: &str,
    ) {
        let backend = AnyBackend::for_dbms(dbms).expect("known dbms");
        let request = PoolRequest {
            address,
            username: "app",
            password: &lazypool_core::Password::new("pw"),
            tuning: &PoolTuning::default(),
        };

        let err = backend.build_pool(request).await.unwrap_err();
        assert_eq!(backend.classify(&err), FactoryErrorKind::InvalidAddress);
    }
}
