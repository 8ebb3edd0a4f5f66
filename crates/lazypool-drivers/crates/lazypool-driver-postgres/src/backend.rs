//! PostgreSQL backend over `sqlx::PgPool`

use std::str::FromStr;

use async_trait::async_trait;
use lazypool_core::{
    Dbms, FactoryErrorKind, PoolBackend, PoolRequest, PoolTuning, ValidationError,
};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};

const SSL_MODE: &str = "ssl_mode";
const APPLICATION_NAME: &str = "application_name";
const STATEMENT_CACHE_CAPACITY: &str = "statement_cache_capacity";

/// Native failures of the PostgreSQL backend
#[derive(Debug, thiserror::Error)]
pub enum PostgresBackendError {
    #[error("invalid connection address: {0}")]
    Address(#[source] sqlx::Error),

    #[error(transparent)]
    Pool(#[from] sqlx::Error),
}

/// Builds `PgPool`s with sqlx.
///
/// `build_pool` connects eagerly: the returned pool has already opened
/// its first connection, so it is ready for queries.
///
/// An empty password is not sent. sqlx then falls back to the process
/// environment: `PGPASSWORD`, or a matching `~/.pgpass` entry (`PGPASSFILE`
/// overrides the path). Credentials with an empty password may therefore
/// authenticate with a secret the caller never supplied. The same lookup
/// fills in `PGSSLMODE` and friends when no `ssl_mode` param is set.
#[derive(Debug, Clone, Default)]
pub struct PostgresBackend;

impl PostgresBackend {
    pub fn new() -> Self {
        tracing::debug!("PostgreSQL pool backend initialized");
        Self
    }

    fn connect_options(
        &self,
        request: &PoolRequest<'_>,
    ) -> Result<PgConnectOptions, PostgresBackendError> {
        let mut options = PgConnectOptions::from_str(request.address)
            .map_err(PostgresBackendError::Address)?
            .username(request.username);
        if !request.password.is_empty() {
            options = options.password(request.password.expose());
        }

        for (key, value) in request.tuning.params() {
            options = match key {
                SSL_MODE => options.ssl_mode(value.parse::<PgSslMode>()?),
                APPLICATION_NAME => options.application_name(value),
                STATEMENT_CACHE_CAPACITY => {
                    let capacity = value
                        .parse::<usize>()
                        .map_err(|e| sqlx::Error::Configuration(Box::new(e)))?;
                    options.statement_cache_capacity(capacity)
                }
                other => {
                    return Err(sqlx::Error::Configuration(
                        format!("unsupported parameter `{}`", other).into(),
                    )
                    .into());
                }
            };
        }
        Ok(options)
    }
}

fn pool_options(tuning: &PoolTuning) -> PgPoolOptions {
    PgPoolOptions::new()
        .min_connections(tuning.min_connections())
        .max_connections(tuning.max_connections())
        .acquire_timeout(tuning.acquire_timeout())
        .idle_timeout(tuning.idle_timeout())
        .max_lifetime(tuning.max_lifetime())
        .test_before_acquire(tuning.test_before_acquire())
}

#[async_trait]
impl PoolBackend for PostgresBackend {
    type Handle = PgPool;
    type Error = PostgresBackendError;

    fn name(&self) -> &'static str {
        "postgres"
    }

    fn scheme_for(&self, dbms_name: &str) -> Option<&'static str> {
        match Dbms::from_name(dbms_name)? {
            Dbms::Postgres => Some(Dbms::Postgres.scheme()),
            _ => None,
        }
    }

    fn supported_params(&self) -> &'static [&'static str] {
        &[SSL_MODE, APPLICATION_NAME, STATEMENT_CACHE_CAPACITY]
    }

    fn check_param(&self, key: &str, value: &str) -> Result<(), ValidationError> {
        let valid = match key {
            SSL_MODE => value.parse::<PgSslMode>().is_ok(),
            APPLICATION_NAME => !value.trim().is_empty(),
            STATEMENT_CACHE_CAPACITY => value.parse::<usize>().is_ok(),
            _ => {
                return Err(ValidationError::UnsupportedParam {
                    key: key.to_string(),
                    backend: self.name(),
                });
            }
        };
        if valid {
            Ok(())
        } else {
            Err(ValidationError::InvalidParam {
                key: key.to_string(),
                value: value.to_string(),
            })
        }
    }

    #[tracing::instrument(skip(self, request), fields(address = request.address))]
    async fn build_pool(&self, request: PoolRequest<'_>) -> Result<PgPool, PostgresBackendError> {
        let options = self.connect_options(&request)?;
        let pool = pool_options(request.tuning).connect_with(options).await?;
        tracing::info!(
            max_connections = request.tuning.max_connections(),
            "PostgreSQL pool connected"
        );
        Ok(pool)
    }

    fn classify(&self, error: &PostgresBackendError) -> FactoryErrorKind {
        match error {
            PostgresBackendError::Address(_) => FactoryErrorKind::InvalidAddress,
            PostgresBackendError::Pool(e) => classify_sqlx_error(e),
        }
    }
}

/// Map a sqlx error onto a factory error kind.
///
/// SQLSTATE class 28 is "invalid authorization specification".
pub fn classify_sqlx_error(error: &sqlx::Error) -> FactoryErrorKind {
    match error {
        sqlx::Error::Configuration(_) => FactoryErrorKind::Configuration,
        sqlx::Error::Database(db) if db.code().is_some_and(|code| code.starts_with("28")) => {
            FactoryErrorKind::Authentication
        }
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) => FactoryErrorKind::Unreachable,
        sqlx::Error::PoolTimedOut => FactoryErrorKind::Timeout,
        _ => FactoryErrorKind::Backend,
    }
}
