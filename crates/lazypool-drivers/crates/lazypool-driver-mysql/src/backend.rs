//! MySQL/MariaDB backend over `sqlx::MySqlPool`

use std::str::FromStr;

use async_trait::async_trait;
use lazypool_core::{
    Dbms, FactoryErrorKind, PoolBackend, PoolRequest, PoolTuning, ValidationError,
};
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlSslMode};

const SSL_MODE: &str = "ssl_mode";
const CHARSET: &str = "charset";
const STATEMENT_CACHE_CAPACITY: &str = "statement_cache_capacity";

/// Native failures of the MySQL backend
#[derive(Debug, thiserror::Error)]
pub enum MySqlBackendError {
    #[error("invalid connection address: {0}")]
    Address(#[source] sqlx::Error),

    #[error(transparent)]
    Pool(#[from] sqlx::Error),
}

/// Builds `MySqlPool`s with sqlx. Serves both MySQL and MariaDB.
///
/// Like the PostgreSQL backend, the pool is connected before it is
/// returned.
#[derive(Debug, Clone, Default)]
pub struct MySqlBackend;

impl MySqlBackend {
    pub fn new() -> Self {
        tracing::debug!("MySQL pool backend initialized");
        Self
    }
}

fn connect_options(request: &PoolRequest<'_>) -> Result<MySqlConnectOptions, MySqlBackendError> {
    let mut options = MySqlConnectOptions::from_str(request.address)
        .map_err(MySqlBackendError::Address)?
        .username(request.username);
    if !request.password.is_empty() {
        options = options.password(request.password.expose());
    }

    for (key, value) in request.tuning.params() {
        options = match key {
            SSL_MODE => options.ssl_mode(value.parse::<MySqlSslMode>()?),
            CHARSET => options.charset(value),
            STATEMENT_CACHE_CAPACITY => options.statement_cache_capacity(
                value
                    .parse::<usize>()
                    .map_err(|e| sqlx::Error::Configuration(Box::new(e)))?,
            ),
            other => {
                return Err(MySqlBackendError::Pool(sqlx::Error::Configuration(
                    format!("unsupported parameter `{}`", other).into(),
                )));
            }
        };
    }
    Ok(options)
}

fn pool_options(tuning: &PoolTuning) -> MySqlPoolOptions {
    MySqlPoolOptions::new()
        .min_connections(tuning.min_connections())
        .max_connections(tuning.max_connections())
        .acquire_timeout(tuning.acquire_timeout())
        .idle_timeout(tuning.idle_timeout())
        .max_lifetime(tuning.max_lifetime())
        .test_before_acquire(tuning.test_before_acquire())
}

fn is_charset_name(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[async_trait]
impl PoolBackend for MySqlBackend {
    type Handle = MySqlPool;
    type Error = MySqlBackendError;

    fn name(&self) -> &'static str {
        "mysql"
    }

    fn scheme_for(&self, dbms_name: &str) -> Option<&'static str> {
        Dbms::from_name(dbms_name)
            .filter(|dbms| *dbms == Dbms::MySql)
            .map(|dbms| dbms.scheme())
    }

    fn supported_params(&self) -> &'static [&'static str] {
        &[SSL_MODE, CHARSET, STATEMENT_CACHE_CAPACITY]
    }

    fn check_param(&self, key: &str, value: &str) -> Result<(), ValidationError> {
        let valid = match key {
            SSL_MODE => value.parse::<MySqlSslMode>().is_ok(),
            CHARSET => is_charset_name(value),
            STATEMENT_CACHE_CAPACITY => value.parse::<usize>().is_ok(),
            _ => {
                return Err(ValidationError::UnsupportedParam {
                    key: key.to_string(),
                    backend: self.name(),
                });
            }
        };
        if !valid {
            return Err(ValidationError::InvalidParam {
                key: key.to_string(),
                value: value.to_string(),
            });
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, request), fields(address = request.address))]
    async fn build_pool(&self, request: PoolRequest<'_>) -> Result<MySqlPool, MySqlBackendError> {
        let options = connect_options(&request)?;
        let pool = pool_options(request.tuning).connect_with(options).await?;
        tracing::info!(
            max_connections = request.tuning.max_connections(),
            "MySQL pool connected"
        );
        Ok(pool)
    }

    fn classify(&self, error: &MySqlBackendError) -> FactoryErrorKind {
        match error {
            MySqlBackendError::Address(_) => FactoryErrorKind::InvalidAddress,
            MySqlBackendError::Pool(e) => classify_sqlx_error(e),
        }
    }
}

/// Map a sqlx error onto a factory error kind.
///
/// MySQL reports access denied (1045) with SQLSTATE 28000.
pub fn classify_sqlx_error(error: &sqlx::Error) -> FactoryErrorKind {
    match error {
        sqlx::Error::Configuration(_) => FactoryErrorKind::Configuration,
        sqlx::Error::Database(db) => match db.code() {
            Some(code) if code.starts_with("28") => FactoryErrorKind::Authentication,
            _ => FactoryErrorKind::Backend,
        },
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) => FactoryErrorKind::Unreachable,
        sqlx::Error::PoolTimedOut => FactoryErrorKind::Timeout,
        _ => FactoryErrorKind::Backend,
    }
}
