//! TOML configuration for a pool factory
//!
//! ```toml
//! [credentials]
//! dbms = "postgresql"
//! host = "db.internal"
//! port = 5432
//! schema = "orders"
//! username = "app"
//! password_env = "ORDERS_DB_PASSWORD"
//!
//! [pool]
//! max_connections = 20
//!
//! [pool.params]
//! application_name = "orders-api"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::{Credentials, Password, PoolTuning, ValidationError};

/// Errors while loading factory configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("password environment variable `{0}` is not set")]
    MissingPasswordEnv(String),

    #[error("set either `password` or `password_env`, not both")]
    ConflictingPassword,
}

/// The `[credentials]` table
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsConfig {
    pub dbms: String,
    pub host: String,
    pub port: u32,
    pub schema: String,
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    /// Name of an environment variable holding the password
    #[serde(default)]
    pub password_env: Option<String>,
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("dbms", &self.dbms)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("schema", &self.schema)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("password_env", &self.password_env)
            .finish()
    }
}

/// Everything needed to build a factory
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FactoryConfig {
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub pool: PoolTuning,
}

impl FactoryConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded factory configuration");
        Self::from_toml_str(&source)
    }

    /// Build validated credentials, resolving `password_env` if set.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let password = self.resolve_password()?;
        let c = &self.credentials;
        Ok(Credentials::new(
            c.dbms.as_str(),
            c.host.as_str(),
            c.port,
            c.schema.as_str(),
            c.username.as_str(),
            password,
        )?)
    }

    fn resolve_password(&self) -> Result<Password, ConfigError> {
        match (&self.credentials.password, &self.credentials.password_env) {
            (Some(_), Some(_)) => Err(ConfigError::ConflictingPassword),
            (Some(password), None) => Ok(Password::new(password.clone())),
            (None, Some(var)) => std::env::var(var)
                .map(Password::new)
                .map_err(|_| ConfigError::MissingPasswordEnv(var.clone())),
            (None, None) => Ok(Password::default()),
        }
    }
}
