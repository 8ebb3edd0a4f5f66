//! Pool tuning parameters

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Tuning handed to a backend alongside the address and credentials.
///
/// Sizing and timeouts are typed; anything backend-specific (TLS mode,
/// application name, ...) travels in `params` and is checked by the
/// backend when a factory is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolTuning {
    /// Minimum number of connections the pool keeps open
    min_connections: u32,
    /// Maximum number of connections the pool may open
    max_connections: u32,
    /// Timeout in milliseconds when acquiring a connection
    acquire_timeout_ms: u64,
    /// Timeout in milliseconds before an idle connection is closed
    idle_timeout_ms: Option<u64>,
    /// Maximum lifetime of a connection in milliseconds
    max_lifetime_ms: Option<u64>,
    /// Ping connections before handing them out
    test_before_acquire: bool,
    /// Backend-specific options
    params: BTreeMap<String, String>,
}

impl PoolTuning {
    pub const MIN_CONNECTIONS: &'static str = "min_connections";
    pub const MAX_CONNECTIONS: &'static str = "max_connections";
    pub const ACQUIRE_TIMEOUT_MS: &'static str = "acquire_timeout_ms";
    pub const IDLE_TIMEOUT_MS: &'static str = "idle_timeout_ms";
    pub const MAX_LIFETIME_MS: &'static str = "max_lifetime_ms";
    pub const TEST_BEFORE_ACQUIRE: &'static str = "test_before_acquire";

    /// Create tuning with the given pool bounds and default timeouts.
    ///
    /// Bounds are checked by `validate()`, which factories call on
    /// construction.
    pub fn new(min_connections: u32, max_connections: u32) -> Self {
        Self {
            min_connections,
            max_connections,
            acquire_timeout_ms: 30_000, // 30 seconds
            idle_timeout_ms: Some(600_000), // 10 minutes
            max_lifetime_ms: None,
            test_before_acquire: true,
            params: BTreeMap::new(),
        }
    }

    /// Build tuning from a flat property map.
    ///
    /// Recognized keys fill the typed fields; every other key is kept as a
    /// backend parameter.
    pub fn from_params<I, K, V>(params: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        params
            .into_iter()
            .try_fold(Self::default(), |tuning, (key, value)| {
                tuning.with_property(key.into(), value.into())
            })
    }

    fn with_property(mut self, key: String, value: String) -> Result<Self, ValidationError> {
        match key.as_str() {
            Self::MIN_CONNECTIONS => self.min_connections = parse(&key, &value)?,
            Self::MAX_CONNECTIONS => self.max_connections = parse(&key, &value)?,
            Self::ACQUIRE_TIMEOUT_MS => self.acquire_timeout_ms = parse(&key, &value)?,
            Self::IDLE_TIMEOUT_MS => self.idle_timeout_ms = Some(parse(&key, &value)?),
            Self::MAX_LIFETIME_MS => self.max_lifetime_ms = Some(parse(&key, &value)?),
            Self::TEST_BEFORE_ACQUIRE => self.test_before_acquire = parse(&key, &value)?,
            _ => {
                self.params.insert(key, value);
            }
        }
        Ok(self)
    }

    /// Set the acquire timeout in milliseconds
    pub fn with_acquire_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.acquire_timeout_ms = timeout_ms;
        self
    }

    /// Set the idle timeout in milliseconds; `None` keeps idle connections
    pub fn with_idle_timeout_ms(mut self, timeout_ms: Option<u64>) -> Self {
        self.idle_timeout_ms = timeout_ms;
        self
    }

    /// Set the maximum connection lifetime in milliseconds
    pub fn with_max_lifetime_ms(mut self, lifetime_ms: u64) -> Self {
        self.max_lifetime_ms = Some(lifetime_ms);
        self
    }

    pub fn with_test_before_acquire(mut self, test: bool) -> Self {
        self.test_before_acquire = test;
        self
    }

    /// Add a backend-specific parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Check pool bounds.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_connections == 0 {
            return Err(ValidationError::PoolSize(
                "max_connections must be greater than 0".into(),
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(ValidationError::PoolSize(format!(
                "min_connections ({}) cannot exceed max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }
        Ok(())
    }

    pub fn min_connections(&self) -> u32 {
        self.min_connections
    }

    pub fn max_connections(&self) -> u32 {
        self.max_connections
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_ms.map(Duration::from_millis)
    }

    pub fn max_lifetime(&self) -> Option<Duration> {
        self.max_lifetime_ms.map(Duration::from_millis)
    }

    pub fn test_before_acquire(&self) -> bool {
        self.test_before_acquire
    }

    /// Look up a backend-specific parameter
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Default for PoolTuning {
    /// Defaults:
    /// - min_connections: 1
    /// - max_connections: 10
    /// - acquire_timeout: 30 seconds
    /// - idle_timeout: 10 minutes
    /// - max_lifetime: None
    /// - test_before_acquire: true
    fn default() -> Self {
        Self::new(1, 10)
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ValidationError> {
    value
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidParam {
            key: key.to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tuning_defaults() {
        let tuning = PoolTuning::default();
        assert_eq!(tuning.min_connections(), 1);
        assert_eq!(tuning.max_connections(), 10);
        assert_eq!(tuning.acquire_timeout(), Duration::from_millis(30_000));
        assert_eq!(tuning.idle_timeout(), Some(Duration::from_millis(600_000)));
        assert!(tuning.max_lifetime().is_none());
        assert!(tuning.test_before_acquire());
        assert_eq!(tuning.params().count(), 0);
        assert!(tuning.validate().is_ok());
    }

    #[test]
    fn test_tuning_builders() {
        let tuning = PoolTuning::new(2, 5)
            .with_acquire_timeout_ms(5000)
            .with_idle_timeout_ms(None)
            .with_max_lifetime_ms(3_600_000)
            .with_test_before_acquire(false)
            .with_param("application_name", "orders");

        assert_eq!(tuning.acquire_timeout(), Duration::from_millis(5000));
        assert_eq!(tuning.idle_timeout(), None);
        assert_eq!(tuning.max_lifetime(), Some(Duration::from_millis(3_600_000)));
        assert!(!tuning.test_before_acquire());
        assert_eq!(tuning.param("application_name"), Some("orders"));
    }

    #[test]
    fn test_from_params_splits_common_and_backend_keys() {
        let tuning = PoolTuning::from_params([
            ("max_connections", "20"),
            ("min_connections", "4"),
            ("acquire_timeout_ms", "2500"),
            ("test_before_acquire", "false"),
            ("ssl_mode", "require"),
        ])
        .expect("valid properties");

        assert_eq!(tuning.max_connections(), 20);
        assert_eq!(tuning.min_connections(), 4);
        assert_eq!(tuning.acquire_timeout(), Duration::from_millis(2500));
        assert!(!tuning.test_before_acquire());
        assert_eq!(tuning.params().collect::<Vec<_>>(), vec![("ssl_mode", "require")]);
    }

    #[test]
    fn test_from_params_rejects_malformed_value() {
        let err = PoolTuning::from_params([("max_connections", "lots")]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidParam {
                key: "max_connections".into(),
                value: "lots".into(),
            }
        );
    }

    #[test]
    fn test_validate_bounds() {
        assert!(matches!(
            PoolTuning::new(0, 0).validate(),
            Err(ValidationError::PoolSize(_))
        ));
        let err = PoolTuning::new(10, 5).validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid pool size: min_connections (10) cannot exceed max_connections (5)"
        );
        assert!(PoolTuning::new(0, 1).validate().is_ok());
    }

    #[test]
    fn test_tuning_toml_roundtrip_with_defaults() {
        let tuning: PoolTuning = toml::from_str(
            r#"
            max_connections = 3
            [params]
            charset = "utf8mb4"
            "#,
        )
        .expect("deserialize");

        assert_eq!(tuning.max_connections(), 3);
        assert_eq!(tuning.min_connections(), 1);
        assert_eq!(tuning.param("charset"), Some("utf8mb4"));

        let rendered = toml::to_string(&tuning).expect("serialize");
        let back: PoolTuning = toml::from_str(&rendered).expect("deserialize");
        assert_eq!(back, tuning);
    }

    #[test]
    fn test_tuning_rejects_unknown_typed_key() {
        let result: Result<PoolTuning, _> = toml::from_str("max_conections = 3");
        assert!(result.is_err());
    }
}
