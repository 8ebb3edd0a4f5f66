//! Error types for lazypool
//!
//! Callers only ever see two kinds: `ValidationError` while building
//! credentials or factories, and `FactoryError` from `materialize()`.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Rejected input at credentials or factory construction time.
///
/// Always recoverable by supplying corrected input. Never produced by
/// `materialize()`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("`{field}` must not be empty")]
    EmptyField { field: &'static str },

    #[error("`{field}` must not contain {character:?}")]
    IllegalCharacter { field: &'static str, character: char },

    #[error("port {0} is outside 1-65535")]
    PortOutOfRange(u32),

    #[error("unrecognized dbms `{dbms}` for the {backend} backend")]
    UnsupportedDbms { dbms: String, backend: &'static str },

    #[error("unsupported tuning parameter `{key}` for the {backend} backend")]
    UnsupportedParam { key: String, backend: &'static str },

    #[error("invalid value `{value}` for tuning parameter `{key}`")]
    InvalidParam { key: String, value: String },

    #[error("invalid pool size: {0}")]
    PoolSize(String),
}

/// Coarse classification of a materialize failure.
///
/// Backends map their native errors onto these; anything they cannot
/// place lands in `Backend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactoryErrorKind {
    /// The address or connect options could not be parsed
    InvalidAddress,
    /// The backend rejected its configuration
    Configuration,
    /// The server refused the credentials
    Authentication,
    /// Network or TLS failure reaching the server
    Unreachable,
    /// The backend gave up waiting for a connection
    Timeout,
    /// Any other backend failure
    Backend,
}

impl FactoryErrorKind {
    /// Whether an immediate retry has a chance of succeeding.
    pub fn is_transient(&self) -> bool {
        matches!(self, FactoryErrorKind::Unreachable | FactoryErrorKind::Timeout)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FactoryErrorKind::InvalidAddress => "invalid address",
            FactoryErrorKind::Configuration => "configuration error",
            FactoryErrorKind::Authentication => "authentication failed",
            FactoryErrorKind::Unreachable => "server unreachable",
            FactoryErrorKind::Timeout => "timed out",
            FactoryErrorKind::Backend => "backend error",
        }
    }
}

impl fmt::Display for FactoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque copy of a backend's native error.
///
/// Holds the rendered message of the native error and of every error in
/// its source chain, so the original type never crosses the factory
/// boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct UnderlyingError {
    message: String,
    chain: Vec<String>,
}

impl UnderlyingError {
    /// Capture the message and source chain of a native error.
    pub fn capture(error: &(dyn StdError + 'static)) -> Self {
        let mut chain = Vec::new();
        let mut next = error.source();
        while let Some(source) = next {
            chain.push(source.to_string());
            next = source.source();
        }
        Self {
            message: error.to_string(),
            chain,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Messages of the native error's sources, outermost first.
    pub fn chain(&self) -> &[String] {
        &self.chain
    }
}

/// Failure while materializing a pool handle.
#[derive(Error, Debug, Clone)]
#[error("{kind}: {cause}")]
pub struct FactoryError {
    kind: FactoryErrorKind,
    cause: String,
    #[source]
    source: Option<UnderlyingError>,
}

impl FactoryError {
    pub fn new(kind: FactoryErrorKind, cause: impl Into<String>) -> Self {
        Self {
            kind,
            cause: cause.into(),
            source: None,
        }
    }

    /// Wrap a backend's native error, keeping only its rendered messages.
    pub fn wrap<E>(kind: FactoryErrorKind, cause: impl Into<String>, error: &E) -> Self
    where
        E: StdError + 'static,
    {
        Self {
            kind,
            cause: cause.into(),
            source: Some(UnderlyingError::capture(error)),
        }
    }

    pub fn kind(&self) -> FactoryErrorKind {
        self.kind
    }

    /// Human-readable description of what was being attempted
    pub fn cause(&self) -> &str {
        &self.cause
    }

    /// The captured native error, if one was wrapped
    pub fn underlying(&self) -> Option<&UnderlyingError> {
        self.source.as_ref()
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}
