//! Database credentials value object

use std::fmt;

use crate::{ValidationError, format_address};

/// Secret string that never renders its contents.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw secret. Only backends should call this.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("\"\"")
        } else {
            f.write_str("\"***\"")
        }
    }
}

impl fmt::Display for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

impl From<String> for Password {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Password {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Everything needed to address and authenticate to one database.
///
/// Immutable once built. Factories share it through an `Arc` and never
/// mutate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    dbms_name: String,
    host: String,
    port: u16,
    schema: String,
    username: String,
    password: Password,
}

impl Credentials {
    /// Validate and build credentials.
    ///
    /// `dbms_name`, `host`, `schema` and `username` must be non-blank and
    /// `port` must lie in 1-65535. The password may be empty for
    /// passwordless setups.
    pub fn new(
        dbms_name: impl Into<String>,
        host: impl Into<String>,
        port: u32,
        schema: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<Password>,
    ) -> Result<Self, ValidationError> {
        let dbms_name = required("dbms_name", dbms_name.into())?;
        let host = required("host", host.into())?;
        check_host(&host)?;
        let port = match u16::try_from(port) {
            Ok(port) if port > 0 => port,
            _ => return Err(ValidationError::PortOutOfRange(port)),
        };
        let schema = required("schema", schema.into())?;
        reject_reserved("schema", &schema, SCHEMA_RESERVED)?;
        let username = required("username", username.into())?;

        Ok(Self {
            dbms_name,
            host,
            port,
            schema,
            username,
            password: password.into(),
        })
    }

    pub fn dbms_name(&self) -> &str {
        &self.dbms_name
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Target database/catalog name
    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &Password {
        &self.password
    }

    /// Render `<scheme>://<host>:<port>/<schema>` for these credentials.
    pub fn address(&self, scheme: &str) -> String {
        format_address(scheme, &self.host, self.port, &self.schema)
    }
}

fn required(field: &'static str, value: String) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::EmptyField { field })
    } else {
        Ok(value)
    }
}

// Backends parse the address as a URL. Any of these would end the host or
// path early and let the rest override the target or its options.
const HOST_RESERVED: &[char] = &['/', '?', '#', '@', ':', '[', ']', '%', '\\'];
const SCHEMA_RESERVED: &[char] = &['/', '?', '#', '@', ':', '\\'];

fn reject_reserved(
    field: &'static str,
    value: &str,
    reserved: &[char],
) -> Result<(), ValidationError> {
    match value
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || reserved.contains(c))
    {
        Some(character) => Err(ValidationError::IllegalCharacter { field, character }),
        None => Ok(()),
    }
}

/// A hostname, an IPv4 address, or a bracketed IPv6 literal such as `[::1]`.
fn check_host(host: &str) -> Result<(), ValidationError> {
    let Some(literal) = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) else {
        return reject_reserved("host", host, HOST_RESERVED);
    };
    let bad = literal
        .chars()
        .find(|c| !(c.is_ascii_hexdigit() || *c == ':' || *c == '.'));
    match bad {
        Some(character) => Err(ValidationError::IllegalCharacter {
            field: "host",
            character,
        }),
        None if !literal.contains(':') => Err(ValidationError::IllegalCharacter {
            field: "host",
            character: '[',
        }),
        None => Ok(()),
    }
}
