//! Connection address template and database engine kinds

use std::fmt;
use std::str::FromStr;

/// Layout of every address handed to a backend:
/// `<scheme>://<host>:<port>/<schema>`.
pub const ADDRESS_TEMPLATE: &str = "<scheme>://<host>:<port>/<schema>";

/// Render the connection address for a database.
///
/// Credentials are never embedded; backends receive them separately.
///
/// ```
/// use lazypool_core::format_address;
///
/// assert_eq!(
///     format_address("postgresql", "db.internal", 5432, "orders"),
///     "postgresql://db.internal:5432/orders"
/// );
/// ```
pub fn format_address(scheme: &str, host: &str, port: u16, schema: &str) -> String {
    format!("{}://{}:{}/{}", scheme, host, port, schema)
}

/// Database engines with a built-in scheme mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dbms {
    Postgres,
    MySql,
}

impl Dbms {
    /// Resolve an engine from its name or a common alias (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "postgresql" | "postgres" | "pg" => Some(Dbms::Postgres),
            "mysql" | "mariadb" => Some(Dbms::MySql),
            _ => None,
        }
    }

    /// Canonical URL scheme for this engine
    pub fn scheme(&self) -> &'static str {
        match self {
            Dbms::Postgres => "postgresql",
            Dbms::MySql => "mysql",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Dbms::Postgres => 5432,
            Dbms::MySql => 3306,
        }
    }
}

impl fmt::Display for Dbms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

impl FromStr for Dbms {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown dbms `{}`", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_format_address_exact_layout() {
        assert_eq!(
            format_address("postgresql", "db.internal", 5432, "orders"),
            "postgresql://db.internal:5432/orders"
        );
        assert_eq!(
            format_address("mysql", "10.0.0.7", 3306, "billing"),
            "mysql://10.0.0.7:3306/billing"
        );
    }

    #[rstest]
    #[case("postgresql", Dbms::Postgres)]
    #[case("postgres", Dbms::Postgres)]
    #[case("PG", Dbms::Postgres)]
    #[case("MySQL", Dbms::MySql)]
    #[case("mariadb", Dbms::MySql)]
    fn test_dbms_aliases(#[case] name: &str, #[case] expected: Dbms) {
        assert_eq!(Dbms::from_name(name), Some(expected));
        assert_eq!(name.parse::<Dbms>(), Ok(expected));
    }

    #[test]
    fn test_dbms_unknown() {
        assert_eq!(Dbms::from_name("oracle"), None);
        assert!("".parse::<Dbms>().is_err());
    }

    #[test]
    fn test_dbms_scheme_and_port() {
        assert_eq!(Dbms::Postgres.scheme(), "postgresql");
        assert_eq!(Dbms::MySql.scheme(), "mysql");
        assert_eq!(Dbms::Postgres.default_port(), 5432);
        assert_eq!(Dbms::MySql.default_port(), 3306);
        assert_eq!(Dbms::MySql.to_string(), "mysql");
    }
}
