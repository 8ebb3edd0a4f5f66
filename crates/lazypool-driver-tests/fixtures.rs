//! Shared fixtures for parameterized backend tests.
//!
//! Tests name the engine with [`TestDbms`] and let rstest fan out:
//!
//! ```rust,ignore
//! #[rstest]
//! #[case::postgres(TestDbms::Postgres)]
//! #[case::mysql(TestDbms::Mysql)]
//! #[tokio::test]
//! #[ignore = "requires Docker"]
//! async fn test_something(#[case] dbms: TestDbms) -> anyhow::Result<()> {
//!     let server = start_server(dbms).await?;
//!     let factory = lazy_factory(credentials(&server)?, PoolTuning::default())?;
//!     let pool = factory.materialize().await?;
//!     assert_eq!(ping(&pool).await?, 1);
//!     Ok(())
//! }
//! ```

use std::sync::Once;

use lazypool_core::Credentials;
use lazypool_drivers::AnyPool;
use tracing_subscriber::EnvFilter;

use crate::test_containers::{TestServer, mysql_server, postgres_server};

/// Engines exercised by the suite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestDbms {
    /// PostgreSQL via the `postgres` image
    Postgres,
    /// MySQL via the `mysql` image
    Mysql,
}

/// Install a test-friendly tracing subscriber once per process.
///
/// Filter with `RUST_LOG`, e.g. `RUST_LOG=lazypool_core=debug`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Start a server for `dbms`
pub async fn start_server(dbms: TestDbms) -> anyhow::Result<TestServer> {
    init_tracing();
    match dbms {
        TestDbms::Postgres => postgres_server().await,
        TestDbms::Mysql => mysql_server().await,
    }
}

/// Valid credentials for `server`
pub fn credentials(server: &TestServer) -> anyhow::Result<Credentials> {
    let password = server.info().password.clone();
    credentials_with_password(server, &password)
}

/// Credentials for `server` with an arbitrary password
pub fn credentials_with_password(
    server: &TestServer,
    password: &str,
) -> anyhow::Result<Credentials> {
    let info = server.info();
    Ok(Credentials::new(
        info.dbms,
        info.host.as_str(),
        u32::from(info.port),
        info.schema.as_str(),
        info.username.as_str(),
        password,
    )?)
}

/// Run `SELECT 1` through the pool
pub async fn ping(pool: &AnyPool) -> anyhow::Result<i64> {
    let value = match pool {
        AnyPool::Postgres(pool) => {
            sqlx::query_scalar::<_, i64>("SELECT 1::int8")
                .fetch_one(pool)
                .await?
        }
        AnyPool::MySql(pool) => sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await?,
    };
    Ok(value)
}
