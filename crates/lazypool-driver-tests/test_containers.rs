//! Docker containers for backend tests.
//!
//! Each call starts a fresh container and hands back a [`TestServer`] that
//! owns it. The container is removed when the server is dropped, so keep it
//! alive for as long as the test uses the pool.
//!
//! ```rust,ignore
//! let server = test_containers::postgres_server().await?;
//! let credentials = server.credentials()?;
//! ```

use anyhow::Context;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::{mysql::Mysql, postgres::Postgres};

/// Connection details of a running test server
#[derive(Debug, Clone)]
pub struct ServerInfo {
    /// Dbms name as accepted by `Credentials::new`
    pub dbms: &'static str,
    /// Host address (typically 127.0.0.1)
    pub host: String,
    /// Port number (randomly assigned by testcontainers)
    pub port: u16,
    /// Database the image creates on startup
    pub schema: String,
    /// Username for authentication
    pub username: String,
    /// Password for authentication, empty when the image allows none
    pub password: String,
}

enum Container {
    Postgres(ContainerAsync<Postgres>),
    Mysql(ContainerAsync<Mysql>),
}

/// A running database server owned by one test
pub struct TestServer {
    container: Container,
    info: ServerInfo,
}

impl TestServer {
    /// Connection details for this server
    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    /// Whether the server is the PostgreSQL image
    pub fn is_postgres(&self) -> bool {
        matches!(self.container, Container::Postgres(_))
    }
}

/// Start a PostgreSQL container.
///
/// testcontainers-modules defaults: user and password `postgres`, database
/// `postgres`.
pub async fn postgres_server() -> anyhow::Result<TestServer> {
    tracing::info!("starting PostgreSQL test container");

    let container = Postgres::default()
        .start()
        .await
        .context("failed to start postgres container")?;
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .context("failed to get postgres port")?;

    tracing::info!(port, "PostgreSQL test container started");

    Ok(TestServer {
        container: Container::Postgres(container),
        info: ServerInfo {
            dbms: "postgresql",
            host: "127.0.0.1".to_string(),
            port,
            schema: "postgres".to_string(),
            username: "postgres".to_string(),
            password: "postgres".to_string(),
        },
    })
}

/// Start a MySQL container.
///
/// testcontainers-modules defaults: `root` with an empty password, database
/// `test`.
pub async fn mysql_server() -> anyhow::Result<TestServer> {
    tracing::info!("starting MySQL test container");

    let container = Mysql::default()
        .start()
        .await
        .context("failed to start mysql container")?;
    let port = container
        .get_host_port_ipv4(3306)
        .await
        .context("failed to get mysql port")?;

    tracing::info!(port, "MySQL test container started");

    Ok(TestServer {
        container: Container::Mysql(container),
        info: ServerInfo {
            dbms: "mysql",
            host: "127.0.0.1".to_string(),
            port,
            schema: "test".to_string(),
            username: "root".to_string(),
            password: String::new(),
        },
    })
}
