//! Configuration-driven factories against live servers

#[cfg(test)]
mod config_tests {
    use std::io::Write;

    use anyhow::Result;
    use lazypool_core::{FactoryConfig, PoolFactory};
    use lazypool_drivers::factory_from_config;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::fixtures::{TestDbms, ping, start_server};
    use crate::test_containers::ServerInfo;

    fn config_toml(info: &ServerInfo) -> String {
        format!(
            r#"
[credentials]
dbms = "{dbms}"
host = "{host}"
port = {port}
schema = "{schema}"
username = "{username}"
password = "{password}"

[pool]
min_connections = 1
max_connections = 3
acquire_timeout_ms = 10000
"#,
            dbms = info.dbms,
            host = info.host,
            port = info.port,
            schema = info.schema,
            username = info.username,
            password = info.password,
        )
    }

    #[rstest]
    #[case::postgres(TestDbms::Postgres)]
    #[case::mysql(TestDbms::Mysql)]
    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_factory_from_config_file(#[case] dbms: TestDbms) -> Result<()> {
        let server = start_server(dbms).await?;
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(config_toml(server.info()).as_bytes())?;

        let config = FactoryConfig::from_file(file.path())?;
        let factory = factory_from_config(&config)?;
        assert_eq!(factory.tuning().max_connections(), 3);

        let pool = factory.materialize().await?;
        assert_eq!(ping(&pool).await?, 1);
        Ok(())
    }
}
