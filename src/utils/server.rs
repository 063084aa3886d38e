// mdump/src/utils/server.rs
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{Connection, Executor, Row};

use crate::config::ConnectionParams;
use crate::errors::{AppError, Result};

/// Catalog operations the backup and restore flows need from the target server.
#[allow(async_fn_in_trait)]
pub trait DatabaseServer {
    async fn list_databases(&mut self) -> Result<Vec<String>>;
    /// Approximate data plus index size in bytes.
    async fn database_size(&mut self, name: &str) -> Result<u64>;
    async fn database_exists(&mut self, name: &str) -> Result<bool>;
    async fn create_database(&mut self, name: &str) -> Result<()>;
    async fn drop_database(&mut self, name: &str) -> Result<()>;
}

/// One admin connection held for the whole run.
pub struct MySqlServer {
    conn: MySqlConnection,
}

fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

impl MySqlServer {
    pub async fn connect(params: &ConnectionParams) -> Result<Self> {
        let options = MySqlConnectOptions::new()
            .host(&params.host)
            .port(params.port)
            .username(&params.user)
            .password(&params.password);

        let conn = MySqlConnection::connect_with(&options)
            .await
            .map_err(|source| AppError::Connection {
                target: params.display_target(),
                source,
            })?;
        Ok(MySqlServer { conn })
    }

    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }
}

impl DatabaseServer for MySqlServer {
    async fn list_databases(&mut self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT CAST(schema_name AS CHAR(64)) AS name FROM information_schema.schemata ORDER BY name")
            .fetch_all(&mut self.conn)
            .await?;
        let names = rows
            .iter()
            .map(|row| row.try_get::<String, _>(0))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    async fn database_size(&mut self, name: &str) -> Result<u64> {
        let size: u64 = sqlx::query_scalar(
            "SELECT CAST(COALESCE(SUM(data_length + index_length), 0) AS UNSIGNED) \
             FROM information_schema.tables WHERE table_schema = ?",
        )
        .bind(name)
        .fetch_one(&mut self.conn)
        .await?;
        Ok(size)
    }

    async fn database_exists(&mut self, name: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM information_schema.schemata WHERE schema_name = ?",
        )
        .bind(name)
        .fetch_one(&mut self.conn)
        .await?;
        Ok(count > 0)
    }

    async fn create_database(&mut self, name: &str) -> Result<()> {
        let sql = format!("CREATE DATABASE {}", quote_identifier(name));
        (&mut self.conn).execute(sql.as_str()).await?;
        Ok(())
    }

    async fn drop_database(&mut self, name: &str) -> Result<()> {
        let sql = format!("DROP DATABASE {}", quote_identifier(name));
        (&mut self.conn).execute(sql.as_str()).await?;
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    use super::DatabaseServer;
    use crate::errors::{AppError, Result};
    use std::collections::{BTreeMap, HashSet};

    /// In-memory server catalog with optional failure injection.
    #[derive(Debug, Default)]
    pub struct FakeServer {
        pub databases: BTreeMap<String, u64>,
        pub fail_create: HashSet<String>,
        pub fail_drop: HashSet<String>,
        pub created: Vec<String>,
        pub dropped: Vec<String>,
    }

    impl FakeServer {
        pub fn with_databases(names: &[&str]) -> Self {
            FakeServer {
                databases: names.iter().map(|n| (n.to_string(), 2 * 1024 * 1024)).collect(),
                ..Default::default()
            }
        }
    }

    impl DatabaseServer for FakeServer {
        async fn list_databases(&mut self) -> Result<Vec<String>> {
            Ok(self.databases.keys().cloned().collect())
        }

        async fn database_size(&mut self, name: &str) -> Result<u64> {
            self.databases
                .get(name)
                .copied()
                .ok_or_else(|| AppError::Restore(format!("unknown database {name}")))
        }

        async fn database_exists(&mut self, name: &str) -> Result<bool> {
            Ok(self.databases.contains_key(name))
        }

        async fn create_database(&mut self, name: &str) -> Result<()> {
            if self.fail_create.contains(name) || self.databases.contains_key(name) {
                return Err(AppError::Restore(format!("Can't create database '{name}'")));
            }
            self.databases.insert(name.to_string(), 0);
            self.created.push(name.to_string());
            Ok(())
        }

        async fn drop_database(&mut self, name: &str) -> Result<()> {
            if self.fail_drop.contains(name) || self.databases.remove(name).is_none() {
                return Err(AppError::Restore(format!("Can't drop database '{name}'")));
            }
            self.dropped.push(name.to_string());
            Ok(())
        }
    }
}
