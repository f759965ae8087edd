use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{Connection, Row};
use tracing::{debug, info};

use super::{ConnectParams, ConnectionError, Connector};
use crate::error::AppError;

/// Single live connection to either supported engine.
#[derive(Debug)]
pub enum DbHandle {
    MySql(MySqlConnection),
    Sqlite(SqliteConnection),
}

impl DbHandle {
    pub async fn execute(&mut self, sql: &str, args: &[&str]) -> Result<u64, AppError> {
        let affected = match self {
            DbHandle::MySql(conn) => {
                let mut q = sqlx::query(sql);
                for arg in args {
                    q = q.bind(*arg);
                }
                q.execute(conn).await?.rows_affected()
            }
            DbHandle::Sqlite(conn) => {
                let mut q = sqlx::query(sql);
                for arg in args {
                    q = q.bind(*arg);
                }
                q.execute(conn).await?.rows_affected()
            }
        };
        Ok(affected)
    }

    /// Execute a `;`-separated script one statement at a time
    /// (sqlx::query does not accept multiple commands).
    pub async fn execute_script(&mut self, script: &str) -> Result<(), AppError> {
        for stmt in script.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            self.execute(s, &[]).await?;
        }
        Ok(())
    }

    /// Every row with each column read as optional text.
    pub async fn fetch_rows(
        &mut self,
        sql: &str,
        args: &[&str],
    ) -> Result<Vec<Vec<Option<String>>>, AppError> {
        let rows = match self {
            DbHandle::MySql(conn) => {
                let mut q = sqlx::query(sql);
                for arg in args {
                    q = q.bind(*arg);
                }
                q.fetch_all(conn)
                    .await?
                    .iter()
                    .map(|row| {
                        (0..row.len())
                            .map(|i| row.try_get::<Option<String>, _>(i))
                            .collect::<Result<Vec<_>, _>>()
                    })
                    .collect::<Result<Vec<_>, _>>()?
            }
            DbHandle::Sqlite(conn) => {
                let mut q = sqlx::query(sql);
                for arg in args {
                    q = q.bind(*arg);
                }
                q.fetch_all(conn)
                    .await?
                    .iter()
                    .map(|row| {
                        (0..row.len())
                            .map(|i| row.try_get::<Option<String>, _>(i))
                            .collect::<Result<Vec<_>, _>>()
                    })
                    .collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(rows)
    }

    /// First column of every row; NULLs are skipped.
    pub async fn fetch_strings(&mut self, sql: &str, args: &[&str]) -> Result<Vec<String>, AppError> {
        Ok(self
            .fetch_rows(sql, args)
            .await?
            .into_iter()
            .filter_map(|row| row.into_iter().next().flatten())
            .collect())
    }
}

/// Connector backed by sqlx; one fresh connection per call.
#[derive(Debug, Clone, Default)]
pub struct SqlxConnector;

impl SqlxConnector {
    async fn connect_mysql(params: &super::MySqlParams) -> Result<MySqlConnection, sqlx::Error> {
        let opts = MySqlConnectOptions::new()
            .host(&params.host)
            .port(params.port)
            .username(&params.user)
            .password(&params.password)
            .database(&params.database);
        let mut conn = MySqlConnection::connect_with(&opts).await?;
        // No implicit transaction may span CLI invocations.
        sqlx::query("SET autocommit = 1").execute(&mut conn).await?;
        Ok(conn)
    }

    async fn connect_sqlite(path: &std::path::Path) -> Result<SqliteConnection, sqlx::Error> {
        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(false);
        let mut conn = SqliteConnection::connect_with(&opts).await?;
        // Opening is lazy about the header; touch the schema to reject non-SQLite files.
        sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' LIMIT 1")
            .fetch_optional(&mut conn)
            .await?;
        Ok(conn)
    }
}

#[async_trait]
impl Connector for SqlxConnector {
    type Handle = DbHandle;

    async fn connect(&self, params: &ConnectParams) -> Result<DbHandle, ConnectionError> {
        let engine = params.engine();
        debug!(engine = %engine, db = %params.describe(), "opening database connection");

        let handle = match params {
            ConnectParams::MySql(p) => Self::connect_mysql(p).await.map(DbHandle::MySql),
            ConnectParams::Sqlite { path } => Self::connect_sqlite(path).await.map(DbHandle::Sqlite),
        }
        .map_err(|e| ConnectionError {
            engine,
            message: e.to_string(),
        })?;

        info!(engine = %engine, "database connection established");
        Ok(handle)
    }

    async fn is_live(&self, handle: &mut DbHandle) -> bool {
        match handle {
            DbHandle::MySql(conn) => conn.ping().await.is_ok(),
            DbHandle::Sqlite(conn) => conn.ping().await.is_ok(),
        }
    }
}
