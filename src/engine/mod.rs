//! Migration engine capability and the built-in SQL engine.
//!
//! Layout:
//! - `document.rs`: version source document model and version ordering
//! - `schema.rs`: metadata table DDL and per-dialect catalog queries
//! - `verify.rs`: structural verification with severities

pub mod document;
pub mod schema;
pub mod verify;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::db::{DbHandle, Engine, LiveConnection};
use crate::error::AppError;
use document::VersionDocument;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStatus {
    pub name: String,
    pub template: Option<String>,
    pub init: bool,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Initialized,
    AlreadyInitialized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    UpToDate { version: Option<String> },
    Updated { from: Option<String>, to: String },
}

#[async_trait]
pub trait MigrationEngine: Send {
    async fn init(&mut self) -> Result<InitOutcome, AppError>;

    async fn status(&mut self) -> Result<DatabaseStatus, AppError>;

    async fn update(&mut self, source: &Value, no_data: bool) -> Result<UpdateOutcome, AppError>;

    /// Drop every table. Returns how many were dropped.
    async fn vacate(&mut self) -> Result<usize, AppError>;
}

/// Engine that tracks template and version in `adb_conf` and applies the
/// raw statements carried by each pending version.
pub struct SqlEngine<'c> {
    conn: &'c mut LiveConnection<DbHandle>,
}

impl<'c> SqlEngine<'c> {
    pub fn new(conn: &'c mut LiveConnection<DbHandle>) -> Self {
        Self { conn }
    }

    async fn table_exists(&mut self, table: &str) -> Result<bool, AppError> {
        let sql = match self.conn.engine() {
            Engine::MySql => schema::MYSQL_TABLE_EXISTS,
            Engine::Sqlite => schema::SQLITE_TABLE_EXISTS,
        };
        Ok(!self.conn.handle.fetch_strings(sql, &[table]).await?.is_empty())
    }

    /// `(version, template)` for this database, if it has been initialized.
    async fn read_meta(&mut self) -> Result<Option<(Option<String>, Option<String>)>, AppError> {
        if !self.table_exists(schema::META_TABLE).await? {
            return Ok(None);
        }
        let name = self.conn.database_name().to_string();
        let mut rows = self
            .conn
            .handle
            .fetch_rows(schema::SELECT_META, &[name.as_str()])
            .await?
            .into_iter();
        Ok(rows.next().map(|row| {
            let mut cols = row.into_iter();
            let version = cols.next().flatten();
            let template = cols.next().flatten();
            (version, template)
        }))
    }
}

fn quote_ident(engine: Engine, name: &str) -> String {
    match engine {
        Engine::MySql => format!("`{}`", name.replace('`', "``")),
        Engine::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
    }
}

#[async_trait]
impl MigrationEngine for SqlEngine<'_> {
    async fn init(&mut self) -> Result<InitOutcome, AppError> {
        if self.read_meta().await?.is_some() {
            return Ok(InitOutcome::AlreadyInitialized);
        }
        let name = self.conn.database_name().to_string();
        self.conn.handle.execute_script(schema::META_INIT).await?;
        self.conn.handle.execute(schema::INSERT_META, &[name.as_str()]).await?;
        info!(database = %name, "database initialized");
        Ok(InitOutcome::Initialized)
    }

    async fn status(&mut self) -> Result<DatabaseStatus, AppError> {
        let name = self.conn.database_name().to_string();
        Ok(match self.read_meta().await? {
            Some((version, template)) => DatabaseStatus {
                name,
                template,
                init: true,
                version,
            },
            None => DatabaseStatus {
                name,
                template: None,
                init: false,
                version: None,
            },
        })
    }

    async fn update(&mut self, source: &Value, no_data: bool) -> Result<UpdateOutcome, AppError> {
        let Some((current, template)) = self.read_meta().await? else {
            return Err(AppError::Uninitialized);
        };
        let doc = VersionDocument::from_json(source)?;

        if let Some(template) = template.as_deref()
            && template != doc.name
        {
            return Err(AppError::TemplateMismatch {
                database_template: template.to_string(),
                source_template: doc.name.clone(),
            });
        }

        let pending = doc.pending_after(current.as_deref());
        let Some(last) = pending.last().map(|v| v.id.clone()) else {
            return Ok(UpdateOutcome::UpToDate { version: current });
        };

        let name = self.conn.database_name().to_string();
        for version in pending {
            debug!(version = %version.id, statements = version.sql.len(), "applying version");
            for stmt in &version.sql {
                self.conn.handle.execute(stmt, &[]).await?;
            }
            if !no_data {
                for stmt in &version.default_data {
                    self.conn.handle.execute(stmt, &[]).await?;
                }
            }
            self.conn
                .handle
                .execute(schema::UPDATE_META, &[version.id.as_str(), doc.name.as_str(), name.as_str()])
                .await?;
        }

        info!(database = %name, from = ?current, to = %last, "database updated");
        Ok(UpdateOutcome::Updated {
            from: current,
            to: last,
        })
    }

    async fn vacate(&mut self) -> Result<usize, AppError> {
        let engine = self.conn.engine();
        let (list_sql, fk_off, fk_on) = match engine {
            Engine::MySql => (
                schema::MYSQL_LIST_TABLES,
                "SET FOREIGN_KEY_CHECKS = 0",
                "SET FOREIGN_KEY_CHECKS = 1",
            ),
            Engine::Sqlite => (
                schema::SQLITE_LIST_TABLES,
                "PRAGMA foreign_keys = OFF",
                "PRAGMA foreign_keys = ON",
            ),
        };

        let tables = self.conn.handle.fetch_strings(list_sql, &[]).await?;
        self.conn.handle.execute(fk_off, &[]).await?;
        for table in &tables {
            let drop = format!("DROP TABLE IF EXISTS {}", quote_ident(engine, table));
            self.conn.handle.execute(&drop, &[]).await?;
        }
        self.conn.handle.execute(fk_on, &[]).await?;

        info!(database = %self.conn.database_name(), dropped = tables.len(), "database vacated");
        Ok(tables.len())
    }
}
