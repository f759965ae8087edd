//! Database driver capability.
//!
//! Layout:
//! - `mod.rs`: engine tag, connection parameters, `Connector` trait, `LiveConnection`
//! - `sqlx_driver.rs`: MySQL/SQLite connector backed by sqlx

pub mod sqlx_driver;

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error as ThisError;

pub use sqlx_driver::{DbHandle, SqlxConnector};

pub const DEFAULT_MYSQL_PORT: u16 = 3306;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    MySql,
    Sqlite,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::MySql => "mysql",
            Engine::Sqlite => "sqlite",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Engine::MySql => "MySQL",
            Engine::Sqlite => "SQLite",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mysql" => Ok(Engine::MySql),
            "sqlite" => Ok(Engine::Sqlite),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct MySqlParams {
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub port: u16,
}

impl fmt::Debug for MySqlParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MySqlParams")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("port", &self.port)
            .finish()
    }
}

/// Plaintext parameters handed to a driver. Never persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectParams {
    MySql(MySqlParams),
    Sqlite { path: PathBuf },
}

impl ConnectParams {
    pub fn engine(&self) -> Engine {
        match self {
            ConnectParams::MySql(_) => Engine::MySql,
            ConnectParams::Sqlite { .. } => Engine::Sqlite,
        }
    }

    /// Human-readable target, e.g. `MySQL database shop on localhost`.
    pub fn describe(&self) -> String {
        match self {
            ConnectParams::MySql(p) => {
                format!("MySQL database {} on {}", p.database, p.host)
            }
            ConnectParams::Sqlite { path } => {
                format!("SQLite database at {}", path.display())
            }
        }
    }

    /// Name the migration engine records the database under.
    pub fn database_name(&self) -> String {
        match self {
            ConnectParams::MySql(p) => p.database.clone(),
            ConnectParams::Sqlite { path } => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        }
    }
}

/// Driver-level failure to open a connection.
#[derive(Debug, Clone, ThisError)]
#[error("{engine} connection failed: {message}")]
pub struct ConnectionError {
    pub engine: Engine,
    pub message: String,
}

/// Capability set the session layer is polymorphic over.
#[async_trait]
pub trait Connector: Send + Sync {
    type Handle: Send;

    /// Open a connection in auto-commit mode.
    async fn connect(&self, params: &ConnectParams) -> Result<Self::Handle, ConnectionError>;

    async fn is_live(&self, handle: &mut Self::Handle) -> bool;
}

/// Process-local connection. Exists for one CLI invocation only.
#[derive(Debug)]
pub struct LiveConnection<H> {
    engine: Engine,
    name: String,
    description: String,
    pub handle: H,
}

impl<H> LiveConnection<H> {
    pub fn new(params: &ConnectParams, handle: H) -> Self {
        Self {
            engine: params.engine(),
            name: params.database_name(),
            description: params.describe(),
            handle,
        }
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }

    pub fn database_name(&self) -> &str {
        &self.name
    }

    pub fn describe(&self) -> &str {
        &self.description
    }
}
