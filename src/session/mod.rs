//! Remembered connection (`DB_SESSION`) and its resolution into a live connection.

pub mod resolver;

use std::path::PathBuf;

use crate::db::{ConnectParams, DEFAULT_MYSQL_PORT, Engine, MySqlParams};
use crate::error::AppError;
use crate::secret::Secret;
use crate::store::{ConfigStore, IniSection, SESSION_SECTION, SectionUpdate};

pub use resolver::{Resolution, SessionResolver, Unavailable};

const ENGINE: &str = "engine";
const HOST: &str = "host";
const USER: &str = "user";
const PASSWORD: &str = "password";
const DATABASE: &str = "database";
const PORT: &str = "port";
const PATH: &str = "path";

/// Session as persisted: the MySQL password is ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredSession {
    MySql {
        host: String,
        user: String,
        encrypted_password: String,
        database: String,
        port: u16,
    },
    Sqlite {
        path: PathBuf,
    },
}

/// What `DB_SESSION` currently holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRecord {
    Absent,
    /// Section exists but has no `engine` key.
    MissingEngine,
    /// `engine` names something this tool cannot drive.
    UnknownEngine(String),
    Present(StoredSession),
}

impl StoredSession {
    /// Encrypt the plaintext parameters for storage.
    pub fn seal(params: &ConnectParams, secret: &Secret) -> Result<Self, AppError> {
        Ok(match params {
            ConnectParams::MySql(p) => StoredSession::MySql {
                host: p.host.clone(),
                user: p.user.clone(),
                encrypted_password: secret.encrypt(p.password.as_bytes())?,
                database: p.database.clone(),
                port: p.port,
            },
            ConnectParams::Sqlite { path } => StoredSession::Sqlite { path: path.clone() },
        })
    }

    /// Decrypt back into driver parameters.
    pub fn unseal(&self, secret: &Secret) -> Result<ConnectParams, AppError> {
        Ok(match self {
            StoredSession::MySql {
                host,
                user,
                encrypted_password,
                database,
                port,
            } => {
                let password = String::from_utf8(secret.decrypt(encrypted_password)?)
                    .map_err(|_| AppError::Decryption)?;
                ConnectParams::MySql(MySqlParams {
                    host: host.clone(),
                    user: user.clone(),
                    password,
                    database: database.clone(),
                    port: *port,
                })
            }
            StoredSession::Sqlite { path } => ConnectParams::Sqlite { path: path.clone() },
        })
    }

    pub fn engine(&self) -> Engine {
        match self {
            StoredSession::MySql { .. } => Engine::MySql,
            StoredSession::Sqlite { .. } => Engine::Sqlite,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            StoredSession::MySql { host, database, .. } => {
                format!("MySQL database {database} on {host}")
            }
            StoredSession::Sqlite { path } => format!("SQLite database at {}", path.display()),
        }
    }

    fn to_entries(&self) -> SectionUpdate {
        let mut entries = vec![(ENGINE.to_string(), self.engine().as_str().to_string())];
        match self {
            StoredSession::MySql {
                host,
                user,
                encrypted_password,
                database,
                port,
            } => {
                entries.push((HOST.to_string(), host.clone()));
                entries.push((USER.to_string(), user.clone()));
                entries.push((PASSWORD.to_string(), encrypted_password.clone()));
                entries.push((DATABASE.to_string(), database.clone()));
                entries.push((PORT.to_string(), port.to_string()));
            }
            StoredSession::Sqlite { path } => {
                entries.push((PATH.to_string(), path.display().to_string()));
            }
        }
        entries
    }

    fn from_section(section: &IniSection) -> Result<SessionRecord, AppError> {
        let Some(engine) = section.get(ENGINE) else {
            return Ok(SessionRecord::MissingEngine);
        };
        let required = |key: &str| -> Result<String, AppError> {
            section
                .get(key)
                .map(str::to_string)
                .ok_or_else(|| AppError::missing_key(SESSION_SECTION, key))
        };

        let session = match engine.parse::<Engine>() {
            Ok(Engine::MySql) => {
                let port = match section.get(PORT) {
                    None | Some("") => DEFAULT_MYSQL_PORT,
                    Some(raw) => raw.parse().map_err(|_| AppError::InvalidValue {
                        section: SESSION_SECTION.to_string(),
                        key: PORT.to_string(),
                        value: raw.to_string(),
                    })?,
                };
                StoredSession::MySql {
                    host: required(HOST)?,
                    user: required(USER)?,
                    encrypted_password: required(PASSWORD)?,
                    database: required(DATABASE)?,
                    port,
                }
            }
            Ok(Engine::Sqlite) => StoredSession::Sqlite {
                path: PathBuf::from(required(PATH)?),
            },
            Err(other) => return Ok(SessionRecord::UnknownEngine(other)),
        };
        Ok(SessionRecord::Present(session))
    }
}

/// Read `DB_SESSION` in fallback mode.
pub fn load(store: &ConfigStore) -> Result<SessionRecord, AppError> {
    match store.section_opt(SESSION_SECTION)? {
        None => Ok(SessionRecord::Absent),
        Some(section) => StoredSession::from_section(&section),
    }
}

/// Persist `session`, fully replacing any previous one.
pub fn save(store: &ConfigStore, session: &StoredSession) -> Result<(), AppError> {
    store.replace_section(SESSION_SECTION, session.to_entries())
}

pub fn forget(store: &ConfigStore) -> Result<(), AppError> {
    store.remove(SESSION_SECTION)
}
