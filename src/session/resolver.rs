use std::path::PathBuf;

use thiserror::Error as ThisError;
use tracing::{info, warn};

use super::{SessionRecord, StoredSession};
use crate::db::{Connector, Engine, LiveConnection};
use crate::error::AppError;
use crate::secret;
use crate::store::{ConfigStore, SESSION_SECTION};

/// Why no connection could be produced. These are user-facing notices, not failures.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Unavailable {
    #[error("No database connection found.")]
    NoSavedSession,

    #[error("Unable to authorize using saved credentials. Please reconnect to the database.")]
    CorruptedSession,

    #[error("Saved session uses unsupported engine {0:?}. Please reconnect to the database.")]
    UnsupportedEngine(String),

    #[error("Unable to decrypt saved credentials. Please reconnect to the database.")]
    Undecryptable,

    #[error("Unable to authorize using saved credentials. Please reconnect to the database.")]
    CredentialsRejected { message: String },

    #[error("Unable to connect to database at {}", .path.display())]
    CannotOpenFile { path: PathBuf },

    #[error("This command requires a {expected} database, but the session is {found}.")]
    EngineMismatch { expected: Engine, found: Engine },
}

pub enum Resolution<'r, H> {
    Connected(&'r mut LiveConnection<H>),
    Unavailable(Unavailable),
}

enum ResolverState<H> {
    NoConnection,
    Connected(LiveConnection<H>),
    Unavailable(Unavailable),
}

/// Turns the remembered session into a live connection, at most once per invocation.
///
/// NoConnection → (resolving) → Connected | Unavailable
pub struct SessionResolver<'a, C: Connector> {
    store: &'a ConfigStore,
    connector: &'a C,
    state: ResolverState<C::Handle>,
}

impl<'a, C: Connector> SessionResolver<'a, C> {
    pub fn new(store: &'a ConfigStore, connector: &'a C) -> Self {
        Self {
            store,
            connector,
            state: ResolverState::NoConnection,
        }
    }

    /// Install a connection opened outside the resolver (fresh `connect`).
    pub fn adopt(&mut self, connection: LiveConnection<C::Handle>) {
        self.state = ResolverState::Connected(connection);
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, ResolverState::Connected(_))
    }

    pub async fn ensure_connection(
        &mut self,
        requested: Option<Engine>,
    ) -> Result<Resolution<'_, C::Handle>, AppError> {
        let stale = match &mut self.state {
            ResolverState::Connected(conn) => !self.connector.is_live(&mut conn.handle).await,
            _ => false,
        };
        if stale {
            warn!("live connection dropped; resolving saved session again");
            self.state = ResolverState::NoConnection;
        }

        if matches!(self.state, ResolverState::NoConnection) {
            self.state = match self.resolve().await? {
                Ok(conn) => ResolverState::Connected(conn),
                Err(reason) => ResolverState::Unavailable(reason),
            };
        }

        Ok(match &mut self.state {
            ResolverState::Connected(conn) => match requested {
                Some(expected) if expected != conn.engine() => {
                    Resolution::Unavailable(Unavailable::EngineMismatch {
                        expected,
                        found: conn.engine(),
                    })
                }
                _ => Resolution::Connected(conn),
            },
            ResolverState::Unavailable(reason) => Resolution::Unavailable(reason.clone()),
            ResolverState::NoConnection => unreachable!("resolution always leaves NoConnection"),
        })
    }

    async fn resolve(&self) -> Result<Result<LiveConnection<C::Handle>, Unavailable>, AppError> {
        // 1) saved session, fallback mode
        let stored = match super::load(self.store)? {
            SessionRecord::Absent => return Ok(Err(Unavailable::NoSavedSession)),
            SessionRecord::MissingEngine => {
                warn!("saved session has no engine; removing it");
                self.store.remove(SESSION_SECTION)?;
                return Ok(Err(Unavailable::CorruptedSession));
            }
            SessionRecord::UnknownEngine(engine) => {
                warn!(engine = %engine, "saved session uses an unsupported engine");
                return Ok(Err(Unavailable::UnsupportedEngine(engine)));
            }
            SessionRecord::Present(stored) => stored,
        };

        // 2) the secret is a setup invariant, not a user error
        let secret = secret::load_secret(self.store)?;

        // 3) decrypt and connect; the saved session is kept on failure
        let params = match stored.unseal(&secret) {
            Ok(params) => params,
            Err(AppError::Decryption) => {
                warn!("saved password cannot be decrypted with the current secret");
                return Ok(Err(Unavailable::Undecryptable));
            }
            Err(e) => return Err(e),
        };

        match self.connector.connect(&params).await {
            Ok(handle) => {
                info!(db = %params.describe(), "resolved saved session");
                Ok(Ok(LiveConnection::new(&params, handle)))
            }
            Err(e) => {
                warn!(error = %e, "saved session could not connect");
                Ok(Err(match stored {
                    StoredSession::MySql { .. } => Unavailable::CredentialsRejected { message: e.message },
                    StoredSession::Sqlite { path } => Unavailable::CannotOpenFile { path },
                }))
            }
        }
    }
}
