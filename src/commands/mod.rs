//! Command handlers and the guards composed around them at dispatch.

pub mod connect;
pub mod database;
pub mod sources;

use tracing::debug;

use crate::cli::{Command, SourcesCommand};
use crate::config::Settings;
use crate::db::{Connector, DbHandle, LiveConnection, SqlxConnector};
use crate::error::AppError;
use crate::prompt::{Prompter, TerminalPrompter};
use crate::secret;
use crate::session::{self, Resolution, SessionRecord, SessionResolver};
use crate::sources::{HttpFetch, ReqwestFetcher, VersionSourceRegistry};
use crate::store::ConfigStore;
use crate::ui;

/// Everything one invocation needs, built once and passed down.
pub struct AppContext<C, F, P> {
    pub store: ConfigStore,
    pub connector: C,
    pub fetcher: F,
    pub prompter: P,
}

impl AppContext<SqlxConnector, ReqwestFetcher, TerminalPrompter> {
    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        Ok(Self {
            store: ConfigStore::new(settings.store_path()),
            connector: SqlxConnector,
            fetcher: ReqwestFetcher::new()?,
            prompter: TerminalPrompter,
        })
    }
}

/// Guard run before every command: the store must carry a secret.
pub fn ensure_config(store: &ConfigStore) -> Result<(), AppError> {
    secret::ensure_secret(store)
}

/// Guard for commands that need a database. `None` means the notice has been
/// printed and the command should stop.
pub async fn require_connection<'r, C>(
    resolver: &'r mut SessionResolver<'_, C>,
) -> Result<Option<&'r mut LiveConnection<C::Handle>>, AppError>
where
    C: Connector,
{
    match resolver.ensure_connection(None).await? {
        Resolution::Connected(conn) => Ok(Some(conn)),
        Resolution::Unavailable(reason) => {
            ui::unavailable(&reason);
            Ok(None)
        }
    }
}

/// One line naming the database the saved session points at. A session that
/// cannot be read is left for the resolver or a fresh `connect` to deal with.
pub fn session_banner(store: &ConfigStore) {
    match session::load(store) {
        Ok(SessionRecord::Present(stored)) => {
            ui::notice(format!("Connected to {}\n", stored.describe()));
        }
        Ok(_) => {}
        Err(e) => debug!(error = %e, "saved session unreadable; no banner"),
    }
}

pub async fn run<C, F, P>(ctx: &mut AppContext<C, F, P>, command: Command) -> Result<(), AppError>
where
    C: Connector<Handle = DbHandle>,
    F: HttpFetch,
    P: Prompter,
{
    ensure_config(&ctx.store)?;
    // connect and disconnect replace or drop the session, so they must work
    // even when it is broken.
    if !matches!(command, Command::Connect | Command::Disconnect) {
        session_banner(&ctx.store);
    }
    debug!(?command, "dispatching command");

    let AppContext {
        store,
        connector,
        fetcher,
        prompter,
    } = ctx;
    let mut resolver = SessionResolver::new(store, connector);
    let registry = VersionSourceRegistry::new(store, fetcher);

    match command {
        Command::Connect => {
            if let Some(conn) = connect::connect(store, connector, prompter).await? {
                resolver.adopt(conn);
            }
            Ok(())
        }
        Command::Init => database::init(&mut resolver).await,
        Command::Status => database::status(&mut resolver).await,
        Command::Update { no_data } => {
            database::update(&mut resolver, &registry, prompter, no_data).await
        }
        Command::Vacate { confirm } => database::vacate(&mut resolver, prompter, confirm).await,
        Command::Verify => sources::verify_source(&registry, prompter).await,
        Command::Disconnect => {
            session::forget(store)?;
            ui::success("Saved session removed");
            Ok(())
        }
        Command::Sources { action } => match action {
            SourcesCommand::List => sources::list(&registry),
            SourcesCommand::Add => sources::add(&registry, prompter).await,
            SourcesCommand::Remove { name } => sources::remove(&registry, &name),
        },
    }
}
