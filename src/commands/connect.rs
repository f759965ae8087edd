use std::path::PathBuf;

use owo_colors::OwoColorize;
use tracing::info;

use crate::db::{ConnectParams, Connector, DEFAULT_MYSQL_PORT, Engine, LiveConnection, MySqlParams};
use crate::error::AppError;
use crate::prompt::Prompter;
use crate::secret;
use crate::session::{self, StoredSession};
use crate::store::ConfigStore;
use crate::ui;

const ENGINE_CHOICES: [Engine; 2] = [Engine::MySql, Engine::Sqlite];

/// Interactive `connect`: prompt, connect directly, and only on success
/// persist the new session (replacing any previous one).
pub async fn connect<C, P>(
    store: &ConfigStore,
    connector: &C,
    prompter: &mut P,
) -> Result<Option<LiveConnection<C::Handle>>, AppError>
where
    C: Connector,
    P: Prompter + ?Sized,
{
    ui::title("connect");

    let choices: Vec<String> = ENGINE_CHOICES
        .iter()
        .map(|e| e.display_name().to_string())
        .collect();
    let Some(idx) = prompter.ask_choice("Database engine", &choices)? else {
        return Ok(None);
    };
    let params = match ENGINE_CHOICES.get(idx) {
        Some(Engine::MySql) => prompt_mysql(prompter)?,
        Some(Engine::Sqlite) => prompt_sqlite(prompter)?,
        None => return Ok(None),
    };
    let Some(params) = params else {
        return Ok(None);
    };

    let handle = connector
        .connect(&params)
        .await
        .map_err(|e| AppError::ConnectionRejected(e.message))?;

    let secret = secret::load_secret(store)?;
    session::save(store, &StoredSession::seal(&params, &secret)?)?;
    info!(engine = %params.engine(), "new session saved");

    ui::success(format!("Successfully connected to {}", params.describe()));
    Ok(Some(LiveConnection::new(&params, handle)))
}

fn prompt_mysql<P>(prompter: &mut P) -> Result<Option<ConnectParams>, AppError>
where
    P: Prompter + ?Sized,
{
    ui::notice("Connecting to a MySQL database requires you to provide log-in credentials\n");
    println!("{} URL/IP (Default localhost)", "Host:".cyan());
    println!("{} User with permissions to alter the database", "User:".cyan());
    println!("{} The users password", "Password:".cyan());
    println!("{} The name of the database to connect to", "Database:".cyan());
    println!("{} (Default {DEFAULT_MYSQL_PORT})\n", "Port:".cyan());

    let Some(host) = prompter.ask_text("Host", Some("localhost"))? else {
        return Ok(None);
    };
    let Some(user) = prompter.ask_text("User", None)? else {
        return Ok(None);
    };
    let Some(password) = prompter.ask_password("Password")? else {
        return Ok(None);
    };
    let Some(database) = prompter.ask_text("Database", None)? else {
        return Ok(None);
    };

    let default_port = DEFAULT_MYSQL_PORT.to_string();
    let port = loop {
        let Some(raw) = prompter.ask_text("Port", Some(&default_port))? else {
            return Ok(None);
        };
        match parse_port(&raw) {
            Some(port) => break port,
            None => ui::failure("Port must be a number"),
        }
    };

    Ok(Some(ConnectParams::MySql(MySqlParams {
        host: match host.trim() {
            "" => "localhost".to_string(),
            h => h.to_string(),
        },
        user: user.trim().to_string(),
        password,
        database: database.trim().to_string(),
        port,
    })))
}

fn prompt_sqlite<P>(prompter: &mut P) -> Result<Option<ConnectParams>, AppError>
where
    P: Prompter + ?Sized,
{
    loop {
        let Some(raw) =
            prompter.ask_text("Please supply an absolute file path to the SQLite db file", None)?
        else {
            return Ok(None);
        };
        let path = PathBuf::from(raw.trim());
        match validate_sqlite_path(&path) {
            Ok(()) => return Ok(Some(ConnectParams::Sqlite { path })),
            Err(reason) => ui::failure(reason),
        }
    }
}

fn parse_port(raw: &str) -> Option<u16> {
    match raw.trim() {
        "" => Some(DEFAULT_MYSQL_PORT),
        s => s.parse().ok(),
    }
}

fn validate_sqlite_path(path: &std::path::Path) -> Result<(), &'static str> {
    if !path.is_absolute() {
        return Err("Supplied path is not absolute!");
    }
    if !path.exists() {
        return Err("Supplied path does not exist!");
    }
    if !path.is_file() {
        return Err("Supplied path is not a file!");
    }
    Ok(())
}
