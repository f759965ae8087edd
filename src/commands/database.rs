use owo_colors::OwoColorize;

use super::require_connection;
use crate::db::{Connector, DbHandle};
use crate::engine::{InitOutcome, MigrationEngine, SqlEngine, UpdateOutcome};
use crate::error::AppError;
use crate::prompt::Prompter;
use crate::session::SessionResolver;
use crate::sources::{HttpFetch, VersionSourceRegistry};
use crate::ui;

pub async fn init<C>(resolver: &mut SessionResolver<'_, C>) -> Result<(), AppError>
where
    C: Connector<Handle = DbHandle>,
{
    let Some(conn) = require_connection(resolver).await? else {
        return Ok(());
    };
    ui::notice("Getting the database ready");
    match SqlEngine::new(conn).init().await? {
        InitOutcome::AlreadyInitialized => ui::warning("The database is already initialized"),
        InitOutcome::Initialized => ui::success("Database successfully initialized"),
    }
    Ok(())
}

pub async fn status<C>(resolver: &mut SessionResolver<'_, C>) -> Result<(), AppError>
where
    C: Connector<Handle = DbHandle>,
{
    ui::title("database status");
    let Some(conn) = require_connection(resolver).await? else {
        return Ok(());
    };
    let status = SqlEngine::new(conn).status().await?;

    println!("Database: {}", status.name);
    println!("Template: {}", status.template.as_deref().unwrap_or("None"));
    if status.init {
        println!("Status: {}", "Initialized".cyan());
    } else {
        println!("Status: {}", "Uninitialized".yellow());
    }
    println!("Version: {}\n", status.version.as_deref().unwrap_or("None"));
    Ok(())
}

pub async fn update<C, F, P>(
    resolver: &mut SessionResolver<'_, C>,
    registry: &VersionSourceRegistry<'_, F>,
    prompter: &mut P,
    no_data: bool,
) -> Result<(), AppError>
where
    C: Connector<Handle = DbHandle>,
    F: HttpFetch + ?Sized,
    P: Prompter + ?Sized,
{
    ui::title("update");
    let Some(conn) = require_connection(resolver).await? else {
        return Ok(());
    };
    let mut engine = SqlEngine::new(conn);

    let status = engine.status().await?;
    if !status.init {
        ui::warning(format!("Database {} has not yet been initialized", status.name));
        return Ok(());
    }

    let Some(location) = registry.select(prompter).await? else {
        return Ok(());
    };
    ui::notice("Reading version source");
    let source = registry.resolve(&location).await?;

    ui::notice("Running updates on the database");
    match engine.update(&source, no_data).await? {
        UpdateOutcome::UpToDate { version } => ui::info(format!(
            "Database is already the latest version ({})",
            version.as_deref().unwrap_or("None")
        )),
        UpdateOutcome::Updated { to, .. } => {
            ui::success(format!("Database successfully updated to the latest version ({to})"))
        }
    }
    Ok(())
}

pub async fn vacate<C, P>(
    resolver: &mut SessionResolver<'_, C>,
    prompter: &mut P,
    confirm: bool,
) -> Result<(), AppError>
where
    C: Connector<Handle = DbHandle>,
    P: Prompter + ?Sized,
{
    ui::title("vacate");
    if !confirm {
        println!(
            "{} {} {}",
            "The vacate function requires the".yellow(),
            "--confirm".red(),
            "option.".yellow()
        );
        println!(
            "This is a safety feature that hopefully prevents unintended data loss.\n\nDon't worry, you'll still be prompted for confirmation!\n"
        );
        return Ok(());
    }

    let Some(conn) = require_connection(resolver).await? else {
        return Ok(());
    };

    println!(
        "{} {}",
        "The vacate function".yellow(),
        "deletes all data in the database.".red()
    );
    ui::warning("This action can NOT be undone.");

    let Some(sure) = prompter.ask_confirm(
        "Are you absolutely sure you want to completely delete all data?",
        false,
    )?
    else {
        return Ok(());
    };
    if !sure {
        ui::notice("Not emptying\n");
        return Ok(());
    }

    ui::notice("Removing all data from database");
    let dropped = SqlEngine::new(conn).vacate().await?;
    ui::success(format!(
        "The database has successfully been emptied ({dropped} tables dropped)."
    ));
    Ok(())
}
