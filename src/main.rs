use std::process::ExitCode;

use alphadb_cli::cli::Cli;
use alphadb_cli::commands::{self, AppContext};
use alphadb_cli::config::Settings;
use alphadb_cli::ui;
use clap::Parser;
use mimalloc::MiMalloc;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            ui::error(&e);
            return ExitCode::FAILURE;
        }
    };
    cli.apply(&mut settings);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_filter()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        store = %settings.store_path().display(),
        loglevel = %settings.loglevel,
        debug = settings.debug,
        "settings loaded"
    );

    let result = match AppContext::from_settings(&settings) {
        Ok(mut ctx) => commands::run(&mut ctx, cli.command).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::error(&e);
            if settings.debug {
                eprintln!("{e:?}");
            }
            ExitCode::FAILURE
        }
    }
}
