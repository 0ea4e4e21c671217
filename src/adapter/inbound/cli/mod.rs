//! CLI module graph and dispatch.

pub mod command;
pub mod config;
pub mod market;
pub mod output;
pub mod trade;
pub mod user;

use tracing::debug;

use self::command::{Cli, Commands};
use self::output::OutputConfig;
use crate::error::Result;
use crate::infrastructure::bootstrap::{Runtime, Services};
use crate::infrastructure::config::{Config, DatabaseTarget};
use crate::port::inbound::CancelToken;
use crate::port::outbound::Store;

/// Execute a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    output::configure(OutputConfig::new(cli.json, cli.quiet, cli.verbose));

    if let Commands::Config(command) = &cli.command {
        return config::execute(command, &cli.config);
    }

    let mut config = Config::load_or_default(&cli.config)?;
    match cli.verbose {
        0 => {}
        1 => config.logging.level = "debug".into(),
        _ => config.logging.level = "trace".into(),
    }
    config.init_logging();
    debug!(config = %cli.config.display(), database = %config.database, "Configuration loaded");

    let cancel = cancel_on_ctrl_c();
    match Runtime::from_config(&config)? {
        Runtime::Memory(services) => dispatch(&services, cli, &config, &cancel).await,
        Runtime::Sqlite(services) => dispatch(&services, cli, &config, &cancel).await,
    }
}

/// Token that fires when the process receives Ctrl-C.
fn cancel_on_ctrl_c() -> CancelToken {
    let (tx, cancel) = CancelToken::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(true);
        }
    });
    cancel
}

async fn dispatch<S: Store + 'static>(
    services: &Services<S>,
    cli: Cli,
    config: &Config,
    cancel: &CancelToken,
) -> Result<()> {
    match cli.command {
        Commands::Migrate => {
            migrate(config);
            Ok(())
        }
        Commands::Config(command) => config::execute(&command, &cli.config),
        Commands::User(command) => user::execute(services, command, cancel).await,
        Commands::Market(command) => market::execute(services, command, cancel).await,
        Commands::Bet(command) => trade::execute(services, command, cancel).await,
        Commands::Project(args) => trade::project(services, args).await,
    }
}

/// Opening the runtime already applied pending migrations.
fn migrate(config: &Config) {
    let target = config.database_target();
    if output::is_json() {
        let database = match &target {
            DatabaseTarget::Memory => None,
            DatabaseTarget::Sqlite(path) => Some(path.as_str()),
        };
        output::json_result("migrate", serde_json::json!({ "database": database }));
        return;
    }
    match target {
        DatabaseTarget::Memory => output::warning("In-memory store has no schema to migrate"),
        DatabaseTarget::Sqlite(path) => {
            output::success("Database schema is up to date");
            output::field("Database", path);
        }
    }
}
