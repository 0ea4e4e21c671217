use std::process::ExitCode;

use clap::Parser;
use oddsmith::adapter::inbound::cli::command::Cli;
use oddsmith::adapter::inbound::cli::{self, output};

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match cli::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
