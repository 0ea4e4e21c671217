//! Handler for the `config` command group.

use std::path::Path;

use serde_json::json;

use crate::adapter::inbound::cli::command::ConfigCommand;
use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::config::Config;

pub fn execute(command: &ConfigCommand, path: &Path) -> Result<()> {
    match command {
        ConfigCommand::Show => execute_show(path),
        ConfigCommand::Validate => execute_validate(path),
    }
}

/// Execute `config show`. A missing file shows the defaults.
pub fn execute_show(path: &Path) -> Result<()> {
    let config = Config::load_or_default(path)?;
    let economics = config.economics()?;

    if output::is_json() {
        output::json_result(
            "config.show",
            json!({
                "path": path.display().to_string(),
                "config": config,
                "seeds": economics.seeds,
            }),
        );
        return Ok(());
    }

    output::section("Effective Configuration");
    output::field("Path", path.display());
    output::field("Database", &config.database);
    output::field("Log level", &config.logging.level);
    output::field("Log format", &config.logging.format);

    output::section("Market Creation");
    output::field("Probability", economics.seeds.initial_probability);
    output::field("YES seed", economics.seeds.initial_yes);
    output::field("NO seed", economics.seeds.initial_no);
    output::field("Creation cost", economics.create_market_cost);
    output::field("Min horizon", format!("{}h", economics.minimum_future_hours));

    output::section("Accounts & Betting");
    output::field("Opening bal.", economics.initial_account_balance);
    output::field("Max debt", economics.maximum_debt_allowed);
    output::field("Minimum bet", economics.minimum_bet);
    output::field("First-buy fee", economics.initial_bet_fee);
    output::field("Buy fee", economics.each_bet_fee);
    output::field("Sell fee", economics.sell_shares_fee);
    output::field("Dust cap", economics.max_dust_per_sale);
    Ok(())
}

/// Execute `config validate`. The file must exist.
pub fn execute_validate(path: &Path) -> Result<()> {
    Config::load(path)?;

    if output::is_json() {
        output::json_result(
            "config.validate",
            json!({ "path": path.display().to_string(), "valid": true }),
        );
        return Ok(());
    }
    output::success("Configuration is valid");
    output::field("Path", path.display());
    Ok(())
}
