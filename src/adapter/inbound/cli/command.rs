//! Command-line interface definitions.
//!
//! Operator commands for the exchange: schema migration, configuration
//! checks, accounts, markets, trading and projections. Commands acting on
//! behalf of a user take `--as <username>`.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

use crate::infrastructure::config::settings::DEFAULT_CONFIG_PATH;

/// Binary prediction-market exchange
#[derive(Parser, Debug)]
#[command(name = "oddsmith")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or upgrade the database schema
    Migrate,

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Manage accounts
    #[command(subcommand)]
    User(UserCommand),

    /// Create, inspect and resolve markets
    #[command(subcommand)]
    Market(MarketCommand),

    /// Buy or sell shares
    #[command(subcommand)]
    Bet(BetCommand),

    /// Price a hypothetical bet without placing it
    Project(ProjectArgs),
}

/// Subcommands for `oddsmith config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration with defaults applied
    Show,
    /// Validate the configuration file
    Validate,
}

/// Subcommands for `oddsmith user`.
#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Register a new account
    Create(UserCreateArgs),
    /// Show an account balance and credit line
    Balance(UsernameArg),
    /// List ledger entries, oldest first
    Ledger(UsernameArg),
}

/// Subcommands for `oddsmith market`.
#[derive(Subcommand, Debug)]
pub enum MarketCommand {
    /// Create a binary market
    Create(MarketCreateArgs),
    /// Show market details
    Show(MarketIdArg),
    /// List markets newest first
    List(MarketListArgs),
    /// Search titles and descriptions
    Search(MarketSearchArgs),
    /// Resolve a market as YES, NO or N/A
    Resolve(MarketResolveArgs),
    /// Rank traders by profit
    Leaderboard(MarketLeaderboardArgs),
    /// Show every trader's position
    Positions(MarketIdArg),
    /// List bets with the probability after each
    Bets(MarketIdArg),
    /// Rename the YES/NO labels
    Labels(MarketLabelsArgs),
    /// Delete a market that has no bets
    Delete(MarketActorArgs),
}

/// Subcommands for `oddsmith bet`.
#[derive(Subcommand, Debug)]
pub enum BetCommand {
    /// Stake an amount on an outcome
    Place(TradeArgs),
    /// Sell shares back at the current price
    Sell(TradeArgs),
}

#[derive(Args, Debug)]
pub struct UsernameArg {
    pub username: String,
}

#[derive(Args, Debug)]
pub struct MarketIdArg {
    pub market_id: i64,
}

#[derive(Args, Debug)]
pub struct UserCreateArgs {
    pub username: String,

    /// Shown name; defaults to the username
    #[arg(long)]
    pub display_name: Option<String>,

    #[arg(long, default_value = "")]
    pub emoji: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Profile link (repeatable, at most four)
    #[arg(long = "link")]
    pub links: Vec<String>,
}

#[derive(Args, Debug)]
pub struct MarketCreateArgs {
    /// Creator
    #[arg(long = "as", value_name = "USER")]
    pub user: String,

    #[arg(long)]
    pub title: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Resolution deadline (RFC 3339)
    #[arg(long, conflicts_with = "hours")]
    pub resolves_at: Option<DateTime<Utc>>,

    /// Resolution deadline as hours from now
    #[arg(long)]
    pub hours: Option<f64>,

    #[arg(long, default_value = "")]
    pub yes_label: String,

    #[arg(long, default_value = "")]
    pub no_label: String,
}

#[derive(Args, Debug)]
pub struct PageArgs {
    #[arg(long)]
    pub limit: Option<usize>,

    #[arg(long)]
    pub offset: Option<usize>,
}

#[derive(Args, Debug)]
pub struct MarketListArgs {
    /// active, closed, resolved or all
    #[arg(long, default_value = "all")]
    pub status: String,

    /// Only markets created by this user
    #[arg(long)]
    pub creator: Option<String>,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Args, Debug)]
pub struct MarketSearchArgs {
    pub query: String,

    /// active, closed, resolved or all
    #[arg(long, default_value = "all")]
    pub status: String,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Args, Debug)]
pub struct MarketResolveArgs {
    pub market_id: i64,

    /// YES, NO or N/A
    pub outcome: String,

    /// Creator
    #[arg(long = "as", value_name = "USER")]
    pub user: String,
}

#[derive(Args, Debug)]
pub struct MarketLeaderboardArgs {
    pub market_id: i64,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Args, Debug)]
pub struct MarketLabelsArgs {
    pub market_id: i64,

    #[arg(long = "as", value_name = "USER")]
    pub user: String,

    #[arg(long, default_value = "")]
    pub yes: String,

    #[arg(long, default_value = "")]
    pub no: String,
}

#[derive(Args, Debug)]
pub struct MarketActorArgs {
    pub market_id: i64,

    #[arg(long = "as", value_name = "USER")]
    pub user: String,
}

#[derive(Args, Debug)]
pub struct TradeArgs {
    pub market_id: i64,

    /// Units to stake or shares to sell
    pub amount: i64,

    /// YES or NO
    pub outcome: String,

    #[arg(long = "as", value_name = "USER")]
    pub user: String,
}

#[derive(Args, Debug)]
pub struct ProjectArgs {
    pub market_id: i64,

    pub amount: i64,

    /// YES or NO
    pub outcome: String,
}
