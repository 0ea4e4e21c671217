//! Handlers for the `user` command group.

use serde_json::json;
use tabled::Tabled;

use crate::adapter::inbound::cli::command::{UserCommand, UserCreateArgs};
use crate::adapter::inbound::cli::output;
use crate::application::Registration;
use crate::domain::{LedgerEntry, Username};
use crate::error::{MarketError, Result};
use crate::infrastructure::bootstrap::Services;
use crate::port::inbound::{CancelToken, ProfileDirectory, Wallet};
use crate::port::outbound::Store;

#[derive(Tabled)]
struct LedgerRow {
    #[tabled(rename = "#")]
    id: u64,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Balance")]
    balance: i64,
    #[tabled(rename = "At")]
    at: String,
}

impl From<&LedgerEntry> for LedgerRow {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: entry.id,
            kind: entry.kind.to_string(),
            amount: output::signed(entry.amount),
            balance: entry.balance,
            at: entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

pub async fn execute<S: Store + 'static>(
    services: &Services<S>,
    command: UserCommand,
    cancel: &CancelToken,
) -> Result<()> {
    match command {
        UserCommand::Create(args) => create(services, args, cancel).await,
        UserCommand::Balance(args) => balance(services, &args.username).await,
        UserCommand::Ledger(args) => ledger(services, &args.username).await,
    }
}

/// Handles are case-insensitive at the prompt.
pub(crate) fn username(raw: &str) -> Result<Username> {
    Username::parse(raw).ok_or_else(|| {
        MarketError::InvalidInput {
            reason: format!("'{raw}' is not a valid username"),
        }
        .into()
    })
}

async fn create<S: Store + 'static>(
    services: &Services<S>,
    args: UserCreateArgs,
    cancel: &CancelToken,
) -> Result<()> {
    let user = services
        .profiles
        .register(
            Registration {
                username: args.username,
                display_name: args.display_name.unwrap_or_default(),
                emoji: args.emoji,
                description: args.description,
                links: args.links,
            },
            cancel,
        )
        .await?;

    if output::is_json() {
        output::json_result(
            "user.create",
            json!({ "user": user.to_public(), "balance": user.balance }),
        );
        return Ok(());
    }
    output::success(&format!("Registered {}", output::highlight(&user.username)));
    output::field("Display name", &user.profile.display_name);
    output::field("Balance", user.balance);
    Ok(())
}

async fn balance<S: Store + 'static>(services: &Services<S>, raw: &str) -> Result<()> {
    let name = username(raw)?;
    services.profiles.ensure_user_exists(&name).await?;
    let max_debt = services.markets.economics().maximum_debt_allowed;
    let balance = services.wallet.get_balance(&name).await?;
    let credit = services.wallet.get_credit(&name, max_debt).await?;

    if output::is_json() {
        output::json_result(
            "user.balance",
            json!({
                "username": name,
                "balance": balance,
                "maximum_debt_allowed": max_debt,
                "available_credit": credit,
            }),
        );
        return Ok(());
    }
    output::section(&format!("Wallet of {name}"));
    output::field("Balance", balance);
    output::field("Max debt", max_debt);
    output::field("Available", credit);
    Ok(())
}

async fn ledger<S: Store + 'static>(services: &Services<S>, raw: &str) -> Result<()> {
    let name = username(raw)?;
    services.profiles.ensure_user_exists(&name).await?;
    let entries = services.wallet.ledger(&name).await?;

    if output::is_json() {
        output::json_result("user.ledger", json!({ "username": name, "entries": entries }));
        return Ok(());
    }
    output::section(&format!("Ledger of {name}"));
    output::table(
        entries.iter().map(LedgerRow::from).collect(),
        "no ledger entries",
    );
    Ok(())
}
