//! Handlers for `bet` and `project`.

use serde_json::json;

use crate::adapter::inbound::cli::command::{BetCommand, ProjectArgs, TradeArgs};
use crate::adapter::inbound::cli::output;
use crate::adapter::inbound::cli::user::username;
use crate::application::market::validation::parse_market_id;
use crate::application::market::ProjectionRequest;
use crate::error::Result;
use crate::infrastructure::bootstrap::Services;
use crate::port::inbound::CancelToken;
use crate::port::outbound::Store;

pub async fn execute<S: Store + 'static>(
    services: &Services<S>,
    command: BetCommand,
    cancel: &CancelToken,
) -> Result<()> {
    match command {
        BetCommand::Place(args) => place(services, args, cancel).await,
        BetCommand::Sell(args) => sell(services, args, cancel).await,
    }
}

async fn place<S: Store + 'static>(
    services: &Services<S>,
    args: TradeArgs,
    cancel: &CancelToken,
) -> Result<()> {
    let id = parse_market_id(args.market_id)?;
    let user = username(&args.user)?;
    let receipt = services
        .markets
        .place_bet(id, &user, args.amount, &args.outcome, cancel)
        .await?;
    let charged = receipt.entry.as_ref().map_or(0, |e| -e.amount);

    if output::is_json() {
        output::json_result(
            "bet.place",
            json!({ "bet": receipt.bet, "charged": charged, "ledger": receipt.entry }),
        );
        return Ok(());
    }
    output::success(&format!(
        "{} staked {} on {} in market {id}",
        user, receipt.bet.amount, receipt.bet.outcome
    ));
    output::field("Charged", charged);
    if let Some(entry) = &receipt.entry {
        output::field("Balance", entry.balance);
    }
    Ok(())
}

async fn sell<S: Store + 'static>(
    services: &Services<S>,
    args: TradeArgs,
    cancel: &CancelToken,
) -> Result<()> {
    let id = parse_market_id(args.market_id)?;
    let user = username(&args.user)?;
    let sale = services
        .markets
        .sell_position(id, &user, args.amount, &args.outcome, cancel)
        .await?;

    if output::is_json() {
        output::json_result(
            "bet.sell",
            json!({
                "bet": sale.receipt.bet,
                "exact": sale.quote.exact.normalize().to_string(),
                "proceeds": sale.quote.proceeds,
                "dust": sale.quote.dust.normalize().to_string(),
                "fee": sale.fee,
                "net_proceeds": sale.net_proceeds,
                "ledger": sale.receipt.entry,
            }),
        );
        return Ok(());
    }
    output::success(&format!(
        "{} sold {} {} shares in market {id}",
        user, args.amount, sale.receipt.bet.outcome
    ));
    output::field("Exact value", sale.quote.exact.normalize());
    output::field("Fee", sale.fee);
    output::field("Credited", sale.net_proceeds);
    output::field("Dust", sale.quote.dust.normalize());
    Ok(())
}

pub async fn project<S: Store + 'static>(services: &Services<S>, args: ProjectArgs) -> Result<()> {
    let projection = services
        .markets
        .project_probability(ProjectionRequest {
            market_id: args.market_id,
            amount: args.amount,
            outcome: args.outcome.clone(),
        })
        .await?;

    if output::is_json() {
        output::json_result(
            "project",
            json!({ "market_id": args.market_id, "projection": projection }),
        );
        return Ok(());
    }
    output::section(&format!(
        "Betting {} on {} in market {}",
        args.amount,
        args.outcome.to_uppercase(),
        args.market_id
    ));
    output::field("Current", output::percent(projection.current));
    output::field("Projected", output::percent(projection.projected));
    Ok(())
}
