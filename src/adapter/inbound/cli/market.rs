//! Handlers for the `market` command group.

use serde_json::json;
use tabled::Tabled;

use crate::adapter::inbound::cli::command::{
    MarketCommand, MarketCreateArgs, MarketLabelsArgs, MarketLeaderboardArgs, MarketListArgs,
    MarketResolveArgs, MarketSearchArgs, PageArgs,
};
use crate::adapter::inbound::cli::output;
use crate::adapter::inbound::cli::user::username;
use crate::application::market::validation::{deadline_after_hours, parse_market_id};
use crate::application::market::{CreateMarketRequest, MarketList, SearchRequest};
use crate::domain::{Market, MarketId, OutcomeType, Page, UserPosition};
use crate::error::{MarketError, Result};
use crate::infrastructure::bootstrap::Services;
use crate::port::inbound::CancelToken;
use crate::port::outbound::Store;

#[derive(Tabled)]
struct MarketRow {
    #[tabled(rename = "ID")]
    id: MarketId,
    #[tabled(rename = "Question")]
    title: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Resolves")]
    resolves: String,
    #[tabled(rename = "Creator")]
    creator: String,
}

#[derive(Tabled)]
struct PositionRow {
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Side")]
    side: &'static str,
    #[tabled(rename = "YES")]
    yes: i64,
    #[tabled(rename = "NO")]
    no: i64,
    #[tabled(rename = "Spent")]
    spent: i64,
    #[tabled(rename = "Sold")]
    sold: i64,
    #[tabled(rename = "Value")]
    value: i64,
    #[tabled(rename = "Profit")]
    profit: String,
}

impl From<&UserPosition> for PositionRow {
    fn from(p: &UserPosition) -> Self {
        Self {
            user: p.username.to_string(),
            side: p.position_label(),
            yes: p.yes_shares,
            no: p.no_shares,
            spent: p.total_spent,
            sold: p.sales_received,
            value: p.current_value,
            profit: output::signed(p.profit),
        }
    }
}

fn market_rows<S: Store>(services: &Services<S>, markets: &[Market]) -> Vec<MarketRow> {
    markets
        .iter()
        .map(|m| MarketRow {
            id: m.id,
            title: m.question_title.clone(),
            status: services.markets.status_of(m).to_string(),
            resolves: m.resolution_at.format("%Y-%m-%d %H:%M").to_string(),
            creator: m.creator.to_string(),
        })
        .collect()
}

fn page(args: &PageArgs) -> Page {
    Page::new(args.limit, args.offset)
}

pub async fn execute<S: Store + 'static>(
    services: &Services<S>,
    command: MarketCommand,
    cancel: &CancelToken,
) -> Result<()> {
    match command {
        MarketCommand::Create(args) => create(services, args, cancel).await,
        MarketCommand::Show(args) => show(services, args.market_id).await,
        MarketCommand::List(args) => list(services, args).await,
        MarketCommand::Search(args) => search(services, args).await,
        MarketCommand::Resolve(args) => resolve(services, args, cancel).await,
        MarketCommand::Leaderboard(args) => leaderboard(services, args).await,
        MarketCommand::Positions(args) => positions(services, args.market_id).await,
        MarketCommand::Bets(args) => bets(services, args.market_id).await,
        MarketCommand::Labels(args) => labels(services, args, cancel).await,
        MarketCommand::Delete(args) => {
            let id = parse_market_id(args.market_id)?;
            let caller = username(&args.user)?;
            services.markets.delete_market(id, &caller, cancel).await?;
            if output::is_json() {
                output::json_result("market.delete", json!({ "id": id, "deleted": true }));
            } else {
                output::success(&format!("Deleted market {id}"));
            }
            Ok(())
        }
    }
}

async fn create<S: Store + 'static>(
    services: &Services<S>,
    args: MarketCreateArgs,
    cancel: &CancelToken,
) -> Result<()> {
    let creator = username(&args.user)?;
    let resolution_at = match (args.resolves_at, args.hours) {
        (Some(at), _) => at,
        (None, Some(hours)) => deadline_after_hours(services.markets.now(), hours)?,
        _ => {
            return Err(MarketError::InvalidInput {
                reason: "either --resolves-at or --hours is required".into(),
            }
            .into());
        }
    };

    let market = services
        .markets
        .create_market(
            CreateMarketRequest {
                question_title: args.title,
                description: args.description,
                outcome_type: OutcomeType::Binary,
                resolution_at,
                yes_label: args.yes_label,
                no_label: args.no_label,
            },
            &creator,
            cancel,
        )
        .await?;

    if output::is_json() {
        output::json_result("market.create", &market);
        return Ok(());
    }
    output::success(&format!("Created market {}", output::highlight(market.id)));
    output::field("Question", &market.question_title);
    output::field("Resolves", market.resolution_at.to_rfc3339());
    output::field("Labels", format!("{} / {}", market.labels.yes, market.labels.no));
    Ok(())
}

async fn show<S: Store + 'static>(services: &Services<S>, raw_id: i64) -> Result<()> {
    let details = services.markets.market_details(parse_market_id(raw_id)?).await?;

    if output::is_json() {
        output::json_result("market.show", &details);
        return Ok(());
    }
    output::section(&format!("Market {}", details.id));
    output::field("Question", &details.question_title);
    if !details.description.is_empty() {
        output::field("Description", &details.description);
    }
    output::field("Status", details.status);
    if let Some(resolution) = &details.resolution {
        output::field("Resolution", resolution);
    }
    output::field("Resolves", details.resolution_at.to_rfc3339());
    output::field("Creator", &details.creator.username);
    output::field(
        "Probability",
        format!(
            "{} {}",
            output::percent(details.last_probability),
            details.yes_label
        ),
    );
    output::field("Volume", details.total_volume);
    output::field("Traders", details.num_traders);
    output::field("Dust", details.market_dust.normalize());
    output::field("Residual", details.share_residual);
    Ok(())
}

async fn list<S: Store + 'static>(services: &Services<S>, args: MarketListArgs) -> Result<()> {
    let created_by = args.creator.as_deref().map(username).transpose()?;
    let markets = services
        .markets
        .list_markets(MarketList {
            status: args.status.clone(),
            created_by,
            limit: args.page.limit,
            offset: args.page.offset,
        })
        .await?;

    if output::is_json() {
        output::json_result("market.list", json!({ "status": args.status, "markets": markets }));
        return Ok(());
    }
    output::table(market_rows(services, &markets), "no markets");
    Ok(())
}

async fn search<S: Store + 'static>(services: &Services<S>, args: MarketSearchArgs) -> Result<()> {
    let results = services
        .markets
        .search_markets(SearchRequest {
            query: args.query,
            status: args.status,
            limit: args.page.limit.unwrap_or(0),
            offset: args.page.offset.unwrap_or(0),
        })
        .await?;

    if output::is_json() {
        output::json_result("market.search", &results);
        return Ok(());
    }
    output::section(&format!("Results for \"{}\"", results.query));
    output::table(market_rows(services, &results.primary), "no matches");
    if results.fallback_used && !results.fallback.is_empty() {
        output::section("Other statuses");
        output::table(market_rows(services, &results.fallback), "no matches");
    }
    Ok(())
}

async fn resolve<S: Store + 'static>(
    services: &Services<S>,
    args: MarketResolveArgs,
    cancel: &CancelToken,
) -> Result<()> {
    let id = parse_market_id(args.market_id)?;
    let caller = username(&args.user)?;
    let report = services
        .markets
        .resolve_market(id, &args.outcome, &caller, cancel)
        .await?;

    if output::is_json() {
        output::json_result(
            "market.resolve",
            json!({
                "id": id,
                "resolution": report.resolution,
                "volume": report.volume,
                "total_credited": report.total_credited(),
                "credits": report.credits,
            }),
        );
        return Ok(());
    }
    output::success(&format!("Resolved market {id} as {}", report.resolution));
    output::field("Volume", report.volume);
    output::field("Paid out", report.total_credited());
    for entry in &report.credits {
        output::field(entry.username.as_str(), output::signed(entry.amount));
    }
    Ok(())
}

async fn leaderboard<S: Store + 'static>(
    services: &Services<S>,
    args: MarketLeaderboardArgs,
) -> Result<()> {
    let id = parse_market_id(args.market_id)?;
    let entries = services.markets.market_leaderboard(id, page(&args.page)).await?;

    if output::is_json() {
        output::json_result("market.leaderboard", json!({ "id": id, "entries": entries }));
        return Ok(());
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Rank")]
        rank: usize,
        #[tabled(rename = "User")]
        user: String,
        #[tabled(rename = "Side")]
        side: String,
        #[tabled(rename = "Value")]
        value: i64,
        #[tabled(rename = "Profit")]
        profit: String,
    }

    output::section(&format!("Leaderboard of market {id}"));
    output::table(
        entries
            .iter()
            .map(|e| Row {
                rank: e.rank,
                user: e.username.to_string(),
                side: e.position.clone(),
                value: e.current_value,
                profit: output::signed(e.profit),
            })
            .collect(),
        "no traders yet",
    );
    Ok(())
}

async fn positions<S: Store + 'static>(services: &Services<S>, raw_id: i64) -> Result<()> {
    let id = parse_market_id(raw_id)?;
    let positions = services.markets.market_positions(id).await?;

    if output::is_json() {
        output::json_result("market.positions", json!({ "id": id, "positions": positions }));
        return Ok(());
    }
    output::section(&format!("Positions in market {id}"));
    output::table(positions.iter().map(PositionRow::from).collect(), "no traders yet");
    Ok(())
}

async fn bets<S: Store + 'static>(services: &Services<S>, raw_id: i64) -> Result<()> {
    let id = parse_market_id(raw_id)?;
    let bets = services.markets.market_bets(id).await?;

    if output::is_json() {
        output::json_result("market.bets", json!({ "id": id, "bets": bets }));
        return Ok(());
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "#")]
        id: u64,
        #[tabled(rename = "User")]
        user: String,
        #[tabled(rename = "Side")]
        side: &'static str,
        #[tabled(rename = "Amount")]
        amount: String,
        #[tabled(rename = "After")]
        probability: String,
        #[tabled(rename = "At")]
        at: String,
    }

    output::section(&format!("Bets in market {id}"));
    output::table(
        bets.iter()
            .map(|v| Row {
                id: v.bet.id.value(),
                user: v.bet.username.to_string(),
                side: v.bet.outcome.as_str(),
                amount: output::signed(v.bet.amount),
                probability: output::percent(v.probability),
                at: v.bet.placed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            })
            .collect(),
        "no bets yet",
    );
    Ok(())
}

async fn labels<S: Store + 'static>(
    services: &Services<S>,
    args: MarketLabelsArgs,
    cancel: &CancelToken,
) -> Result<()> {
    let id = parse_market_id(args.market_id)?;
    let caller = username(&args.user)?;
    let market = services
        .markets
        .update_labels(id, &caller, &args.yes, &args.no, cancel)
        .await?;

    if output::is_json() {
        output::json_result("market.labels", &market);
        return Ok(());
    }
    output::success(&format!(
        "Labels of market {id} are now {} / {}",
        market.labels.yes, market.labels.no
    ));
    Ok(())
}
