//! SQLite store implementation.
//!
//! Every mutating method runs in one `BEGIN IMMEDIATE` transaction, which
//! takes SQLite's write lock up front. Bets, resolutions and wallet
//! mutations are therefore serialized across connections, and a plan
//! closure always sees the bet log that its writes will extend.

use chrono::{DateTime, SecondsFormat, Utc};
use diesel::dsl::max;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::sqlite::Sqlite;

use crate::adapter::outbound::sqlite::database::connection::{create_pool, run_migrations, DbPool};
use crate::adapter::outbound::sqlite::database::model::{
    BetRow, LedgerRow, MarketRow, NewBetRow, NewLedgerRow, NewMarketRow, UserRow,
};
use crate::adapter::outbound::sqlite::database::schema::{bets, ledger, markets, users};
use crate::domain::{
    BalanceMutation, Bet, BetId, LedgerEntry, Market, MarketId, MarketLabels, MarketStatus,
    NewMarket, NewUser, Profile, Resolution, SeedParameters, StatusFilter, User, Username,
};
use crate::error::{Error, MarketError, Result, WalletError};
use crate::port::inbound::CancelToken;
use crate::port::outbound::{
    BetPlan, BetReceipt, BetStore, MarketQuery, MarketStore, SearchQuery, Settlement,
    SettlementReceipt, UserStore,
};

const ACTIVE: &str = "active";
const RESOLVED: &str = "resolved";

type Conn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// SQLite-backed store for users, markets, bets and the ledger.
pub struct SqliteStore {
    /// Database connection pool.
    pool: DbPool,
}

impl SqliteStore {
    /// Create a store over an existing, migrated pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Open a database file, applying pending migrations.
    pub fn open(database_url: &str) -> Result<Self> {
        let pool = create_pool(database_url)?;
        run_migrations(&pool)?;
        Ok(Self::new(pool))
    }

    fn conn(&self) -> Result<Conn> {
        self.pool.get().map_err(|e| Error::Connection(e.to_string()))
    }
}

/// Fixed-width UTC timestamps, so text order equals time order.
fn to_db_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn from_db_time(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Parse(e.to_string()))
}

fn to_db_id(id: u64) -> Result<i64> {
    i64::try_from(id).map_err(|e| Error::Parse(e.to_string()))
}

fn from_db_id(id: i64) -> Result<u64> {
    u64::try_from(id).map_err(|e| Error::Parse(e.to_string()))
}

fn to_db_count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn user_from_row(row: UserRow) -> Result<User> {
    let links: Vec<String> = serde_json::from_str(&row.links)?;
    Ok(User {
        username: Username::new(row.username),
        profile: Profile {
            display_name: row.display_name,
            emoji: row.emoji,
            description: row.description,
            links,
        },
        balance: row.balance,
        created_at: from_db_time(&row.created_at)?,
    })
}

fn market_from_row(row: MarketRow) -> Result<Market> {
    let resolution = row
        .resolution
        .as_deref()
        .map(str::parse::<Resolution>)
        .transpose()
        .map_err(|e| Error::Parse(e.to_string()))?;
    Ok(Market {
        id: MarketId::new(from_db_id(row.id)?),
        creator: Username::new(row.creator),
        question_title: row.question_title,
        description: row.description,
        outcome_type: row.outcome_type.parse().map_err(Error::Parse)?,
        resolution_at: from_db_time(&row.resolution_at)?,
        final_resolution_at: row.final_resolution_at.as_deref().map(from_db_time).transpose()?,
        resolution,
        labels: MarketLabels {
            yes: row.yes_label,
            no: row.no_label,
        },
        seeds: SeedParameters {
            initial_probability: row.initial_probability,
            initial_yes: row.initial_yes,
            initial_no: row.initial_no,
        },
        created_at: from_db_time(&row.created_at)?,
    })
}

fn bet_from_row(row: BetRow) -> Result<Bet> {
    Ok(Bet {
        id: BetId::new(from_db_id(row.id)?),
        market_id: MarketId::new(from_db_id(row.market_id)?),
        username: Username::new(row.username),
        amount: row.amount,
        outcome: row.outcome.parse().map_err(|e| Error::Parse(format!("{e}")))?,
        placed_at: from_db_time(&row.placed_at)?,
    })
}

fn entry_from_row(row: LedgerRow) -> Result<LedgerEntry> {
    Ok(LedgerEntry {
        id: from_db_id(row.id)?,
        username: Username::new(row.username),
        amount: row.amount,
        kind: row.kind.parse().map_err(Error::Parse)?,
        balance: row.balance,
        created_at: from_db_time(&row.created_at)?,
    })
}

fn find_market(conn: &mut SqliteConnection, id: MarketId) -> Result<Option<Market>> {
    markets::table
        .find(to_db_id(id.value())?)
        .select(MarketRow::as_select())
        .first(conn)
        .optional()?
        .map(market_from_row)
        .transpose()
}

fn require_market(conn: &mut SqliteConnection, id: MarketId) -> Result<Market> {
    find_market(conn, id)?.ok_or_else(|| MarketError::MarketNotFound { id }.into())
}

fn load_bets(conn: &mut SqliteConnection, id: MarketId) -> Result<Vec<Bet>> {
    bets::table
        .filter(bets::market_id.eq(to_db_id(id.value())?))
        .order((bets::placed_at.asc(), bets::id.asc()))
        .select(BetRow::as_select())
        .load(conn)?
        .into_iter()
        .map(bet_from_row)
        .collect()
}

/// Read the balance, check the floor, write the balance, append the entry.
fn apply(conn: &mut SqliteConnection, mutation: &BalanceMutation) -> Result<LedgerEntry> {
    let username = mutation.username().as_str();
    let current: i64 = users::table
        .find(username)
        .select(users::balance)
        .first(conn)
        .optional()?
        .ok_or_else(|| WalletError::AccountNotFound {
            username: mutation.username().clone(),
        })?;
    let next = mutation
        .resulting_balance(current)
        .ok_or_else(|| WalletError::insufficient_for(mutation, current))?;

    diesel::update(users::table.find(username))
        .set(users::balance.eq(next))
        .execute(conn)?;
    diesel::insert_into(ledger::table)
        .values(NewLedgerRow {
            username: username.to_string(),
            amount: mutation.amount(),
            kind: mutation.kind().as_str().to_string(),
            balance: next,
            created_at: to_db_time(mutation.at()),
        })
        .execute(conn)?;
    let id: Option<i64> = ledger::table.select(max(ledger::id)).first(conn)?;
    let id = id.ok_or_else(|| Error::Database("ledger insert produced no id".into()))?;
    Ok(mutation.to_entry(from_db_id(id)?, next))
}

fn with_status(
    query: markets::BoxedQuery<'static, Sqlite>,
    status: StatusFilter,
    now: DateTime<Utc>,
) -> markets::BoxedQuery<'static, Sqlite> {
    let now = to_db_time(now);
    match status {
        StatusFilter::All => query,
        StatusFilter::Only(MarketStatus::Active) => query
            .filter(markets::status.eq(ACTIVE))
            .filter(markets::resolution_at.gt(now)),
        StatusFilter::Only(MarketStatus::Closed) => query
            .filter(markets::status.eq(ACTIVE))
            .filter(markets::resolution_at.le(now)),
        StatusFilter::Only(MarketStatus::Resolved) => query.filter(markets::status.eq(RESOLVED)),
    }
}

/// `%text%` with LIKE wildcards in `text` escaped by `\`.
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn load_page(
    conn: &mut SqliteConnection,
    query: markets::BoxedQuery<'static, Sqlite>,
    limit: usize,
    offset: usize,
) -> Result<Vec<Market>> {
    query
        .order((markets::created_at.desc(), markets::id.desc()))
        .limit(to_db_count(limit))
        .offset(to_db_count(offset))
        .select(MarketRow::as_select())
        .load(conn)?
        .into_iter()
        .map(market_from_row)
        .collect()
}

impl UserStore for SqliteStore {
    async fn insert_user(&self, user: NewUser, cancel: &CancelToken) -> Result<User> {
        let row = UserRow {
            username: user.username.to_string(),
            display_name: user.profile.display_name.clone(),
            emoji: user.profile.emoji.clone(),
            description: user.profile.description.clone(),
            links: serde_json::to_string(&user.profile.links)?,
            balance: user.initial_balance,
            created_at: to_db_time(user.created_at),
        };
        let mut conn = self.conn()?;
        conn.immediate_transaction(|conn| {
            let taken: i64 = users::table
                .filter(users::username.eq(&row.username))
                .count()
                .get_result(conn)?;
            if taken > 0 {
                return Err(MarketError::UsernameTaken {
                    username: row.username.clone(),
                }
                .into());
            }
            diesel::insert_into(users::table).values(&row).execute(conn)?;
            cancel.check()
        })?;

        Ok(User {
            username: user.username,
            profile: user.profile,
            balance: user.initial_balance,
            created_at: user.created_at,
        })
    }

    async fn user(&self, username: &Username) -> Result<Option<User>> {
        let mut conn = self.conn()?;
        users::table
            .find(username.as_str())
            .select(UserRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(user_from_row)
            .transpose()
    }

    async fn apply_mutation(
        &self,
        mutation: BalanceMutation,
        cancel: &CancelToken,
    ) -> Result<LedgerEntry> {
        let mut conn = self.conn()?;
        conn.immediate_transaction(|conn| {
            let entry = apply(conn, &mutation)?;
            cancel.check()?;
            Ok(entry)
        })
    }

    async fn ledger(&self, username: &Username) -> Result<Vec<LedgerEntry>> {
        let mut conn = self.conn()?;
        ledger::table
            .filter(ledger::username.eq(username.as_str()))
            .order(ledger::id.asc())
            .select(LedgerRow::as_select())
            .load(&mut conn)?
            .into_iter()
            .map(entry_from_row)
            .collect()
    }
}

impl MarketStore for SqliteStore {
    async fn insert_market(
        &self,
        market: NewMarket,
        fee: Option<BalanceMutation>,
        cancel: &CancelToken,
    ) -> Result<(Market, Option<LedgerEntry>)> {
        let row = NewMarketRow {
            creator: market.creator.to_string(),
            question_title: market.question_title.clone(),
            description: market.description.clone(),
            outcome_type: market.outcome_type.as_str().to_string(),
            resolution_at: to_db_time(market.resolution_at),
            status: ACTIVE.to_string(),
            yes_label: market.labels.yes.clone(),
            no_label: market.labels.no.clone(),
            initial_probability: market.seeds.initial_probability,
            initial_yes: market.seeds.initial_yes,
            initial_no: market.seeds.initial_no,
            created_at: to_db_time(market.created_at),
        };
        let mut conn = self.conn()?;
        let (id, entry) = conn.immediate_transaction(|conn| {
            let entry = fee.as_ref().map(|m| apply(conn, m)).transpose()?;
            diesel::insert_into(markets::table).values(&row).execute(conn)?;
            let id: Option<i64> = markets::table.select(max(markets::id)).first(conn)?;
            let id = id.ok_or_else(|| Error::Database("market insert produced no id".into()))?;
            cancel.check()?;
            Ok::<_, Error>((from_db_id(id)?, entry))
        })?;
        Ok((market.into_market(MarketId::new(id)), entry))
    }

    async fn market(&self, id: MarketId) -> Result<Option<Market>> {
        let mut conn = self.conn()?;
        find_market(&mut conn, id)
    }

    async fn update_labels(
        &self,
        id: MarketId,
        labels: MarketLabels,
        cancel: &CancelToken,
    ) -> Result<bool> {
        let mut conn = self.conn()?;
        conn.immediate_transaction(|conn| {
            let updated = diesel::update(markets::table.find(to_db_id(id.value())?))
                .set((
                    markets::yes_label.eq(&labels.yes),
                    markets::no_label.eq(&labels.no),
                ))
                .execute(conn)?;
            cancel.check()?;
            Ok(updated > 0)
        })
    }

    async fn list_markets(&self, query: &MarketQuery) -> Result<Vec<Market>> {
        let mut boxed = with_status(markets::table.into_boxed(), query.status, query.now);
        if let Some(creator) = &query.created_by {
            boxed = boxed.filter(markets::creator.eq(creator.to_string()));
        }
        let mut conn = self.conn()?;
        load_page(&mut conn, boxed, query.limit, query.offset)
    }

    async fn search_markets(&self, query: &SearchQuery) -> Result<Vec<Market>> {
        let pattern = like_pattern(&query.text);
        let boxed = with_status(markets::table.into_boxed(), query.status, query.now).filter(
            markets::question_title
                .like(pattern.clone())
                .escape('\\')
                .or(markets::description.like(pattern).escape('\\')),
        );
        let mut conn = self.conn()?;
        load_page(&mut conn, boxed, query.limit, query.offset)
    }

    async fn delete_market(&self, id: MarketId, cancel: &CancelToken) -> Result<bool> {
        let db_id = to_db_id(id.value())?;
        let mut conn = self.conn()?;
        conn.immediate_transaction(|conn| {
            if find_market(conn, id)?.is_none() {
                return Ok(false);
            }
            let bet_count: i64 = bets::table
                .filter(bets::market_id.eq(db_id))
                .count()
                .get_result(conn)?;
            if bet_count > 0 {
                return Err(MarketError::MarketHasBets { id }.into());
            }
            diesel::delete(markets::table.find(db_id)).execute(conn)?;
            cancel.check()?;
            Ok(true)
        })
    }

    async fn settle_market<F>(
        &self,
        id: MarketId,
        cancel: &CancelToken,
        plan: F,
    ) -> Result<SettlementReceipt>
    where
        F: FnOnce(&Market, &[Bet]) -> Result<Settlement> + Send,
    {
        let mut conn = self.conn()?;
        conn.immediate_transaction(|conn| {
            let mut market = require_market(conn, id)?;
            let bets = load_bets(conn, id)?;
            let settlement = plan(&market, &bets)?;

            let entries = settlement
                .credits
                .iter()
                .map(|credit| apply(conn, credit))
                .collect::<Result<Vec<_>>>()?;
            diesel::update(markets::table.find(to_db_id(id.value())?))
                .set((
                    markets::status.eq(RESOLVED),
                    markets::resolution.eq(Some(settlement.resolution.as_str())),
                    markets::final_resolution_at.eq(Some(to_db_time(settlement.resolved_at))),
                ))
                .execute(conn)?;
            cancel.check()?;

            market.resolution = Some(settlement.resolution);
            market.final_resolution_at = Some(settlement.resolved_at);
            Ok(SettlementReceipt { market, entries })
        })
    }
}

impl BetStore for SqliteStore {
    async fn bets(&self, market_id: MarketId) -> Result<Vec<Bet>> {
        let mut conn = self.conn()?;
        load_bets(&mut conn, market_id)
    }

    async fn append_bet<F>(
        &self,
        market_id: MarketId,
        cancel: &CancelToken,
        plan: F,
    ) -> Result<BetReceipt>
    where
        F: FnOnce(&Market, &[Bet]) -> Result<BetPlan> + Send,
    {
        let mut conn = self.conn()?;
        conn.immediate_transaction(|conn| {
            let market = require_market(conn, market_id)?;
            let bets = load_bets(conn, market_id)?;
            let BetPlan { bet, mutation } = plan(&market, &bets)?;

            let entry = mutation.as_ref().map(|m| apply(conn, m)).transpose()?;
            diesel::insert_into(bets::table)
                .values(NewBetRow {
                    market_id: to_db_id(bet.market_id.value())?,
                    username: bet.username.to_string(),
                    amount: bet.amount,
                    outcome: bet.outcome.as_str().to_string(),
                    placed_at: to_db_time(bet.placed_at),
                })
                .execute(conn)?;
            let id: Option<i64> = bets::table.select(max(bets::id)).first(conn)?;
            let id = id.ok_or_else(|| Error::Database("bet insert produced no id".into()))?;
            cancel.check()?;

            Ok(BetReceipt {
                bet: bet.into_bet(BetId::new(from_db_id(id)?)),
                entry,
            })
        })
    }
}
