//! Runtime wiring: a store, the system clock and the services over them.

use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::memory::MemoryStore;
use crate::adapter::outbound::sqlite::SqliteStore;
use crate::application::{Economics, MarketService, ProfileService, WalletService};
use crate::error::Result;
use crate::infrastructure::config::{Config, DatabaseTarget};
use crate::port::inbound::{ProfileDirectory, Wallet};
use crate::port::outbound::{Clock, Store, SystemClock};

/// Services sharing one store and one clock.
pub struct Services<S> {
    pub store: Arc<S>,
    pub wallet: Arc<WalletService<S>>,
    pub profiles: Arc<ProfileService<S>>,
    pub markets: MarketService<S>,
}

/// Wire the services over `store`.
pub fn build_services<S: Store + 'static>(
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    economics: Economics,
) -> Services<S> {
    let wallet = Arc::new(WalletService::new(Arc::clone(&store), Arc::clone(&clock)));
    let profiles = Arc::new(ProfileService::new(
        Arc::clone(&store),
        Arc::clone(&clock),
        economics.initial_account_balance,
    ));
    let markets = MarketService::new(
        Arc::clone(&store),
        Arc::clone(&wallet) as Arc<dyn Wallet>,
        Arc::clone(&profiles) as Arc<dyn ProfileDirectory>,
        clock,
        economics,
    );
    Services {
        store,
        wallet,
        profiles,
        markets,
    }
}

/// Services over either backend named by the configuration.
pub enum Runtime {
    Memory(Services<MemoryStore>),
    Sqlite(Services<SqliteStore>),
}

impl Runtime {
    /// Open the configured store and wire it to the system clock.
    pub fn from_config(config: &Config) -> Result<Self> {
        let economics = config.economics()?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        match config.database_target() {
            DatabaseTarget::Memory => {
                info!("Using in-memory store");
                let store = Arc::new(MemoryStore::new());
                Ok(Self::Memory(build_services(store, clock, economics)))
            }
            DatabaseTarget::Sqlite(path) => {
                let store = Arc::new(SqliteStore::open(&path)?);
                info!(database = %path, "SQLite store opened");
                Ok(Self::Sqlite(build_services(store, clock, economics)))
            }
        }
    }
}
