use thiserror::Error;

use crate::domain::{Amount, BalanceMutation, EntryKind, MarketId, Username};

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Wallet and ledger errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("account not found: {username}")]
    AccountNotFound { username: Username },

    #[error("amount must be positive, got {amount}")]
    InvalidAmount { amount: Amount },

    #[error("{kind} is not valid for this transaction")]
    InvalidTransaction { kind: EntryKind },

    #[error("insufficient balance for {username}: balance {balance}, amount {amount}, max debt {max_debt}")]
    InsufficientBalance {
        username: Username,
        balance: Amount,
        amount: Amount,
        max_debt: Amount,
    },
}

/// Market lifecycle, validation and trading errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    #[error("question title must be 1-160 characters, got {len}")]
    InvalidQuestionLength { len: usize },

    #[error("description must be at most 2000 characters, got {len}")]
    InvalidDescriptionLength { len: usize },

    #[error("invalid label: {reason}")]
    InvalidLabel { reason: String },

    #[error("resolution time must be more than {min_hours} hours in the future")]
    InvalidResolutionTime { min_hours: String },

    #[error("user not found: {username}")]
    UserNotFound { username: Username },

    #[error("market not found: {id}")]
    MarketNotFound { id: MarketId },

    #[error("invalid outcome '{input}'")]
    InvalidOutcome { input: String },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("bet of {amount} is below the minimum of {minimum}")]
    BetBelowMinimum { amount: Amount, minimum: Amount },

    #[error("market {id} is closed for trading")]
    MarketClosed { id: MarketId },

    #[error("market {id} is already resolved")]
    AlreadyResolved { id: MarketId },

    #[error("only the market creator may do this")]
    NotCreator { id: MarketId, caller: Username },

    #[error("cannot sell {requested} shares, only {held} held")]
    InsufficientShares { requested: Amount, held: Amount },

    #[error("sale dust {dust} exceeds the cap of {cap}")]
    DustCapExceeded { dust: String, cap: String },

    #[error("sale proceeds {proceeds} do not cover the fee of {fee}")]
    SaleBelowFee { proceeds: Amount, fee: Amount },

    #[error("market {id} already has bets")]
    MarketHasBets { id: MarketId },

    #[error("username '{username}' is already taken")]
    UsernameTaken { username: String },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Market(#[from] MarketError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("parse error: {0}")]
    Parse(String),

    /// The caller withdrew the request before commit. Nothing was written.
    #[error("operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        Error::Database(err.to_string())
    }
}

/// Error category as seen by a request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed request shape.
    InvalidInput,
    /// Operation incompatible with the current lifecycle state.
    InvalidState,
    /// Caller is not the required principal.
    Unauthorized,
    /// Entity absent.
    NotFound,
    /// Wallet would breach the debt floor.
    InsufficientBalance,
    /// Legal request that violates an economic constraint.
    BusinessRule,
    /// Storage or infrastructure failure.
    Internal,
}

impl ErrorKind {
    /// HTTP status code a request boundary maps this kind to.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::InvalidInput => 400,
            Self::InsufficientBalance => 402,
            Self::Unauthorized => 403,
            Self::NotFound => 404,
            Self::InvalidState => 409,
            Self::BusinessRule => 422,
            Self::Internal => 500,
        }
    }

    /// The single short message shown to end users.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidInput => "Invalid request.",
            Self::InvalidState => "This action is not allowed in the market's current state.",
            Self::Unauthorized => "You are not allowed to do this.",
            Self::NotFound => "Not found.",
            Self::InsufficientBalance => "Insufficient balance.",
            Self::BusinessRule => "This action violates a market rule.",
            Self::Internal => "Internal error.",
        }
    }
}

impl WalletError {
    /// Rejection of `mutation` against the current `balance`.
    #[must_use]
    pub fn insufficient_for(mutation: &BalanceMutation, balance: Amount) -> Self {
        Self::InsufficientBalance {
            username: mutation.username().clone(),
            balance,
            amount: -mutation.amount(),
            max_debt: -mutation.floor().unwrap_or(0),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AccountNotFound { .. } => ErrorKind::NotFound,
            Self::InvalidAmount { .. } | Self::InvalidTransaction { .. } => ErrorKind::InvalidInput,
            Self::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
        }
    }
}

impl MarketError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidQuestionLength { .. }
            | Self::InvalidDescriptionLength { .. }
            | Self::InvalidLabel { .. }
            | Self::InvalidResolutionTime { .. }
            | Self::InvalidOutcome { .. }
            | Self::InvalidInput { .. }
            | Self::BetBelowMinimum { .. }
            | Self::UsernameTaken { .. } => ErrorKind::InvalidInput,
            Self::UserNotFound { .. } | Self::MarketNotFound { .. } => ErrorKind::NotFound,
            Self::MarketClosed { .. } | Self::AlreadyResolved { .. } | Self::MarketHasBets { .. } => {
                ErrorKind::InvalidState
            }
            Self::NotCreator { .. } => ErrorKind::Unauthorized,
            Self::InsufficientShares { .. }
            | Self::DustCapExceeded { .. }
            | Self::SaleBelowFee { .. } => ErrorKind::BusinessRule,
        }
    }
}

impl Error {
    /// Classify this error into the request-boundary taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Wallet(e) => e.kind(),
            Self::Market(e) => e.kind(),
            Self::Config(_)
            | Self::Json(_)
            | Self::Io(_)
            | Self::Connection(_)
            | Self::Database(_)
            | Self::Parse(_) => ErrorKind::Internal,
            // The request conflicts with its own withdrawal rather than
            // failing on the server, so it is a 409 and not a 500.
            Self::Cancelled => ErrorKind::InvalidState,
        }
    }

    /// Short English message safe to show end users.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => ErrorKind::Internal.message().to_string(),
            _ => self.to_string(),
        }
    }

    /// True for storage or infrastructure failures.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self.kind(), ErrorKind::Internal)
    }
}
