use thiserror::Error as ThisError;

use super::constants::*;
use super::{Capability, MarketState};

/// Every way a ledger operation can be refused.
///
/// A rejected operation leaves the ledger exactly as it found it.
#[derive(Clone, Debug, ThisError, PartialEq, Eq)]
pub enum LedgerError {
    // Validation
    #[error("unknown market {market_id}")]
    UnknownMarket { market_id: u64 },
    #[error("market {market_id} already exists")]
    MarketExists { market_id: u64 },
    #[error("odds {value} outside [{}, {}]", MIN_ODDS, MAX_ODDS)]
    OddsOutOfBounds { value: u64 },
    #[error("odds carry {got} outcomes, expected {expected}")]
    OddsShape { expected: u8, got: usize },
    #[error("selection {selection} is not valid for this market")]
    InvalidSelection { selection: u8 },
    #[error("amount must be non-zero")]
    ZeroAmount,
    #[error("market kind declares {outcomes} outcomes, ledger allows 2..={max}")]
    InvalidMarketKind { outcomes: u8, max: u8 },
    #[error("invalid ledger config: {0}")]
    InvalidConfig(&'static str),
    #[error("stake {index} not found in market {market_id}")]
    StakeNotFound { market_id: u64, index: u32 },

    // Lifecycle
    #[error("market is {actual}, operation requires {}", join_states(.required))]
    StateMismatch {
        required: &'static [MarketState],
        actual: MarketState,
    },
    #[error("market cannot move from {from} to {to}")]
    InvalidTransition { from: MarketState, to: MarketState },
    #[error("odds have not been set")]
    OddsUnset,
    #[error("betting closed at {cutoff_ms}")]
    BettingClosed { cutoff_ms: u64 },
    #[error("ledger is paused")]
    LedgerPaused,
    #[error("ledger is not initialized")]
    NotInitialized,

    // Authorization
    #[error("caller lacks {capability:?} capability")]
    Unauthorized { capability: Capability },

    // Solvency
    #[error("liability {liability} + payout {potential} exceeds available {available}")]
    InsufficientLiquidity {
        liability: u64,
        potential: u64,
        available: u64,
    },
    #[error("requested {requested} but only {available} is free")]
    InsufficientReserve { requested: u64, available: u64 },

    // Double operation
    #[error("stake already claimed")]
    AlreadyClaimed,
    #[error("market already settled")]
    AlreadySettled,
    #[error("ledger already initialized")]
    AlreadyInitialized,
    #[error("nothing to claim")]
    NothingToClaim,

    #[error("stake did not win")]
    StakeLost,

    // Collaborators
    #[error("transfer failed: {0}")]
    TransferFailed(String),
    #[error("price unavailable: {0}")]
    PriceUnavailable(String),
    #[error("stake worth {reference} is below minimum {minimum}")]
    StakeBelowMinimum { reference: u64, minimum: u64 },

    #[error("arithmetic overflow")]
    Overflow,
}

impl LedgerError {
    /// Stable code carried by rejection events.
    pub fn code(&self) -> u8 {
        match self {
            LedgerError::UnknownMarket { .. } => ERROR_UNKNOWN_MARKET,
            LedgerError::MarketExists { .. } => ERROR_MARKET_EXISTS,
            LedgerError::OddsOutOfBounds { .. } => ERROR_ODDS_OUT_OF_BOUNDS,
            LedgerError::OddsShape { .. } => ERROR_ODDS_SHAPE,
            LedgerError::InvalidSelection { .. } => ERROR_INVALID_SELECTION,
            LedgerError::ZeroAmount => ERROR_ZERO_AMOUNT,
            LedgerError::InvalidMarketKind { .. } => ERROR_INVALID_MARKET_KIND,
            LedgerError::InvalidConfig(_) => ERROR_INVALID_CONFIG,
            LedgerError::StakeNotFound { .. } => ERROR_STAKE_NOT_FOUND,
            LedgerError::StateMismatch { .. } => ERROR_STATE_MISMATCH,
            LedgerError::InvalidTransition { .. } => ERROR_INVALID_TRANSITION,
            LedgerError::OddsUnset => ERROR_ODDS_UNSET,
            LedgerError::BettingClosed { .. } => ERROR_BETTING_CLOSED,
            LedgerError::LedgerPaused => ERROR_LEDGER_PAUSED,
            LedgerError::NotInitialized => ERROR_NOT_INITIALIZED,
            LedgerError::Unauthorized { .. } => ERROR_UNAUTHORIZED,
            LedgerError::InsufficientLiquidity { .. } => ERROR_INSUFFICIENT_LIQUIDITY,
            LedgerError::InsufficientReserve { .. } => ERROR_INSUFFICIENT_RESERVE,
            LedgerError::AlreadyClaimed => ERROR_ALREADY_CLAIMED,
            LedgerError::AlreadySettled => ERROR_ALREADY_SETTLED,
            LedgerError::AlreadyInitialized => ERROR_ALREADY_INITIALIZED,
            LedgerError::NothingToClaim => ERROR_NOTHING_TO_CLAIM,
            LedgerError::StakeLost => ERROR_STAKE_LOST,
            LedgerError::TransferFailed(_) => ERROR_TRANSFER_FAILED,
            LedgerError::PriceUnavailable(_) => ERROR_PRICE_UNAVAILABLE,
            LedgerError::StakeBelowMinimum { .. } => ERROR_STAKE_BELOW_MINIMUM,
            LedgerError::Overflow => ERROR_OVERFLOW,
        }
    }
}

fn join_states(states: &[MarketState]) -> String {
    states
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(" or ")
}
