/// Fixed-point scale for odds: 20_000 == 2.0000x.
pub const PRECISION: u64 = 10_000;

/// Lowest multiplier an odds component may carry (1.0100x).
pub const MIN_ODDS: u64 = 10_100;

/// Highest multiplier an odds component may carry (1000.0000x).
pub const MAX_ODDS: u64 = 10_000_000;

/// Upper bound on outcomes per market (and per event).
pub const MAX_OUTCOMES: u8 = 32;

/// Upper bound on distinct odds sets a single market may accumulate.
pub const MAX_ODDS_ENTRIES: usize = 4_096;

/// Basis-point denominator for fees.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Maximum length of a rejection message carried in events.
pub const MAX_MESSAGE_LENGTH: usize = 256;

/// Error codes for `OperationRejected` events
pub const ERROR_UNKNOWN_MARKET: u8 = 1;
pub const ERROR_MARKET_EXISTS: u8 = 2;
pub const ERROR_ODDS_OUT_OF_BOUNDS: u8 = 3;
pub const ERROR_ODDS_SHAPE: u8 = 4;
pub const ERROR_INVALID_SELECTION: u8 = 5;
pub const ERROR_ZERO_AMOUNT: u8 = 6;
pub const ERROR_INVALID_MARKET_KIND: u8 = 7;
pub const ERROR_INVALID_CONFIG: u8 = 8;
pub const ERROR_STAKE_NOT_FOUND: u8 = 9;
pub const ERROR_STATE_MISMATCH: u8 = 10;
pub const ERROR_INVALID_TRANSITION: u8 = 11;
pub const ERROR_ODDS_UNSET: u8 = 12;
pub const ERROR_BETTING_CLOSED: u8 = 13;
pub const ERROR_LEDGER_PAUSED: u8 = 14;
pub const ERROR_NOT_INITIALIZED: u8 = 15;
pub const ERROR_UNAUTHORIZED: u8 = 16;
pub const ERROR_INSUFFICIENT_LIQUIDITY: u8 = 17;
pub const ERROR_INSUFFICIENT_RESERVE: u8 = 18;
pub const ERROR_ALREADY_CLAIMED: u8 = 19;
pub const ERROR_ALREADY_SETTLED: u8 = 20;
pub const ERROR_ALREADY_INITIALIZED: u8 = 21;
pub const ERROR_NOTHING_TO_CLAIM: u8 = 22;
pub const ERROR_STAKE_LOST: u8 = 23;
pub const ERROR_TRANSFER_FAILED: u8 = 24;
pub const ERROR_PRICE_UNAVAILABLE: u8 = 25;
pub const ERROR_STAKE_BELOW_MINIMUM: u8 = 26;
pub const ERROR_OVERFLOW: u8 = 27;
