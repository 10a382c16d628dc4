//! Fixed-odds wagering domain types.
//!
//! Markets, their odds history, individual stakes, the reserve that backs them and the
//! errors the ledger reports. Everything here is plain data plus the local rules that can
//! be checked without touching storage; the execution crate composes them.

mod codec;
mod constants;
mod error;
mod ledger;
mod market;
mod odds;
mod reserve;
mod stake;

pub use codec::{clip_message, message_encode_size, read_message, write_message};
pub use constants::*;
pub use error::LedgerError;
pub use ledger::{Capability, LedgerConfig, LedgerState};
pub use market::{Market, MarketKind, MarketState};
pub use odds::{OddsRegistry, OddsSet};
pub use reserve::Reserve;
pub use stake::{payout, Stake};

#[cfg(test)]
mod tests;
