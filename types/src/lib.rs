//! Persisted, wire and event types for the oddsbook fixed-odds ledger.

pub mod execution;
pub mod serde_hex;
pub mod wager;

pub use execution::{Event, Instruction, Key, Output, Transaction, Value};
