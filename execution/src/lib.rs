//! Oddsbook execution layer.
//!
//! This crate contains the deterministic engine (`Layer`) that applies wagering
//! instructions to ledger state: the odds registry, the market lifecycle, stake placement,
//! settlement and the solvency guard.
//!
//! ## Determinism requirements
//! - Time comes from the batch (`now_ms`), never from the wall clock.
//! - Outputs must not depend on the iteration order of hash-based collections.
//!
//! ## Atomicity
//! Each instruction either applies in full or not at all. Handlers perform at most one
//! external transfer, and always as their last step, so a failed transfer discards every
//! write the instruction staged. A storage failure stops the batch, but instructions that
//! already completed are still committed with their transfers.
//!
//! ## Minimal execution pipeline (example)
//! ```rust,ignore
//! use oddsbook_execution::{state_transition::execute_batch, Environment, Memory, RoleTable,
//!     StandardSelections};
//!
//! let mut state = Memory::default();
//! let env = Environment {
//!     authorizer: &roles,
//!     oracle: &oracle,
//!     transfers: &wallets,
//!     selections: &StandardSelections,
//! };
//! let outputs = execute_batch(&mut state, env, 1, now_ms, transactions)?;
//! ```

pub mod collaborators;
pub mod state_transition;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

mod error;
mod layer;
mod state;

pub use collaborators::{
    Authorizer, Environment, PriceError, PriceOracle, RoleTable, SelectionValidator,
    StandardSelections, TransferError, Transfers,
};
pub use error::{ExecutionError, ExecutionResult};
pub use layer::Layer;
pub use state::{
    committed_height, load_ledger, load_market, load_registry, load_reserve, load_stake,
    load_stakes, stake_count, Memory, State, Status,
};

#[cfg(test)]
mod betting_tests;
