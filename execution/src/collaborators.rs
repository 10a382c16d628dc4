//! Services the engine consults but does not own.
//!
//! Each is a narrow trait so deployments can plug in their own role storage, price feed
//! and value-transfer mechanism.

use commonware_cryptography::ed25519::PublicKey;
use oddsbook_types::wager::{Capability, MarketKind};
use std::collections::BTreeSet;
use thiserror::Error as ThisError;

/// Answers whether `caller` holds `capability`.
pub trait Authorizer {
    fn has_capability(&self, caller: &PublicKey, capability: Capability) -> bool;
}

#[derive(Clone, Debug, ThisError, PartialEq, Eq)]
pub enum PriceError {
    #[error("price is stale (age {age_ms}ms)")]
    Stale { age_ms: u64 },
    #[error("price unavailable: {0}")]
    Unavailable(String),
}

/// Converts a stake amount into the reference unit used for the minimum-stake floor.
pub trait PriceOracle {
    fn to_reference(&self, amount: u64) -> Result<u64, PriceError>;
}

#[derive(Clone, Debug, ThisError, PartialEq, Eq)]
pub enum TransferError {
    #[error("insufficient funds: needed {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },
    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// Moves value between an account and the ledger.
///
/// Either call may fail; the engine aborts the enclosing operation when it does.
pub trait Transfers {
    /// Pulls `amount` from `from` into the ledger.
    fn debit(&self, from: &PublicKey, amount: u64) -> Result<(), TransferError>;
    /// Pays `amount` from the ledger to `to`.
    fn credit(&self, to: &PublicKey, amount: u64) -> Result<(), TransferError>;
}

/// Decides which selections a market kind accepts.
pub trait SelectionValidator {
    fn is_valid(&self, kind: &MarketKind, selection: u8) -> bool;
}

/// Accepts exactly the outcome indices a kind declares.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardSelections;

impl SelectionValidator for StandardSelections {
    fn is_valid(&self, kind: &MarketKind, selection: u8) -> bool {
        match kind {
            MarketKind::MatchResult => selection <= 2,
            MarketKind::TwoWay | MarketKind::OverUnder => selection <= 1,
            MarketKind::Outcomes(n) => selection < *n,
        }
    }
}

/// Owner-plus-grants role storage.
///
/// The owner holds every capability; anyone else holds only what was granted.
#[derive(Clone, Debug)]
pub struct RoleTable {
    owner: PublicKey,
    grants: BTreeSet<(PublicKey, Capability)>,
}

impl RoleTable {
    pub fn new(owner: PublicKey) -> Self {
        Self {
            owner,
            grants: BTreeSet::new(),
        }
    }

    pub fn owner(&self) -> &PublicKey {
        &self.owner
    }

    pub fn grant(&mut self, public: PublicKey, capability: Capability) {
        self.grants.insert((public, capability));
    }

    pub fn revoke(&mut self, public: &PublicKey, capability: Capability) {
        self.grants.remove(&(public.clone(), capability));
    }
}

impl Authorizer for RoleTable {
    fn has_capability(&self, caller: &PublicKey, capability: Capability) -> bool {
        caller == &self.owner || self.grants.contains(&(caller.clone(), capability))
    }
}

/// The collaborators a batch executes against.
#[derive(Clone, Copy)]
pub struct Environment<'a> {
    pub authorizer: &'a dyn Authorizer,
    pub oracle: &'a dyn PriceOracle,
    pub transfers: &'a dyn Transfers,
    pub selections: &'a dyn SelectionValidator,
}
