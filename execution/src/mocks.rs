//! Scriptable collaborators and a small harness for driving the engine in tests.

use crate::{
    state, state_transition, Authorizer, Environment, Memory, PriceError, PriceOracle, RoleTable,
    StandardSelections, TransferError, Transfers,
};
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    Signer,
};
use oddsbook_types::{
    execution::{Event, Instruction, Output, Transaction},
    wager::{
        Capability, LedgerConfig, Market, MarketKind, MarketState, OddsRegistry, Reserve, Stake,
        BPS_DENOMINATOR,
    },
};
use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
};

/// Creates an account keypair deterministically from `seed`.
pub fn create_account_keypair(seed: u64) -> (PrivateKey, PublicKey) {
    let private = PrivateKey::from_seed(seed);
    let public = private.public_key();
    (private, public)
}

pub fn account(seed: u64) -> PublicKey {
    create_account_keypair(seed).1
}

/// Grants everything to everyone.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn has_capability(&self, _: &PublicKey, _: Capability) -> bool {
        true
    }
}

/// Price feed quoting a fixed rate, or failing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FixedPrice {
    /// Reference units per stake unit, in basis points.
    Rate(u64),
    /// Last quote is this many milliseconds old.
    Stale(u64),
    Unavailable,
}

impl PriceOracle for FixedPrice {
    fn to_reference(&self, amount: u64) -> Result<u64, PriceError> {
        match self {
            FixedPrice::Rate(bps) => {
                let value = (amount as u128) * (*bps as u128) / (BPS_DENOMINATOR as u128);
                Ok(value.min(u64::MAX as u128) as u64)
            }
            FixedPrice::Stale(age_ms) => Err(PriceError::Stale { age_ms: *age_ms }),
            FixedPrice::Unavailable => Err(PriceError::Unavailable("feed offline".into())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransferRecord {
    Debit(PublicKey, u64),
    Credit(PublicKey, u64),
}

/// Wallet balances with failure injection.
///
/// Debits draw on the account's balance and fail when it is short; `fail_next` makes the
/// next transfer of either direction fail.
#[derive(Debug, Default)]
pub struct MockTransfers {
    balances: RefCell<BTreeMap<PublicKey, u64>>,
    records: RefCell<Vec<TransferRecord>>,
    fail_next: Cell<bool>,
}

impl MockTransfers {
    pub fn fund(&self, account: &PublicKey, amount: u64) {
        *self
            .balances
            .borrow_mut()
            .entry(account.clone())
            .or_default() += amount;
    }

    pub fn balance(&self, account: &PublicKey) -> u64 {
        self.balances.borrow().get(account).copied().unwrap_or(0)
    }

    pub fn fail_next(&self) {
        self.fail_next.set(true);
    }

    pub fn records(&self) -> Vec<TransferRecord> {
        self.records.borrow().clone()
    }

    pub fn credited(&self, account: &PublicKey) -> u64 {
        self.records
            .borrow()
            .iter()
            .filter_map(|record| match record {
                TransferRecord::Credit(to, amount) if to == account => Some(*amount),
                _ => None,
            })
            .sum()
    }

    fn injected_failure(&self) -> Result<(), TransferError> {
        if self.fail_next.replace(false) {
            return Err(TransferError::Rejected("injected failure".into()));
        }
        Ok(())
    }
}

impl Transfers for MockTransfers {
    fn debit(&self, from: &PublicKey, amount: u64) -> Result<(), TransferError> {
        self.injected_failure()?;
        let mut balances = self.balances.borrow_mut();
        let balance = balances.entry(from.clone()).or_default();
        if *balance < amount {
            return Err(TransferError::InsufficientFunds {
                needed: amount,
                available: *balance,
            });
        }
        *balance -= amount;
        self.records
            .borrow_mut()
            .push(TransferRecord::Debit(from.clone(), amount));
        Ok(())
    }

    fn credit(&self, to: &PublicKey, amount: u64) -> Result<(), TransferError> {
        self.injected_failure()?;
        *self.balances.borrow_mut().entry(to.clone()).or_default() += amount;
        self.records
            .borrow_mut()
            .push(TransferRecord::Credit(to.clone(), amount));
        Ok(())
    }
}

/// In-memory ledger plus collaborators, executing one batch per call.
pub struct Harness {
    pub owner: PublicKey,
    pub state: Memory,
    pub roles: RoleTable,
    pub oracle: FixedPrice,
    pub transfers: MockTransfers,
    pub selections: StandardSelections,
    pub height: u64,
    pub now_ms: u64,
}

impl Harness {
    /// A harness whose role table is owned by `owner`.
    pub fn new(owner: PublicKey) -> Self {
        Self {
            owner: owner.clone(),
            state: Memory::default(),
            roles: RoleTable::new(owner),
            oracle: FixedPrice::Rate(BPS_DENOMINATOR),
            transfers: MockTransfers::default(),
            selections: StandardSelections,
            height: 0,
            now_ms: 1_000,
        }
    }

    pub fn env(&self) -> Environment<'_> {
        Environment {
            authorizer: &self.roles,
            oracle: &self.oracle,
            transfers: &self.transfers,
            selections: &self.selections,
        }
    }

    /// Runs `transactions` as the next batch and returns the events they produced.
    pub fn execute(&mut self, transactions: Vec<Transaction>) -> Vec<Event> {
        self.height += 1;
        let env = Environment {
            authorizer: &self.roles,
            oracle: &self.oracle,
            transfers: &self.transfers,
            selections: &self.selections,
        };
        let outputs = state_transition::execute_batch(
            &mut self.state,
            env,
            self.height,
            self.now_ms,
            transactions,
        )
        .expect("batch should execute");
        outputs
            .into_iter()
            .filter_map(|output| match output {
                Output::Event(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    /// Runs a single instruction from `public`.
    pub fn submit(&mut self, public: &PublicKey, instruction: Instruction) -> Vec<Event> {
        self.execute(vec![Transaction::new(public.clone(), instruction)])
    }

    /// Runs a single instruction from the owner.
    pub fn admin(&mut self, instruction: Instruction) -> Vec<Event> {
        let owner = self.owner.clone();
        self.submit(&owner, instruction)
    }

    /// Initializes the ledger with `config` and seeds the reserve with `reserve`.
    pub fn initialize(&mut self, config: LedgerConfig, reserve: u64) {
        let owner = self.owner.clone();
        self.transfers.fund(&owner, reserve);
        let mut instructions = vec![Instruction::Initialize { config }];
        if reserve > 0 {
            instructions.push(Instruction::Fund { amount: reserve });
        }
        let events = self.execute(
            instructions
                .into_iter()
                .map(|instruction| Transaction::new(owner.clone(), instruction))
                .collect(),
        );
        assert!(rejection(&events).is_none(), "setup rejected: {events:?}");
    }

    /// Creates a market priced at `odds` and opens it.
    pub fn open_market(&mut self, market_id: u64, kind: MarketKind, odds: &[u64]) {
        let owner = self.owner.clone();
        let events = self.execute(vec![
            Transaction::new(
                owner.clone(),
                Instruction::CreateMarket {
                    market_id,
                    kind,
                    odds: Some(odds.to_vec()),
                },
            ),
            Transaction::new(
                owner,
                Instruction::SetMarketState {
                    market_id,
                    state: MarketState::Open,
                },
            ),
        ]);
        assert!(rejection(&events).is_none(), "setup rejected: {events:?}");
    }

    /// Funds `bettor`'s wallet and places a stake, returning the batch events.
    pub fn bet(
        &mut self,
        bettor: &PublicKey,
        market_id: u64,
        selection: u8,
        amount: u64,
    ) -> Vec<Event> {
        self.transfers.fund(bettor, amount);
        self.submit(
            bettor,
            Instruction::PlaceBet {
                market_id,
                selection,
                amount,
            },
        )
    }

    pub fn reserve(&self) -> Reserve {
        state::load_reserve(&self.state).expect("reserve readable")
    }

    pub fn market(&self, market_id: u64) -> Market {
        state::load_market(&self.state, market_id)
            .expect("market readable")
            .expect("market exists")
    }

    pub fn registry(&self, market_id: u64) -> OddsRegistry {
        state::load_registry(&self.state, market_id)
            .expect("registry readable")
            .expect("registry exists")
    }

    pub fn stakes(&self, market_id: u64, owner: &PublicKey) -> Vec<Stake> {
        state::load_stakes(&self.state, market_id, owner).expect("stakes readable")
    }
}

/// The error code of the first rejection in `events`, if any.
pub fn rejection(events: &[Event]) -> Option<u8> {
    events.iter().find_map(|event| match event {
        Event::OperationRejected { error_code, .. } => Some(*error_code),
        _ => None,
    })
}

/// A ledger config with a far-off cutoff and no fee or minimum stake.
pub fn ledger_config(owner: &PublicKey, treasury: &PublicKey) -> LedgerConfig {
    LedgerConfig {
        owner: owner.clone(),
        event_id: 1,
        cutoff_ms: u64::MAX,
        fee_bps: 0,
        treasury: treasury.clone(),
        outcome_count: 3,
        min_stake_reference: 0,
    }
}
