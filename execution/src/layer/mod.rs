use anyhow::{anyhow, Context as _, Result};
use commonware_cryptography::ed25519::PublicKey;
use oddsbook_types::{
    execution::{Event, Instruction, Key, Output, Transaction, Value},
    wager::{
        clip_message, Capability, LedgerError, LedgerState, Market, MarketState, OddsRegistry,
        Reserve, Stake,
    },
};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::collaborators::Environment;
use crate::error::{ExecutionError, ExecutionResult};
use crate::state::{self, State, Status};

mod handlers;

/// Write overlay for one batch.
///
/// Handlers write into `staged`. When an instruction succeeds its staged writes move into
/// `pending`; when it is rejected they are dropped, so a refused instruction never leaves a
/// partial mutation behind. `pending` is handed back to the caller by [`Layer::commit`].
pub struct Layer<'a, S: State> {
    state: &'a S,
    env: Environment<'a>,
    pending: BTreeMap<Key, Status>,
    staged: BTreeMap<Key, Status>,
    now_ms: u64,
}

impl<'a, S: State> Layer<'a, S> {
    pub fn new(state: &'a S, env: Environment<'a>, now_ms: u64) -> Self {
        Self {
            state,
            env,
            pending: BTreeMap::new(),
            staged: BTreeMap::new(),
            now_ms,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn insert(&mut self, key: Key, value: Value) {
        self.staged.insert(key, Status::Update(value));
    }

    fn dispatch(
        &mut self,
        public: &PublicKey,
        instruction: &Instruction,
    ) -> ExecutionResult<Vec<Event>> {
        match instruction {
            Instruction::Initialize { config } => self.handle_initialize(public, config),
            Instruction::Fund { amount } => self.handle_fund(public, *amount),
            Instruction::Withdraw { amount } => self.handle_withdraw(public, *amount),
            Instruction::SetPaused { paused } => self.handle_set_paused(public, *paused),
            Instruction::CreateMarket {
                market_id,
                kind,
                odds,
            } => self.handle_create_market(public, *market_id, *kind, odds.as_deref()),
            Instruction::SetMarketState { market_id, state } => {
                self.handle_set_market_state(public, *market_id, *state)
            }
            Instruction::SetOdds { market_id, odds } => {
                self.handle_set_odds(public, *market_id, odds)
            }
            Instruction::ResolveMarket { market_id, result } => {
                self.handle_resolve_market(public, *market_id, *result)
            }
            Instruction::PlaceBet {
                market_id,
                selection,
                amount,
            } => self.handle_place_bet(public, *market_id, *selection, *amount),
            Instruction::Claim {
                market_id,
                stake_index,
            } => self.handle_claim(public, *market_id, *stake_index),
            Instruction::ClaimRefund {
                market_id,
                stake_index,
            } => self.handle_claim_refund(public, *market_id, *stake_index),
            Instruction::ClaimAll { market_id } => self.handle_claim_all(public, *market_id),
        }
    }

    /// Applies one transaction atomically.
    ///
    /// A refused instruction yields a single `OperationRejected` event; only storage
    /// failures are returned as errors.
    pub fn apply(&mut self, transaction: &Transaction) -> Result<Vec<Event>> {
        let public = &transaction.public;
        match self.dispatch(public, &transaction.instruction) {
            Ok(events) => {
                let staged = std::mem::take(&mut self.staged);
                self.pending.extend(staged);
                Ok(events)
            }
            Err(ExecutionError::Rejected(err)) => {
                self.staged.clear();
                debug!(
                    actor = ?public,
                    code = err.code(),
                    error = %err,
                    "instruction rejected"
                );
                Ok(vec![Event::OperationRejected {
                    actor: public.clone(),
                    market_id: transaction.instruction.market_id(),
                    error_code: err.code(),
                    message: clip_message(err.to_string()),
                }])
            }
            Err(ExecutionError::State(err)) => {
                self.staged.clear();
                Err(err).context("state error during apply")
            }
        }
    }

    /// Applies `transactions` in order, stopping at the first storage failure.
    ///
    /// Returns the outputs of every transaction that completed and, if one failed, its
    /// position and error. Writes of completed transactions stay in `pending`.
    pub fn execute(
        &mut self,
        transactions: Vec<Transaction>,
    ) -> (Vec<Output>, Option<(usize, anyhow::Error)>) {
        let mut outputs = Vec::new();
        for (position, tx) in transactions.into_iter().enumerate() {
            match self.apply(&tx) {
                Ok(events) => {
                    outputs.extend(events.into_iter().map(Output::Event));
                    outputs.push(Output::Transaction(tx));
                }
                Err(err) => return (outputs, Some((position, err))),
            }
        }
        (outputs, None)
    }

    pub fn commit(self) -> Vec<(Key, Status)> {
        self.pending.into_iter().collect()
    }

    fn ledger(&self) -> ExecutionResult<LedgerState> {
        Ok(state::load_ledger(self)?.ok_or(LedgerError::NotInitialized)?)
    }

    fn reserve(&self) -> ExecutionResult<Reserve> {
        Ok(state::load_reserve(self)?)
    }

    fn market(&self, market_id: u64) -> ExecutionResult<Market> {
        Ok(state::load_market(self, market_id)?.ok_or(LedgerError::UnknownMarket { market_id })?)
    }

    fn registry(&self, market_id: u64) -> ExecutionResult<OddsRegistry> {
        state::load_registry(self, market_id)?
            .ok_or_else(|| anyhow!("odds registry missing for market {market_id}").into())
    }

    fn stake(&self, market_id: u64, owner: &PublicKey, index: u32) -> ExecutionResult<Stake> {
        Ok(state::load_stake(self, market_id, owner, index)?
            .ok_or(LedgerError::StakeNotFound { market_id, index })?)
    }

    fn require(&self, caller: &PublicKey, capability: Capability) -> Result<(), LedgerError> {
        if self.env.authorizer.has_capability(caller, capability) {
            return Ok(());
        }
        Err(LedgerError::Unauthorized { capability })
    }

    fn debit(&self, from: &PublicKey, amount: u64) -> Result<(), LedgerError> {
        self.env.transfers.debit(from, amount).map_err(|err| {
            warn!(account = ?from, amount, error = %err, "debit failed");
            LedgerError::TransferFailed(err.to_string())
        })
    }

    fn credit(&self, to: &PublicKey, amount: u64) -> Result<(), LedgerError> {
        self.env.transfers.credit(to, amount).map_err(|err| {
            warn!(account = ?to, amount, error = %err, "credit failed");
            LedgerError::TransferFailed(err.to_string())
        })
    }

    fn log_transition(&self, market: &Market, from: MarketState) {
        info!(
            market_id = market.id,
            from = %from,
            to = %market.state,
            "market state changed"
        );
    }
}

impl<'a, S: State> State for Layer<'a, S> {
    fn get(&self, key: &Key) -> Result<Option<Value>> {
        for overlay in [&self.staged, &self.pending] {
            if let Some(status) = overlay.get(key) {
                return Ok(match status {
                    Status::Update(value) => Some(value.clone()),
                    Status::Delete => None,
                });
            }
        }
        self.state.get(key)
    }

    fn insert(&mut self, key: Key, value: Value) -> Result<()> {
        self.staged.insert(key, Status::Update(value));
        Ok(())
    }

    fn delete(&mut self, key: &Key) -> Result<()> {
        self.staged.insert(key.clone(), Status::Delete);
        Ok(())
    }
}
