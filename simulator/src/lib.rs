//! Scenario replay for the oddsbook engine.
//!
//! A scenario is a YAML file naming accounts, the ledger configuration, role grants, a price
//! feed and a list of timed batches. [`Simulator`] validates it, runs every batch through
//! [`execute_batch`] against in-memory state and hands back the emitted events.

use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    Signer,
};
use oddsbook_execution::{
    load_reserve, state_transition::execute_batch, Environment, Memory, PriceError, PriceOracle,
    RoleTable, StandardSelections, TransferError, Transfers,
};
use oddsbook_types::{
    execution::{Event, Instruction, Output, Transaction},
    serde_hex::decode_public_key,
    wager::{Capability, LedgerConfig, LedgerError, Reserve, BPS_DENOMINATOR},
};
use serde::{Deserialize, Serialize};
use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet},
};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must name an account or be a hex public key: {value}")]
    InvalidKey { field: &'static str, value: String },
    #[error("account {name} is declared twice")]
    DuplicateAccount { name: String },
    #[error("accounts {first} and {second} share seed {seed}")]
    DuplicateSeed {
        first: String,
        second: String,
        seed: u64,
    },
    #[error("ledger is invalid: {source}")]
    InvalidLedger {
        #[source]
        source: LedgerError,
    },
    #[error("batch {index} starts at {at_ms}ms, before the previous batch ({previous_ms}ms)")]
    TimeWentBackwards {
        index: usize,
        at_ms: u64,
        previous_ms: u64,
    },
    #[error("batch {index} has {steps} steps (max {max})")]
    BatchTooLarge {
        index: usize,
        steps: usize,
        max: usize,
    },
    #[error("batch {index} initializes the ledger; initialization comes from the ledger section")]
    NestedInitialize { index: usize },
}

/// A key in a scenario: either a declared account name or a hex-encoded public key.
pub type KeyRef = String;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AccountConfig {
    pub name: String,
    pub seed: u64,
    #[serde(default)]
    pub balance: u64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LedgerSection {
    pub owner: KeyRef,
    pub treasury: KeyRef,
    pub event_id: u64,
    pub cutoff_ms: u64,
    #[serde(default)]
    pub fee_bps: u16,
    pub outcome_count: u8,
    #[serde(default)]
    pub min_stake_reference: u64,
    #[serde(default)]
    pub genesis_ms: u64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RoleConfig {
    pub account: KeyRef,
    pub capabilities: Vec<Capability>,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PriceConfig {
    /// Reference units per stake unit, in basis points.
    RateBps(u64),
    Unavailable,
}

impl Default for PriceConfig {
    fn default() -> Self {
        PriceConfig::RateBps(BPS_DENOMINATOR)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StepConfig {
    pub actor: KeyRef,
    #[serde(flatten)]
    pub instruction: Instruction,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BatchConfig {
    pub at_ms: u64,
    pub steps: Vec<StepConfig>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub accounts: Vec<AccountConfig>,
    pub ledger: LedgerSection,
    #[serde(default)]
    pub roles: Vec<RoleConfig>,
    #[serde(default, with = "serde_yaml::with::singleton_map")]
    pub price: PriceConfig,
    #[serde(default)]
    pub batches: Vec<BatchConfig>,
}

/// A scenario whose keys are resolved and whose batches are checked.
pub struct ValidatedScenario {
    pub accounts: BTreeMap<String, PublicKey>,
    pub balances: BTreeMap<PublicKey, u64>,
    pub ledger: LedgerConfig,
    pub genesis_ms: u64,
    pub grants: Vec<(PublicKey, Capability)>,
    pub price: PriceConfig,
    pub batches: Vec<(u64, Vec<Transaction>)>,
}

impl ScenarioConfig {
    pub fn validate(self) -> Result<ValidatedScenario, ConfigError> {
        let mut accounts = BTreeMap::new();
        let mut seeds: BTreeMap<u64, String> = BTreeMap::new();
        let mut balances = BTreeMap::new();
        for account in &self.accounts {
            if let Some(first) = seeds.insert(account.seed, account.name.clone()) {
                return Err(ConfigError::DuplicateSeed {
                    first,
                    second: account.name.clone(),
                    seed: account.seed,
                });
            }
            let public = PrivateKey::from_seed(account.seed).public_key();
            if accounts
                .insert(account.name.clone(), public.clone())
                .is_some()
            {
                return Err(ConfigError::DuplicateAccount {
                    name: account.name.clone(),
                });
            }
            balances.insert(public, account.balance);
        }

        let resolve = |field: &'static str, value: &str| -> Result<PublicKey, ConfigError> {
            if let Some(public) = accounts.get(value) {
                return Ok(public.clone());
            }
            decode_public_key(value).map_err(|_| ConfigError::InvalidKey {
                field,
                value: value.to_string(),
            })
        };

        let ledger = LedgerConfig {
            owner: resolve("ledger.owner", &self.ledger.owner)?,
            event_id: self.ledger.event_id,
            cutoff_ms: self.ledger.cutoff_ms,
            fee_bps: self.ledger.fee_bps,
            treasury: resolve("ledger.treasury", &self.ledger.treasury)?,
            outcome_count: self.ledger.outcome_count,
            min_stake_reference: self.ledger.min_stake_reference,
        };
        ledger
            .validate()
            .map_err(|source| ConfigError::InvalidLedger { source })?;

        let mut grants = Vec::new();
        for role in &self.roles {
            let public = resolve("roles.account", &role.account)?;
            let unique: BTreeSet<Capability> = role.capabilities.iter().copied().collect();
            grants.extend(unique.into_iter().map(|capability| (public.clone(), capability)));
        }

        let mut batches = Vec::with_capacity(self.batches.len());
        let mut previous_ms = self.ledger.genesis_ms;
        for (index, batch) in self.batches.into_iter().enumerate() {
            if batch.at_ms < previous_ms {
                return Err(ConfigError::TimeWentBackwards {
                    index,
                    at_ms: batch.at_ms,
                    previous_ms,
                });
            }
            if batch.steps.len() > oddsbook_types::execution::MAX_BATCH_TRANSACTIONS {
                return Err(ConfigError::BatchTooLarge {
                    index,
                    steps: batch.steps.len(),
                    max: oddsbook_types::execution::MAX_BATCH_TRANSACTIONS,
                });
            }
            previous_ms = batch.at_ms;

            let mut transactions = Vec::with_capacity(batch.steps.len());
            for step in batch.steps {
                if matches!(step.instruction, Instruction::Initialize { .. }) {
                    return Err(ConfigError::NestedInitialize { index });
                }
                let public = resolve("batches.steps.actor", &step.actor)?;
                transactions.push(Transaction::new(public, step.instruction));
            }
            batches.push((batch.at_ms, transactions));
        }

        Ok(ValidatedScenario {
            accounts,
            balances,
            ledger,
            genesis_ms: self.ledger.genesis_ms,
            grants,
            price: self.price,
            batches,
        })
    }
}

/// Wallet balances outside the ledger.
#[derive(Debug, Default)]
pub struct Wallets {
    balances: RefCell<BTreeMap<PublicKey, u64>>,
}

impl Wallets {
    pub fn new(balances: BTreeMap<PublicKey, u64>) -> Self {
        Self {
            balances: RefCell::new(balances),
        }
    }

    pub fn balance(&self, account: &PublicKey) -> u64 {
        self.balances.borrow().get(account).copied().unwrap_or(0)
    }
}

impl Transfers for Wallets {
    fn debit(&self, from: &PublicKey, amount: u64) -> Result<(), TransferError> {
        let mut balances = self.balances.borrow_mut();
        let balance = balances.entry(from.clone()).or_default();
        if *balance < amount {
            return Err(TransferError::InsufficientFunds {
                needed: amount,
                available: *balance,
            });
        }
        *balance -= amount;
        Ok(())
    }

    fn credit(&self, to: &PublicKey, amount: u64) -> Result<(), TransferError> {
        let mut balances = self.balances.borrow_mut();
        let balance = balances.entry(to.clone()).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected("wallet balance overflow".into()))?;
        Ok(())
    }
}

/// Price feed fixed for the whole scenario.
#[derive(Clone, Copy, Debug)]
pub struct ScenarioPrice(pub PriceConfig);

impl PriceOracle for ScenarioPrice {
    fn to_reference(&self, amount: u64) -> Result<u64, PriceError> {
        match self.0 {
            PriceConfig::RateBps(bps) => {
                let value = amount as u128 * bps as u128 / BPS_DENOMINATOR as u128;
                u64::try_from(value).map_err(|_| PriceError::Unavailable("overflow".into()))
            }
            PriceConfig::Unavailable => {
                Err(PriceError::Unavailable("no price configured".into()))
            }
        }
    }
}

/// What a finished scenario leaves behind.
#[derive(Clone, Debug, Serialize)]
pub struct Report {
    pub batches: u64,
    pub events: usize,
    pub rejected: usize,
    pub reserve_balance: u64,
    pub reserve_liability: u64,
    pub wallets: BTreeMap<String, u64>,
}

pub struct Simulator {
    scenario: ValidatedScenario,
    state: Memory,
    roles: RoleTable,
    wallets: Wallets,
    price: ScenarioPrice,
    height: u64,
}

impl Simulator {
    pub fn new(mut scenario: ValidatedScenario) -> Self {
        let mut roles = RoleTable::new(scenario.ledger.owner.clone());
        for (public, capability) in scenario.grants.drain(..) {
            roles.grant(public, capability);
        }
        let wallets = Wallets::new(std::mem::take(&mut scenario.balances));
        let price = ScenarioPrice(scenario.price);
        Self {
            scenario,
            state: Memory::default(),
            roles,
            wallets,
            price,
            height: 0,
        }
    }

    /// Runs initialization and every batch, passing each event to `sink` as it is produced.
    pub fn run(&mut self, mut sink: impl FnMut(&Event)) -> anyhow::Result<Report> {
        let genesis = vec![Transaction::new(
            self.scenario.ledger.owner.clone(),
            Instruction::Initialize {
                config: self.scenario.ledger.clone(),
            },
        )];
        let mut events = 0;
        let mut rejected = 0;
        let mut schedule = vec![(self.scenario.genesis_ms, genesis)];
        schedule.append(&mut self.scenario.batches);

        for (at_ms, transactions) in schedule {
            self.height += 1;
            let env = Environment {
                authorizer: &self.roles,
                oracle: &self.price,
                transfers: &self.wallets,
                selections: &StandardSelections,
            };
            let outputs = execute_batch(&mut self.state, env, self.height, at_ms, transactions)?;
            for output in &outputs {
                if let Output::Event(event) = output {
                    events += 1;
                    if matches!(event, Event::OperationRejected { .. }) {
                        rejected += 1;
                    }
                    sink(event);
                }
            }
            debug!(height = self.height, at_ms, outputs = outputs.len(), "batch replayed");
        }

        let reserve: Reserve = load_reserve(&self.state)?;
        let wallets = self
            .scenario
            .accounts
            .iter()
            .map(|(name, public)| (name.clone(), self.wallets.balance(public)))
            .collect();
        info!(
            batches = self.height,
            events,
            rejected,
            reserve = reserve.balance,
            liability = reserve.liability,
            "scenario complete"
        );
        Ok(Report {
            batches: self.height,
            events,
            rejected,
            reserve_balance: reserve.balance,
            reserve_liability: reserve.liability,
            wallets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"
accounts:
  - { name: house, seed: 1, balance: 1000 }
  - { name: treasury, seed: 2 }
  - { name: alice, seed: 10, balance: 100 }
  - { name: bob, seed: 11, balance: 100 }
ledger:
  owner: house
  treasury: treasury
  event_id: 7
  cutoff_ms: 100000
  outcome_count: 3
roles:
  - { account: alice, capabilities: [] }
batches:
  - at_ms: 10
    steps:
      - { actor: house, op: fund, amount: 300 }
      - { actor: house, op: create_market, market_id: 1, kind: match_result, odds: [22000, 33000, 28000] }
      - { actor: house, op: set_market_state, market_id: 1, state: open }
  - at_ms: 20
    steps:
      - { actor: alice, op: place_bet, market_id: 1, selection: 0, amount: 100 }
      - { actor: house, op: set_odds, market_id: 1, odds: [25000, 33000, 28000] }
      - { actor: bob, op: place_bet, market_id: 1, selection: 0, amount: 100 }
  - at_ms: 30
    steps:
      - { actor: house, op: resolve_market, market_id: 1, result: 0 }
      - { actor: alice, op: claim, market_id: 1, stake_index: 0 }
      - { actor: bob, op: claim_all, market_id: 1 }
      - { actor: bob, op: claim, market_id: 1, stake_index: 0 }
"#;

    fn parse(yaml: &str) -> ScenarioConfig {
        serde_yaml::from_str(yaml).expect("scenario parses")
    }

    #[test]
    fn test_scenario_runs_to_completion() {
        let scenario = parse(SCENARIO).validate().expect("scenario validates");
        let mut simulator = Simulator::new(scenario);
        let mut seen = Vec::new();
        let report = simulator
            .run(|event| seen.push(event.clone()))
            .expect("scenario runs");

        assert_eq!(report.batches, 4);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.wallets["alice"], 220);
        assert_eq!(report.wallets["bob"], 250);
        assert_eq!(report.wallets["house"], 700);
        assert_eq!(report.reserve_liability, 0);
        assert_eq!(report.reserve_balance, 30);
        assert!(matches!(seen.first(), Some(Event::LedgerInitialized { .. })));
    }

    #[test]
    fn test_events_serialize_as_json_lines() {
        let scenario = parse(SCENARIO).validate().expect("scenario validates");
        let mut lines = Vec::new();
        Simulator::new(scenario)
            .run(|event| lines.push(serde_json::to_string(event).expect("serializes")))
            .expect("scenario runs");
        assert!(lines[0].contains("\"type\":\"ledger_initialized\""));
        assert!(lines.iter().all(|line| !line.contains('\n')));
    }

    #[test]
    fn test_unknown_actor_rejected() {
        let yaml = SCENARIO.replace("actor: bob, op: claim_all", "actor: carol, op: claim_all");
        let err = parse(&yaml).validate().err().expect("invalid scenario");
        assert!(matches!(err, ConfigError::InvalidKey { value, .. } if value == "carol"));
    }

    #[test]
    fn test_duplicate_seed_rejected() {
        let yaml = SCENARIO.replace("seed: 11", "seed: 10");
        let err = parse(&yaml).validate().err().expect("invalid scenario");
        assert!(matches!(err, ConfigError::DuplicateSeed { seed: 10, .. }));
    }

    #[test]
    fn test_time_must_not_go_backwards() {
        let yaml = SCENARIO.replace("at_ms: 30", "at_ms: 15");
        let err = parse(&yaml).validate().err().expect("invalid scenario");
        assert!(matches!(
            err,
            ConfigError::TimeWentBackwards {
                index: 2,
                at_ms: 15,
                previous_ms: 20
            }
        ));
    }

    #[test]
    fn test_invalid_ledger_rejected() {
        let yaml = SCENARIO.replace("outcome_count: 3", "outcome_count: 1");
        let err = parse(&yaml).validate().err().expect("invalid scenario");
        assert!(matches!(err, ConfigError::InvalidLedger { .. }));
    }

    #[test]
    fn test_hex_keys_accepted() {
        let treasury =
            oddsbook_types::serde_hex::encode_public_key(&PrivateKey::from_seed(99).public_key());
        let yaml = SCENARIO.replace("treasury: treasury", &format!("treasury: \"{treasury}\""));
        let scenario = parse(&yaml).validate().expect("scenario validates");
        assert_eq!(
            scenario.ledger.treasury,
            PrivateKey::from_seed(99).public_key()
        );
    }

    #[test]
    fn test_bundled_scenarios_run() {
        for yaml in [
            include_str!("../../scenarios/match_result.yaml"),
            include_str!("../../scenarios/cancellation.yaml"),
        ] {
            let scenario = parse(yaml).validate().expect("scenario validates");
            let report = Simulator::new(scenario).run(|_| {}).expect("scenario runs");
            assert_eq!(report.reserve_liability, 0);
            assert!(report.rejected > 0);
        }
    }

    #[test]
    fn test_price_config_parses() {
        let yaml = format!("{SCENARIO}price: unavailable\n");
        assert_eq!(parse(&yaml).price, PriceConfig::Unavailable);
        let yaml = format!("{SCENARIO}price: {{ rate_bps: 5000 }}\n");
        assert_eq!(parse(&yaml).price, PriceConfig::RateBps(5_000));
        assert_eq!(
            ScenarioPrice(PriceConfig::RateBps(5_000)).to_reference(100),
            Ok(50)
        );
    }
}
