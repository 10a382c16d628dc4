use bytes::{Buf, BufMut};
use commonware_codec::{
    EncodeSize, Error, FixedSize, RangeCfg, Read, ReadExt, ReadRangeExt, Write,
};
use commonware_cryptography::ed25519::PublicKey;
use serde::{Deserialize, Serialize};

use crate::wager::{
    message_encode_size, read_message, write_message, LedgerConfig, LedgerState, Market,
    MarketKind, MarketState, OddsRegistry, OddsSet, Reserve, Stake, MAX_MESSAGE_LENGTH,
    MAX_OUTCOMES,
};

/// Upper bound on transactions accepted in a single batch.
pub const MAX_BATCH_TRANSACTIONS: usize = 500;

/// An instruction submitted on behalf of `public`.
///
/// Authentication happens before a transaction reaches the engine; `public` is the
/// identity every capability check and transfer is made against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub public: PublicKey,
    pub instruction: Instruction,
}

impl Transaction {
    pub fn new(public: PublicKey, instruction: Instruction) -> Self {
        Self {
            public,
            instruction,
        }
    }
}

impl Write for Transaction {
    fn write(&self, writer: &mut impl BufMut) {
        self.public.write(writer);
        self.instruction.write(writer);
    }
}

impl Read for Transaction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let public = PublicKey::read(reader)?;
        let instruction = Instruction::read(reader)?;

        Ok(Self {
            public,
            instruction,
        })
    }
}

impl EncodeSize for Transaction {
    fn encode_size(&self) -> usize {
        self.public.encode_size() + self.instruction.encode_size()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    // Ledger administration (tags 0-3)
    /// Creates the ledger. Accepted exactly once.
    Initialize { config: LedgerConfig },
    /// Moves `amount` from the caller into the reserve.
    Fund { amount: u64 },
    /// Moves unencumbered reserve to the treasury.
    Withdraw { amount: u64 },
    SetPaused { paused: bool },

    // Market administration (tags 10-13)
    /// Odds are carried raw and checked when the instruction executes.
    CreateMarket {
        market_id: u64,
        kind: MarketKind,
        #[serde(default)]
        odds: Option<Vec<u64>>,
    },
    SetMarketState {
        market_id: u64,
        state: MarketState,
    },
    SetOdds {
        market_id: u64,
        odds: Vec<u64>,
    },
    ResolveMarket {
        market_id: u64,
        result: u8,
    },

    // Bettor operations (tags 20-23)
    PlaceBet {
        market_id: u64,
        selection: u8,
        amount: u64,
    },
    Claim {
        market_id: u64,
        stake_index: u32,
    },
    ClaimRefund {
        market_id: u64,
        stake_index: u32,
    },
    ClaimAll {
        market_id: u64,
    },
}

impl Instruction {
    /// Market the instruction targets, if any.
    pub fn market_id(&self) -> Option<u64> {
        match self {
            Self::Initialize { .. }
            | Self::Fund { .. }
            | Self::Withdraw { .. }
            | Self::SetPaused { .. } => None,
            Self::CreateMarket { market_id, .. }
            | Self::SetMarketState { market_id, .. }
            | Self::SetOdds { market_id, .. }
            | Self::ResolveMarket { market_id, .. }
            | Self::PlaceBet { market_id, .. }
            | Self::Claim { market_id, .. }
            | Self::ClaimRefund { market_id, .. }
            | Self::ClaimAll { market_id } => Some(*market_id),
        }
    }
}

impl Write for Instruction {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Initialize { config } => {
                0u8.write(writer);
                config.write(writer);
            }
            Self::Fund { amount } => {
                1u8.write(writer);
                amount.write(writer);
            }
            Self::Withdraw { amount } => {
                2u8.write(writer);
                amount.write(writer);
            }
            Self::SetPaused { paused } => {
                3u8.write(writer);
                paused.write(writer);
            }
            Self::CreateMarket {
                market_id,
                kind,
                odds,
            } => {
                10u8.write(writer);
                market_id.write(writer);
                kind.write(writer);
                odds.write(writer);
            }
            Self::SetMarketState { market_id, state } => {
                11u8.write(writer);
                market_id.write(writer);
                state.write(writer);
            }
            Self::SetOdds { market_id, odds } => {
                12u8.write(writer);
                market_id.write(writer);
                odds.write(writer);
            }
            Self::ResolveMarket { market_id, result } => {
                13u8.write(writer);
                market_id.write(writer);
                result.write(writer);
            }
            Self::PlaceBet {
                market_id,
                selection,
                amount,
            } => {
                20u8.write(writer);
                market_id.write(writer);
                selection.write(writer);
                amount.write(writer);
            }
            Self::Claim {
                market_id,
                stake_index,
            } => {
                21u8.write(writer);
                market_id.write(writer);
                stake_index.write(writer);
            }
            Self::ClaimRefund {
                market_id,
                stake_index,
            } => {
                22u8.write(writer);
                market_id.write(writer);
                stake_index.write(writer);
            }
            Self::ClaimAll { market_id } => {
                23u8.write(writer);
                market_id.write(writer);
            }
        }
    }
}

impl Read for Instruction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let instruction = match u8::read(reader)? {
            0 => Self::Initialize {
                config: LedgerConfig::read(reader)?,
            },
            1 => Self::Fund {
                amount: u64::read(reader)?,
            },
            2 => Self::Withdraw {
                amount: u64::read(reader)?,
            },
            3 => Self::SetPaused {
                paused: bool::read(reader)?,
            },
            10 => Self::CreateMarket {
                market_id: u64::read(reader)?,
                kind: MarketKind::read(reader)?,
                odds: Option::<Vec<u64>>::read_cfg(
                    reader,
                    &(RangeCfg::from(0..=MAX_OUTCOMES as usize), ()),
                )?,
            },
            11 => Self::SetMarketState {
                market_id: u64::read(reader)?,
                state: MarketState::read(reader)?,
            },
            12 => Self::SetOdds {
                market_id: u64::read(reader)?,
                odds: Vec::<u64>::read_range(reader, 0..=MAX_OUTCOMES as usize)?,
            },
            13 => Self::ResolveMarket {
                market_id: u64::read(reader)?,
                result: u8::read(reader)?,
            },
            20 => Self::PlaceBet {
                market_id: u64::read(reader)?,
                selection: u8::read(reader)?,
                amount: u64::read(reader)?,
            },
            21 => Self::Claim {
                market_id: u64::read(reader)?,
                stake_index: u32::read(reader)?,
            },
            22 => Self::ClaimRefund {
                market_id: u64::read(reader)?,
                stake_index: u32::read(reader)?,
            },
            23 => Self::ClaimAll {
                market_id: u64::read(reader)?,
            },
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(instruction)
    }
}

impl EncodeSize for Instruction {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Initialize { config } => config.encode_size(),
                Self::Fund { amount } | Self::Withdraw { amount } => amount.encode_size(),
                Self::SetPaused { paused } => paused.encode_size(),
                Self::CreateMarket {
                    market_id,
                    kind,
                    odds,
                } => market_id.encode_size() + kind.encode_size() + odds.encode_size(),
                Self::SetMarketState { market_id, state } => {
                    market_id.encode_size() + state.encode_size()
                }
                Self::SetOdds { market_id, odds } => market_id.encode_size() + odds.encode_size(),
                Self::ResolveMarket { market_id, result } => {
                    market_id.encode_size() + result.encode_size()
                }
                Self::PlaceBet {
                    market_id,
                    selection,
                    amount,
                } => market_id.encode_size() + selection.encode_size() + amount.encode_size(),
                Self::Claim {
                    market_id,
                    stake_index,
                }
                | Self::ClaimRefund {
                    market_id,
                    stake_index,
                } => market_id.encode_size() + stake_index.encode_size(),
                Self::ClaimAll { market_id } => market_id.encode_size(),
            }
    }
}

#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Clone, Debug)]
pub enum Key {
    // Ledger singletons (tags 0-2)
    Ledger,
    Reserve,
    Commit,

    // Per-market (tags 10-11)
    Market(u64),
    Odds(u64),

    // Per-owner stakes (tags 12-13)
    Stake {
        market_id: u64,
        owner: PublicKey,
        index: u32,
    },
    StakeCount {
        market_id: u64,
        owner: PublicKey,
    },
}

impl Write for Key {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Ledger => 0u8.write(writer),
            Self::Reserve => 1u8.write(writer),
            Self::Commit => 2u8.write(writer),
            Self::Market(id) => {
                10u8.write(writer);
                id.write(writer);
            }
            Self::Odds(id) => {
                11u8.write(writer);
                id.write(writer);
            }
            Self::Stake {
                market_id,
                owner,
                index,
            } => {
                12u8.write(writer);
                market_id.write(writer);
                owner.write(writer);
                index.write(writer);
            }
            Self::StakeCount { market_id, owner } => {
                13u8.write(writer);
                market_id.write(writer);
                owner.write(writer);
            }
        }
    }
}

impl Read for Key {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let key = match u8::read(reader)? {
            0 => Self::Ledger,
            1 => Self::Reserve,
            2 => Self::Commit,
            10 => Self::Market(u64::read(reader)?),
            11 => Self::Odds(u64::read(reader)?),
            12 => Self::Stake {
                market_id: u64::read(reader)?,
                owner: PublicKey::read(reader)?,
                index: u32::read(reader)?,
            },
            13 => Self::StakeCount {
                market_id: u64::read(reader)?,
                owner: PublicKey::read(reader)?,
            },
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(key)
    }
}

impl EncodeSize for Key {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Ledger | Self::Reserve | Self::Commit => 0,
                Self::Market(_) | Self::Odds(_) => u64::SIZE,
                Self::Stake { .. } => u64::SIZE + PublicKey::SIZE + u32::SIZE,
                Self::StakeCount { .. } => u64::SIZE + PublicKey::SIZE,
            }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
#[allow(clippy::large_enum_variant)]
pub enum Value {
    // Ledger singletons (tags 0-2)
    Ledger(LedgerState),
    Reserve(Reserve),
    Commit { height: u64 },

    // Per-market (tags 10-11)
    Market(Market),
    Odds(OddsRegistry),

    // Per-owner stakes (tags 12-13)
    Stake(Stake),
    StakeCount(u32),
}

impl Write for Value {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Ledger(ledger) => {
                0u8.write(writer);
                ledger.write(writer);
            }
            Self::Reserve(reserve) => {
                1u8.write(writer);
                reserve.write(writer);
            }
            Self::Commit { height } => {
                2u8.write(writer);
                height.write(writer);
            }
            Self::Market(market) => {
                10u8.write(writer);
                market.write(writer);
            }
            Self::Odds(registry) => {
                11u8.write(writer);
                registry.write(writer);
            }
            Self::Stake(stake) => {
                12u8.write(writer);
                stake.write(writer);
            }
            Self::StakeCount(count) => {
                13u8.write(writer);
                count.write(writer);
            }
        }
    }
}

impl Read for Value {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = match u8::read(reader)? {
            0 => Self::Ledger(LedgerState::read(reader)?),
            1 => Self::Reserve(Reserve::read(reader)?),
            2 => Self::Commit {
                height: u64::read(reader)?,
            },
            10 => Self::Market(Market::read(reader)?),
            11 => Self::Odds(OddsRegistry::read(reader)?),
            12 => Self::Stake(Stake::read(reader)?),
            13 => Self::StakeCount(u32::read(reader)?),
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(value)
    }
}

impl EncodeSize for Value {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Ledger(ledger) => ledger.encode_size(),
                Self::Reserve(reserve) => reserve.encode_size(),
                Self::Commit { height } => height.encode_size(),
                Self::Market(market) => market.encode_size(),
                Self::Odds(registry) => registry.encode_size(),
                Self::Stake(stake) => stake.encode_size(),
                Self::StakeCount(count) => count.encode_size(),
            }
    }
}

/// Notifications emitted for external indexers.
///
/// Every accepted state change produces at least one event; every refused instruction
/// produces exactly one `OperationRejected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    // Ledger (tags 10-13)
    LedgerInitialized {
        #[serde(with = "crate::serde_hex::public_key")]
        actor: PublicKey,
        config: LedgerConfig,
        timestamp: u64,
    },
    ReserveFunded {
        #[serde(with = "crate::serde_hex::public_key")]
        actor: PublicKey,
        amount: u64,
        balance: u64,
        timestamp: u64,
    },
    ReserveWithdrawn {
        #[serde(with = "crate::serde_hex::public_key")]
        actor: PublicKey,
        #[serde(with = "crate::serde_hex::public_key")]
        treasury: PublicKey,
        amount: u64,
        balance: u64,
        timestamp: u64,
    },
    PauseChanged {
        #[serde(with = "crate::serde_hex::public_key")]
        actor: PublicKey,
        paused: bool,
        timestamp: u64,
    },

    // Markets (tags 20-22)
    MarketCreated {
        market_id: u64,
        #[serde(with = "crate::serde_hex::public_key")]
        actor: PublicKey,
        kind: MarketKind,
        timestamp: u64,
    },
    MarketStateChanged {
        market_id: u64,
        #[serde(with = "crate::serde_hex::public_key")]
        actor: PublicKey,
        from: MarketState,
        to: MarketState,
        timestamp: u64,
    },
    OddsUpdated {
        market_id: u64,
        #[serde(with = "crate::serde_hex::public_key")]
        actor: PublicKey,
        odds_index: u32,
        odds: OddsSet,
        timestamp: u64,
    },

    // Stakes (tag 30)
    BetPlaced {
        market_id: u64,
        #[serde(with = "crate::serde_hex::public_key")]
        owner: PublicKey,
        stake_index: u32,
        amount: u64,
        selection: u8,
        odds_index: u32,
        locked_odds: u64,
        potential_payout: u64,
        timestamp: u64,
    },

    // Settlement (tags 40-44)
    MarketResolved {
        market_id: u64,
        #[serde(with = "crate::serde_hex::public_key")]
        actor: PublicKey,
        result: u8,
        total_pool: u64,
        released_liability: u64,
        timestamp: u64,
    },
    FeeCollected {
        market_id: u64,
        #[serde(with = "crate::serde_hex::public_key")]
        treasury: PublicKey,
        amount: u64,
        timestamp: u64,
    },
    PayoutClaimed {
        market_id: u64,
        #[serde(with = "crate::serde_hex::public_key")]
        owner: PublicKey,
        stake_index: u32,
        amount: u64,
        timestamp: u64,
    },
    RefundClaimed {
        market_id: u64,
        #[serde(with = "crate::serde_hex::public_key")]
        owner: PublicKey,
        stake_index: u32,
        amount: u64,
        timestamp: u64,
    },
    BatchClaimed {
        market_id: u64,
        #[serde(with = "crate::serde_hex::public_key")]
        owner: PublicKey,
        stakes: u32,
        amount: u64,
        timestamp: u64,
    },

    // Rejections (tag 50)
    OperationRejected {
        #[serde(with = "crate::serde_hex::public_key")]
        actor: PublicKey,
        market_id: Option<u64>,
        error_code: u8,
        message: String,
    },
}

impl Event {
    pub fn market_id(&self) -> Option<u64> {
        match self {
            Self::LedgerInitialized { .. }
            | Self::ReserveFunded { .. }
            | Self::ReserveWithdrawn { .. }
            | Self::PauseChanged { .. } => None,
            Self::MarketCreated { market_id, .. }
            | Self::MarketStateChanged { market_id, .. }
            | Self::OddsUpdated { market_id, .. }
            | Self::BetPlaced { market_id, .. }
            | Self::MarketResolved { market_id, .. }
            | Self::FeeCollected { market_id, .. }
            | Self::PayoutClaimed { market_id, .. }
            | Self::RefundClaimed { market_id, .. }
            | Self::BatchClaimed { market_id, .. } => Some(*market_id),
            Self::OperationRejected { market_id, .. } => *market_id,
        }
    }
}

impl Write for Event {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::LedgerInitialized {
                actor,
                config,
                timestamp,
            } => {
                10u8.write(writer);
                actor.write(writer);
                config.write(writer);
                timestamp.write(writer);
            }
            Self::ReserveFunded {
                actor,
                amount,
                balance,
                timestamp,
            } => {
                11u8.write(writer);
                actor.write(writer);
                amount.write(writer);
                balance.write(writer);
                timestamp.write(writer);
            }
            Self::ReserveWithdrawn {
                actor,
                treasury,
                amount,
                balance,
                timestamp,
            } => {
                12u8.write(writer);
                actor.write(writer);
                treasury.write(writer);
                amount.write(writer);
                balance.write(writer);
                timestamp.write(writer);
            }
            Self::PauseChanged {
                actor,
                paused,
                timestamp,
            } => {
                13u8.write(writer);
                actor.write(writer);
                paused.write(writer);
                timestamp.write(writer);
            }
            Self::MarketCreated {
                market_id,
                actor,
                kind,
                timestamp,
            } => {
                20u8.write(writer);
                market_id.write(writer);
                actor.write(writer);
                kind.write(writer);
                timestamp.write(writer);
            }
            Self::MarketStateChanged {
                market_id,
                actor,
                from,
                to,
                timestamp,
            } => {
                21u8.write(writer);
                market_id.write(writer);
                actor.write(writer);
                from.write(writer);
                to.write(writer);
                timestamp.write(writer);
            }
            Self::OddsUpdated {
                market_id,
                actor,
                odds_index,
                odds,
                timestamp,
            } => {
                22u8.write(writer);
                market_id.write(writer);
                actor.write(writer);
                odds_index.write(writer);
                odds.write(writer);
                timestamp.write(writer);
            }
            Self::BetPlaced {
                market_id,
                owner,
                stake_index,
                amount,
                selection,
                odds_index,
                locked_odds,
                potential_payout,
                timestamp,
            } => {
                30u8.write(writer);
                market_id.write(writer);
                owner.write(writer);
                stake_index.write(writer);
                amount.write(writer);
                selection.write(writer);
                odds_index.write(writer);
                locked_odds.write(writer);
                potential_payout.write(writer);
                timestamp.write(writer);
            }
            Self::MarketResolved {
                market_id,
                actor,
                result,
                total_pool,
                released_liability,
                timestamp,
            } => {
                40u8.write(writer);
                market_id.write(writer);
                actor.write(writer);
                result.write(writer);
                total_pool.write(writer);
                released_liability.write(writer);
                timestamp.write(writer);
            }
            Self::FeeCollected {
                market_id,
                treasury,
                amount,
                timestamp,
            } => {
                41u8.write(writer);
                market_id.write(writer);
                treasury.write(writer);
                amount.write(writer);
                timestamp.write(writer);
            }
            Self::PayoutClaimed {
                market_id,
                owner,
                stake_index,
                amount,
                timestamp,
            } => {
                42u8.write(writer);
                market_id.write(writer);
                owner.write(writer);
                stake_index.write(writer);
                amount.write(writer);
                timestamp.write(writer);
            }
            Self::RefundClaimed {
                market_id,
                owner,
                stake_index,
                amount,
                timestamp,
            } => {
                43u8.write(writer);
                market_id.write(writer);
                owner.write(writer);
                stake_index.write(writer);
                amount.write(writer);
                timestamp.write(writer);
            }
            Self::BatchClaimed {
                market_id,
                owner,
                stakes,
                amount,
                timestamp,
            } => {
                44u8.write(writer);
                market_id.write(writer);
                owner.write(writer);
                stakes.write(writer);
                amount.write(writer);
                timestamp.write(writer);
            }
            Self::OperationRejected {
                actor,
                market_id,
                error_code,
                message,
            } => {
                50u8.write(writer);
                actor.write(writer);
                market_id.write(writer);
                error_code.write(writer);
                write_message(message, writer);
            }
        }
    }
}

impl Read for Event {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let event = match u8::read(reader)? {
            10 => Self::LedgerInitialized {
                actor: PublicKey::read(reader)?,
                config: LedgerConfig::read(reader)?,
                timestamp: u64::read(reader)?,
            },
            11 => Self::ReserveFunded {
                actor: PublicKey::read(reader)?,
                amount: u64::read(reader)?,
                balance: u64::read(reader)?,
                timestamp: u64::read(reader)?,
            },
            12 => Self::ReserveWithdrawn {
                actor: PublicKey::read(reader)?,
                treasury: PublicKey::read(reader)?,
                amount: u64::read(reader)?,
                balance: u64::read(reader)?,
                timestamp: u64::read(reader)?,
            },
            13 => Self::PauseChanged {
                actor: PublicKey::read(reader)?,
                paused: bool::read(reader)?,
                timestamp: u64::read(reader)?,
            },
            20 => Self::MarketCreated {
                market_id: u64::read(reader)?,
                actor: PublicKey::read(reader)?,
                kind: MarketKind::read(reader)?,
                timestamp: u64::read(reader)?,
            },
            21 => Self::MarketStateChanged {
                market_id: u64::read(reader)?,
                actor: PublicKey::read(reader)?,
                from: MarketState::read(reader)?,
                to: MarketState::read(reader)?,
                timestamp: u64::read(reader)?,
            },
            22 => Self::OddsUpdated {
                market_id: u64::read(reader)?,
                actor: PublicKey::read(reader)?,
                odds_index: u32::read(reader)?,
                odds: OddsSet::read(reader)?,
                timestamp: u64::read(reader)?,
            },
            30 => Self::BetPlaced {
                market_id: u64::read(reader)?,
                owner: PublicKey::read(reader)?,
                stake_index: u32::read(reader)?,
                amount: u64::read(reader)?,
                selection: u8::read(reader)?,
                odds_index: u32::read(reader)?,
                locked_odds: u64::read(reader)?,
                potential_payout: u64::read(reader)?,
                timestamp: u64::read(reader)?,
            },
            40 => Self::MarketResolved {
                market_id: u64::read(reader)?,
                actor: PublicKey::read(reader)?,
                result: u8::read(reader)?,
                total_pool: u64::read(reader)?,
                released_liability: u64::read(reader)?,
                timestamp: u64::read(reader)?,
            },
            41 => Self::FeeCollected {
                market_id: u64::read(reader)?,
                treasury: PublicKey::read(reader)?,
                amount: u64::read(reader)?,
                timestamp: u64::read(reader)?,
            },
            42 => Self::PayoutClaimed {
                market_id: u64::read(reader)?,
                owner: PublicKey::read(reader)?,
                stake_index: u32::read(reader)?,
                amount: u64::read(reader)?,
                timestamp: u64::read(reader)?,
            },
            43 => Self::RefundClaimed {
                market_id: u64::read(reader)?,
                owner: PublicKey::read(reader)?,
                stake_index: u32::read(reader)?,
                amount: u64::read(reader)?,
                timestamp: u64::read(reader)?,
            },
            44 => Self::BatchClaimed {
                market_id: u64::read(reader)?,
                owner: PublicKey::read(reader)?,
                stakes: u32::read(reader)?,
                amount: u64::read(reader)?,
                timestamp: u64::read(reader)?,
            },
            50 => Self::OperationRejected {
                actor: PublicKey::read(reader)?,
                market_id: Option::<u64>::read(reader)?,
                error_code: u8::read(reader)?,
                message: read_message(reader, MAX_MESSAGE_LENGTH)?,
            },
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(event)
    }
}

impl EncodeSize for Event {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::LedgerInitialized { config, .. } => {
                    PublicKey::SIZE + config.encode_size() + u64::SIZE
                }
                Self::ReserveFunded { .. } => PublicKey::SIZE + 3 * u64::SIZE,
                Self::ReserveWithdrawn { .. } => 2 * PublicKey::SIZE + 3 * u64::SIZE,
                Self::PauseChanged { paused, .. } => {
                    PublicKey::SIZE + paused.encode_size() + u64::SIZE
                }
                Self::MarketCreated { kind, .. } => {
                    u64::SIZE + PublicKey::SIZE + kind.encode_size() + u64::SIZE
                }
                Self::MarketStateChanged { from, to, .. } => {
                    u64::SIZE + PublicKey::SIZE + from.encode_size() + to.encode_size() + u64::SIZE
                }
                Self::OddsUpdated { odds, .. } => {
                    u64::SIZE + PublicKey::SIZE + u32::SIZE + odds.encode_size() + u64::SIZE
                }
                Self::BetPlaced { .. } => {
                    u64::SIZE
                        + PublicKey::SIZE
                        + u32::SIZE
                        + u64::SIZE
                        + u8::SIZE
                        + u32::SIZE
                        + 3 * u64::SIZE
                }
                Self::MarketResolved { .. } => {
                    u64::SIZE + PublicKey::SIZE + u8::SIZE + 3 * u64::SIZE
                }
                Self::FeeCollected { .. } => u64::SIZE + PublicKey::SIZE + 2 * u64::SIZE,
                Self::PayoutClaimed { .. } | Self::RefundClaimed { .. } => {
                    u64::SIZE + PublicKey::SIZE + u32::SIZE + 2 * u64::SIZE
                }
                Self::BatchClaimed { .. } => {
                    u64::SIZE + PublicKey::SIZE + u32::SIZE + 2 * u64::SIZE
                }
                Self::OperationRejected {
                    market_id, message, ..
                } => {
                    PublicKey::SIZE + market_id.encode_size() + u8::SIZE + message_encode_size(message)
                }
            }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)]
pub enum Output {
    Event(Event),
    Transaction(Transaction),
    Commit { height: u64 },
}

impl Write for Output {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Event(event) => {
                0u8.write(writer);
                event.write(writer);
            }
            Self::Transaction(transaction) => {
                1u8.write(writer);
                transaction.write(writer);
            }
            Self::Commit { height } => {
                2u8.write(writer);
                height.write(writer);
            }
        }
    }
}

impl Read for Output {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(Self::Event(Event::read(reader)?)),
            1 => Ok(Self::Transaction(Transaction::read(reader)?)),
            2 => Ok(Self::Commit {
                height: u64::read(reader)?,
            }),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for Output {
    fn encode_size(&self) -> usize {
        1 + match self {
            Self::Event(event) => event.encode_size(),
            Self::Transaction(transaction) => transaction.encode_size(),
            Self::Commit { height } => height.encode_size(),
        }
    }
}
