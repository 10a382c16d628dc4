use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, ReadRangeExt, Write};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{LedgerError, MAX_OUTCOMES};

/// Lifecycle of a market.
///
/// `Resolved` and `Cancelled` are terminal.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketState {
    Inactive = 0,
    Open = 1,
    Suspended = 2,
    Closed = 3,
    Resolved = 4,
    Cancelled = 5,
}

impl MarketState {
    pub fn is_terminal(self) -> bool {
        matches!(self, MarketState::Resolved | MarketState::Cancelled)
    }

    /// Whether the lifecycle permits moving from `self` to `next`.
    pub fn can_transition_to(self, next: MarketState) -> bool {
        use MarketState::*;
        matches!(
            (self, next),
            (Inactive, Open)
                | (Open, Suspended)
                | (Suspended, Open)
                | (Open, Closed)
                | (Suspended, Closed)
                | (Closed, Resolved)
                | (Inactive, Cancelled)
                | (Open, Cancelled)
                | (Suspended, Cancelled)
                | (Closed, Cancelled)
        )
    }

    /// Whether the odds registry may still grow.
    pub fn accepts_odds(self) -> bool {
        matches!(self, MarketState::Inactive | MarketState::Open)
    }
}

impl fmt::Display for MarketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MarketState::Inactive => "inactive",
            MarketState::Open => "open",
            MarketState::Suspended => "suspended",
            MarketState::Closed => "closed",
            MarketState::Resolved => "resolved",
            MarketState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

impl TryFrom<u8> for MarketState {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MarketState::Inactive),
            1 => Ok(MarketState::Open),
            2 => Ok(MarketState::Suspended),
            3 => Ok(MarketState::Closed),
            4 => Ok(MarketState::Resolved),
            5 => Ok(MarketState::Cancelled),
            _ => Err(()),
        }
    }
}

impl Write for MarketState {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for MarketState {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = u8::read(reader)?;
        MarketState::try_from(value).map_err(|_| Error::InvalidEnum(value))
    }
}

impl EncodeSize for MarketState {
    fn encode_size(&self) -> usize {
        u8::SIZE
    }
}

/// Shape of a market's outcome space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketKind {
    /// Home / draw / away.
    MatchResult,
    TwoWay,
    OverUnder,
    /// Arbitrary number of mutually exclusive outcomes.
    Outcomes(u8),
}

impl MarketKind {
    pub fn outcome_count(&self) -> u8 {
        match self {
            MarketKind::MatchResult => 3,
            MarketKind::TwoWay | MarketKind::OverUnder => 2,
            MarketKind::Outcomes(n) => *n,
        }
    }

    pub fn is_valid(&self) -> bool {
        (2..=MAX_OUTCOMES).contains(&self.outcome_count())
    }
}

impl Write for MarketKind {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            MarketKind::MatchResult => 0u8.write(writer),
            MarketKind::TwoWay => 1u8.write(writer),
            MarketKind::OverUnder => 2u8.write(writer),
            MarketKind::Outcomes(n) => {
                3u8.write(writer);
                n.write(writer);
            }
        }
    }
}

impl Read for MarketKind {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = match u8::read(reader)? {
            0 => MarketKind::MatchResult,
            1 => MarketKind::TwoWay,
            2 => MarketKind::OverUnder,
            3 => MarketKind::Outcomes(u8::read(reader)?),
            i => return Err(Error::InvalidEnum(i)),
        };
        if !kind.is_valid() {
            return Err(Error::Invalid("MarketKind", "outcome count out of range"));
        }
        Ok(kind)
    }
}

impl EncodeSize for MarketKind {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                MarketKind::Outcomes(_) => u8::SIZE,
                _ => 0,
            }
    }
}

/// A single event market and its accumulated totals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Market {
    pub id: u64,
    pub kind: MarketKind,
    pub state: MarketState,
    /// Winning selection, set exactly once on resolution.
    pub result: Option<u8>,
    pub created_at: u64,
    /// Zero until resolved.
    pub resolved_at: u64,
    /// Sum of every accepted stake amount.
    pub total_pool: u64,
    pub stake_count: u64,
    /// Unreleased potential payouts, one bucket per outcome.
    pub liability_by_outcome: Vec<u64>,
    pub fee_collected: u64,
}

impl Market {
    pub fn new(id: u64, kind: MarketKind, created_at: u64) -> Self {
        Self {
            id,
            kind,
            state: MarketState::Inactive,
            result: None,
            created_at,
            resolved_at: 0,
            total_pool: 0,
            stake_count: 0,
            liability_by_outcome: vec![0; kind.outcome_count() as usize],
            fee_collected: 0,
        }
    }

    pub fn outcome_count(&self) -> u8 {
        self.kind.outcome_count()
    }

    pub fn outstanding_liability(&self) -> u64 {
        self.liability_by_outcome
            .iter()
            .fold(0u64, |acc, v| acc.saturating_add(*v))
    }

    /// Fails with a state mismatch unless the market is in one of `required`.
    pub fn ensure_state(&self, required: &'static [MarketState]) -> Result<(), LedgerError> {
        if required.contains(&self.state) {
            return Ok(());
        }
        Err(LedgerError::StateMismatch {
            required,
            actual: self.state,
        })
    }

    /// Moves the market to `next`, returning the state it left.
    pub fn transition(&mut self, next: MarketState) -> Result<MarketState, LedgerError> {
        if !self.state.can_transition_to(next) {
            return Err(LedgerError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        let previous = self.state;
        self.state = next;
        Ok(previous)
    }
}

impl Write for Market {
    fn write(&self, writer: &mut impl BufMut) {
        self.id.write(writer);
        self.kind.write(writer);
        self.state.write(writer);
        self.result.write(writer);
        self.created_at.write(writer);
        self.resolved_at.write(writer);
        self.total_pool.write(writer);
        self.stake_count.write(writer);
        self.liability_by_outcome.write(writer);
        self.fee_collected.write(writer);
    }
}

impl Read for Market {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let id = u64::read(reader)?;
        let kind = MarketKind::read(reader)?;
        let state = MarketState::read(reader)?;
        let result = Option::<u8>::read(reader)?;
        let created_at = u64::read(reader)?;
        let resolved_at = u64::read(reader)?;
        let total_pool = u64::read(reader)?;
        let stake_count = u64::read(reader)?;
        let liability_by_outcome = Vec::<u64>::read_range(reader, 0..=MAX_OUTCOMES as usize)?;
        if liability_by_outcome.len() != kind.outcome_count() as usize {
            return Err(Error::Invalid("Market", "liability buckets do not match outcomes"));
        }
        if result.is_some_and(|r| r >= kind.outcome_count()) {
            return Err(Error::Invalid("Market", "result out of range"));
        }
        let fee_collected = u64::read(reader)?;

        Ok(Self {
            id,
            kind,
            state,
            result,
            created_at,
            resolved_at,
            total_pool,
            stake_count,
            liability_by_outcome,
            fee_collected,
        })
    }
}

impl EncodeSize for Market {
    fn encode_size(&self) -> usize {
        self.id.encode_size()
            + self.kind.encode_size()
            + self.state.encode_size()
            + self.result.encode_size()
            + self.created_at.encode_size()
            + self.resolved_at.encode_size()
            + self.total_pool.encode_size()
            + self.stake_count.encode_size()
            + self.liability_by_outcome.encode_size()
            + self.fee_collected.encode_size()
    }
}
