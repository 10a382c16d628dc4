use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, ReadRangeExt, Write};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{LedgerError, MarketState, MAX_ODDS, MAX_ODDS_ENTRIES, MAX_OUTCOMES, MIN_ODDS};

/// One fixed-point multiplier per outcome of a market.
///
/// Every component lies in `[MIN_ODDS, MAX_ODDS]`; construction is the only place
/// this is checked.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u64>", into = "Vec<u64>")]
pub struct OddsSet(Vec<u64>);

impl OddsSet {
    pub fn new(values: Vec<u64>) -> Result<Self, LedgerError> {
        if values.len() < 2 || values.len() > MAX_OUTCOMES as usize {
            let expected = if values.len() < 2 { 2 } else { MAX_OUTCOMES };
            return Err(LedgerError::OddsShape {
                expected,
                got: values.len(),
            });
        }
        if let Some(value) = values.iter().find(|v| !(MIN_ODDS..=MAX_ODDS).contains(*v)) {
            return Err(LedgerError::OddsOutOfBounds { value: *value });
        }
        Ok(Self(values))
    }

    pub fn values(&self) -> &[u64] {
        &self.0
    }

    pub fn outcome_count(&self) -> usize {
        self.0.len()
    }

    /// Multiplier for `selection`, if the set covers it.
    pub fn get(&self, selection: u8) -> Option<u64> {
        self.0.get(selection as usize).copied()
    }
}

impl TryFrom<Vec<u64>> for OddsSet {
    type Error = LedgerError;

    fn try_from(values: Vec<u64>) -> Result<Self, Self::Error> {
        OddsSet::new(values)
    }
}

impl From<OddsSet> for Vec<u64> {
    fn from(odds: OddsSet) -> Self {
        odds.0
    }
}

impl Write for OddsSet {
    fn write(&self, writer: &mut impl BufMut) {
        self.0.write(writer);
    }
}

impl Read for OddsSet {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let values = Vec::<u64>::read_range(reader, 2..=MAX_OUTCOMES as usize)?;
        OddsSet::new(values).map_err(|_| Error::Invalid("OddsSet", "odds out of bounds"))
    }
}

impl EncodeSize for OddsSet {
    fn encode_size(&self) -> usize {
        self.0.encode_size()
    }
}

/// Append-only, deduplicated history of every odds set a market has offered.
///
/// Indices are 1-based so that a `current` of zero can mean "unset". An index, once
/// handed out, keeps resolving to the same odds for the life of the market.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OddsRegistry {
    outcome_count: u8,
    entries: Vec<OddsSet>,
    lookup: HashMap<OddsSet, u32>,
    current: u32,
}

impl OddsRegistry {
    pub fn new(outcome_count: u8) -> Self {
        Self {
            outcome_count,
            entries: Vec::new(),
            lookup: HashMap::new(),
            current: 0,
        }
    }

    pub fn outcome_count(&self) -> u8 {
        self.outcome_count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Zero when no odds have been set.
    pub fn current_index(&self) -> u32 {
        self.current
    }

    /// Returns the index already assigned to `odds`, appending it first if unseen.
    pub fn get_or_create_index(&mut self, odds: OddsSet) -> Result<u32, LedgerError> {
        if odds.outcome_count() != self.outcome_count as usize {
            return Err(LedgerError::OddsShape {
                expected: self.outcome_count,
                got: odds.outcome_count(),
            });
        }
        if let Some(index) = self.lookup.get(&odds) {
            return Ok(*index);
        }
        if self.entries.len() >= MAX_ODDS_ENTRIES {
            return Err(LedgerError::Overflow);
        }
        self.entries.push(odds.clone());
        let index = self.entries.len() as u32;
        self.lookup.insert(odds, index);
        Ok(index)
    }

    /// Points new stakes at `odds`. Only markets that are still inactive or open
    /// may change their odds.
    pub fn set_current(&mut self, state: MarketState, odds: OddsSet) -> Result<u32, LedgerError> {
        if !state.accepts_odds() {
            return Err(LedgerError::StateMismatch {
                required: &[MarketState::Inactive, MarketState::Open],
                actual: state,
            });
        }
        let index = self.get_or_create_index(odds)?;
        self.current = index;
        Ok(index)
    }

    pub fn current_odds(&self) -> Option<&OddsSet> {
        self.odds_at(self.current)
    }

    pub fn odds_at(&self, index: u32) -> Option<&OddsSet> {
        if index == 0 {
            return None;
        }
        self.entries.get(index as usize - 1)
    }

    pub fn index_of(&self, odds: &OddsSet) -> Option<u32> {
        self.lookup.get(odds).copied()
    }

    /// Multiplier stored at `index` for `selection`.
    pub fn locked_odds(&self, index: u32, selection: u8) -> Option<u64> {
        self.odds_at(index)?.get(selection)
    }
}

impl Write for OddsRegistry {
    fn write(&self, writer: &mut impl BufMut) {
        self.outcome_count.write(writer);
        self.entries.write(writer);
        self.current.write(writer);
    }
}

impl Read for OddsRegistry {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let outcome_count = u8::read(reader)?;
        if !(2..=MAX_OUTCOMES).contains(&outcome_count) {
            return Err(Error::Invalid("OddsRegistry", "outcome count out of range"));
        }
        let entries = Vec::<OddsSet>::read_range(reader, 0..=MAX_ODDS_ENTRIES)?;
        let current = u32::read(reader)?;
        if current as usize > entries.len() {
            return Err(Error::Invalid("OddsRegistry", "current index out of range"));
        }

        let mut lookup = HashMap::with_capacity(entries.len());
        for (position, odds) in entries.iter().enumerate() {
            if odds.outcome_count() != outcome_count as usize {
                return Err(Error::Invalid("OddsRegistry", "odds shape mismatch"));
            }
            if lookup.insert(odds.clone(), position as u32 + 1).is_some() {
                return Err(Error::Invalid("OddsRegistry", "duplicate odds"));
            }
        }

        Ok(Self {
            outcome_count,
            entries,
            lookup,
            current,
        })
    }
}

impl EncodeSize for OddsRegistry {
    fn encode_size(&self) -> usize {
        self.outcome_count.encode_size() + self.entries.encode_size() + self.current.encode_size()
    }
}
