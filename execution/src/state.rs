use anyhow::{anyhow, Result};
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};
use commonware_cryptography::ed25519::PublicKey;
use oddsbook_types::{
    execution::{Key, Value},
    wager::{LedgerState, Market, OddsRegistry, Reserve, Stake},
};
use std::collections::BTreeMap;

/// Key-value storage the engine reads from and commits into.
///
/// Operations never suspend: a read either returns or fails with a storage error.
pub trait State {
    fn get(&self, key: &Key) -> Result<Option<Value>>;
    fn insert(&mut self, key: Key, value: Value) -> Result<()>;
    fn delete(&mut self, key: &Key) -> Result<()>;

    fn apply(&mut self, changes: Vec<(Key, Status)>) -> Result<()> {
        for (key, status) in changes {
            match status {
                Status::Update(value) => self.insert(key, value)?,
                Status::Delete => self.delete(&key)?,
            }
        }
        Ok(())
    }
}

/// In-memory state, ordered by key so dumps are deterministic.
#[derive(Default, Debug, Clone)]
pub struct Memory {
    state: BTreeMap<Key, Value>,
}

impl Memory {
    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.state.iter()
    }
}

impl State for Memory {
    fn get(&self, key: &Key) -> Result<Option<Value>> {
        Ok(self.state.get(key).cloned())
    }

    fn insert(&mut self, key: Key, value: Value) -> Result<()> {
        self.state.insert(key, value);
        Ok(())
    }

    fn delete(&mut self, key: &Key) -> Result<()> {
        self.state.remove(key);
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)]
pub enum Status {
    Update(Value),
    Delete,
}

impl Write for Status {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Status::Update(value) => {
                0u8.write(writer);
                value.write(writer);
            }
            Status::Delete => 1u8.write(writer),
        }
    }
}

impl Read for Status {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(Status::Update(Value::read(reader)?)),
            1 => Ok(Status::Delete),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for Status {
    fn encode_size(&self) -> usize {
        1 + match self {
            Status::Update(value) => value.encode_size(),
            Status::Delete => 0,
        }
    }
}

fn unexpected(key: &Key) -> anyhow::Error {
    anyhow!("unexpected value stored under {key:?}")
}

pub fn load_ledger<S: State>(state: &S) -> Result<Option<LedgerState>> {
    match state.get(&Key::Ledger)? {
        Some(Value::Ledger(ledger)) => Ok(Some(ledger)),
        None => Ok(None),
        Some(_) => Err(unexpected(&Key::Ledger)),
    }
}

/// The reserve, or an empty one if the ledger was never funded.
pub fn load_reserve<S: State>(state: &S) -> Result<Reserve> {
    match state.get(&Key::Reserve)? {
        Some(Value::Reserve(reserve)) => Ok(reserve),
        None => Ok(Reserve::default()),
        Some(_) => Err(unexpected(&Key::Reserve)),
    }
}

pub fn load_market<S: State>(state: &S, market_id: u64) -> Result<Option<Market>> {
    let key = Key::Market(market_id);
    match state.get(&key)? {
        Some(Value::Market(market)) => Ok(Some(market)),
        None => Ok(None),
        Some(_) => Err(unexpected(&key)),
    }
}

pub fn load_registry<S: State>(state: &S, market_id: u64) -> Result<Option<OddsRegistry>> {
    let key = Key::Odds(market_id);
    match state.get(&key)? {
        Some(Value::Odds(registry)) => Ok(Some(registry)),
        None => Ok(None),
        Some(_) => Err(unexpected(&key)),
    }
}

pub fn load_stake<S: State>(
    state: &S,
    market_id: u64,
    owner: &PublicKey,
    index: u32,
) -> Result<Option<Stake>> {
    let key = Key::Stake {
        market_id,
        owner: owner.clone(),
        index,
    };
    match state.get(&key)? {
        Some(Value::Stake(stake)) => Ok(Some(stake)),
        None => Ok(None),
        Some(_) => Err(unexpected(&key)),
    }
}

/// Number of stakes `owner` has placed on `market_id`.
pub fn stake_count<S: State>(state: &S, market_id: u64, owner: &PublicKey) -> Result<u32> {
    let key = Key::StakeCount {
        market_id,
        owner: owner.clone(),
    };
    match state.get(&key)? {
        Some(Value::StakeCount(count)) => Ok(count),
        None => Ok(0),
        Some(_) => Err(unexpected(&key)),
    }
}

/// Every stake `owner` has placed on `market_id`, in placement order.
pub fn load_stakes<S: State>(state: &S, market_id: u64, owner: &PublicKey) -> Result<Vec<Stake>> {
    let count = stake_count(state, market_id, owner)?;
    let mut stakes = Vec::with_capacity(count as usize);
    for index in 0..count {
        let stake = load_stake(state, market_id, owner, index)?
            .ok_or_else(|| anyhow!("stake {index} missing from market {market_id}"))?;
        stakes.push(stake);
    }
    Ok(stakes)
}

pub fn committed_height<S: State>(state: &S) -> Result<u64> {
    match state.get(&Key::Commit)? {
        Some(Value::Commit { height }) => Ok(height),
        None => Ok(0),
        Some(_) => Err(unexpected(&Key::Commit)),
    }
}
