use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::ed25519::PublicKey;
use serde::{Deserialize, Serialize};

use super::{LedgerError, BPS_DENOMINATOR, MAX_OUTCOMES};

/// Privileges an operation may require of its caller.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    MarketAdmin = 0,
    OddsManager = 1,
    Resolver = 2,
    Treasurer = 3,
    Guardian = 4,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::MarketAdmin,
        Capability::OddsManager,
        Capability::Resolver,
        Capability::Treasurer,
        Capability::Guardian,
    ];
}

impl TryFrom<u8> for Capability {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Capability::MarketAdmin),
            1 => Ok(Capability::OddsManager),
            2 => Ok(Capability::Resolver),
            3 => Ok(Capability::Treasurer),
            4 => Ok(Capability::Guardian),
            _ => Err(()),
        }
    }
}

impl Write for Capability {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for Capability {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = u8::read(reader)?;
        Capability::try_from(value).map_err(|_| Error::InvalidEnum(value))
    }
}

impl EncodeSize for Capability {
    fn encode_size(&self) -> usize {
        u8::SIZE
    }
}

/// Parameters fixed when a ledger instance is initialized for an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(with = "crate::serde_hex::public_key")]
    pub owner: PublicKey,
    pub event_id: u64,
    /// Stakes are refused from this instant on.
    pub cutoff_ms: u64,
    pub fee_bps: u16,
    #[serde(with = "crate::serde_hex::public_key")]
    pub treasury: PublicKey,
    /// Most outcomes any market on this event may declare.
    pub outcome_count: u8,
    /// Smallest stake accepted, measured in the reference unit. Zero disables the check.
    #[serde(default)]
    pub min_stake_reference: u64,
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.fee_bps as u64 > BPS_DENOMINATOR {
            return Err(LedgerError::InvalidConfig("fee_bps exceeds 10000"));
        }
        if !(2..=MAX_OUTCOMES).contains(&self.outcome_count) {
            return Err(LedgerError::InvalidConfig("outcome_count out of range"));
        }
        Ok(())
    }
}

impl Write for LedgerConfig {
    fn write(&self, writer: &mut impl BufMut) {
        self.owner.write(writer);
        self.event_id.write(writer);
        self.cutoff_ms.write(writer);
        self.fee_bps.write(writer);
        self.treasury.write(writer);
        self.outcome_count.write(writer);
        self.min_stake_reference.write(writer);
    }
}

impl Read for LedgerConfig {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            owner: PublicKey::read(reader)?,
            event_id: u64::read(reader)?,
            cutoff_ms: u64::read(reader)?,
            fee_bps: u16::read(reader)?,
            treasury: PublicKey::read(reader)?,
            outcome_count: u8::read(reader)?,
            min_stake_reference: u64::read(reader)?,
        })
    }
}

impl EncodeSize for LedgerConfig {
    fn encode_size(&self) -> usize {
        self.owner.encode_size()
            + self.event_id.encode_size()
            + self.cutoff_ms.encode_size()
            + self.fee_bps.encode_size()
            + self.treasury.encode_size()
            + self.outcome_count.encode_size()
            + self.min_stake_reference.encode_size()
    }
}

/// The persisted singleton describing an initialized ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerState {
    pub config: LedgerConfig,
    pub paused: bool,
    pub initialized_at: u64,
}

impl LedgerState {
    pub fn new(config: LedgerConfig, initialized_at: u64) -> Self {
        Self {
            config,
            paused: false,
            initialized_at,
        }
    }

    /// `total_pool * fee_bps / 10_000`, rounded down.
    pub fn fee_on(&self, total_pool: u64) -> u64 {
        let fee = (total_pool as u128) * (self.config.fee_bps as u128) / (BPS_DENOMINATOR as u128);
        fee as u64
    }
}

impl Write for LedgerState {
    fn write(&self, writer: &mut impl BufMut) {
        self.config.write(writer);
        self.paused.write(writer);
        self.initialized_at.write(writer);
    }
}

impl Read for LedgerState {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let config = LedgerConfig::read(reader)?;
        config
            .validate()
            .map_err(|_| Error::Invalid("LedgerState", "invalid config"))?;
        Ok(Self {
            config,
            paused: bool::read(reader)?,
            initialized_at: u64::read(reader)?,
        })
    }
}

impl EncodeSize for LedgerState {
    fn encode_size(&self) -> usize {
        self.config.encode_size() + self.paused.encode_size() + self.initialized_at.encode_size()
    }
}
