use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};
use commonware_cryptography::ed25519::PublicKey;

use super::{LedgerError, PRECISION};

/// A single accepted wager.
///
/// `odds_index` is captured at acceptance and never rewritten; `claimed` only ever
/// moves from `false` to `true`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stake {
    pub owner: PublicKey,
    pub amount: u64,
    pub selection: u8,
    pub odds_index: u32,
    pub placed_at: u64,
    pub claimed: bool,
}

impl Stake {
    /// What this stake pays if `selection` wins at `locked_odds`.
    pub fn potential_payout(&self, locked_odds: u64) -> Result<u64, LedgerError> {
        payout(self.amount, locked_odds)
    }
}

/// `amount * odds / PRECISION`, rounded down.
pub fn payout(amount: u64, odds: u64) -> Result<u64, LedgerError> {
    let scaled = (amount as u128) * (odds as u128) / (PRECISION as u128);
    u64::try_from(scaled).map_err(|_| LedgerError::Overflow)
}

impl Write for Stake {
    fn write(&self, writer: &mut impl BufMut) {
        self.owner.write(writer);
        self.amount.write(writer);
        self.selection.write(writer);
        self.odds_index.write(writer);
        self.placed_at.write(writer);
        self.claimed.write(writer);
    }
}

impl Read for Stake {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let owner = PublicKey::read(reader)?;
        let amount = u64::read(reader)?;
        let selection = u8::read(reader)?;
        let odds_index = u32::read(reader)?;
        if odds_index == 0 {
            return Err(Error::Invalid("Stake", "stake without locked odds"));
        }
        let placed_at = u64::read(reader)?;
        let claimed = bool::read(reader)?;

        Ok(Self {
            owner,
            amount,
            selection,
            odds_index,
            placed_at,
            claimed,
        })
    }
}

impl EncodeSize for Stake {
    fn encode_size(&self) -> usize {
        self.owner.encode_size()
            + self.amount.encode_size()
            + self.selection.encode_size()
            + self.odds_index.encode_size()
            + self.placed_at.encode_size()
            + self.claimed.encode_size()
    }
}
