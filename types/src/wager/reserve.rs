use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};

use super::LedgerError;

/// Funds held by the ledger against the payouts it could owe.
///
/// Every operation that accepts liability re-checks `liability <= balance` against the
/// live counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Reserve {
    pub balance: u64,
    pub liability: u64,
}

impl Reserve {
    /// Checks that `potential` more liability is covered once `deposit` lands.
    pub fn admit(&self, potential: u64, deposit: u64) -> Result<(), LedgerError> {
        let required = self
            .liability
            .checked_add(potential)
            .ok_or(LedgerError::Overflow)?;
        let available = self
            .balance
            .checked_add(deposit)
            .ok_or(LedgerError::Overflow)?;
        if required > available {
            return Err(LedgerError::InsufficientLiquidity {
                liability: self.liability,
                potential,
                available,
            });
        }
        Ok(())
    }

    /// Admits and books a stake in one step.
    pub fn accept(&mut self, potential: u64, deposit: u64) -> Result<(), LedgerError> {
        self.admit(potential, deposit)?;
        self.balance += deposit;
        self.liability += potential;
        Ok(())
    }

    /// Drops liability that can no longer be owed. Clamped at zero.
    pub fn release(&mut self, amount: u64) {
        self.liability = self.liability.saturating_sub(amount);
    }

    /// Balance not earmarked for liability.
    pub fn free(&self) -> u64 {
        self.balance.saturating_sub(self.liability)
    }

    pub fn deposit(&mut self, amount: u64) -> Result<(), LedgerError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    /// Pays `amount` out of the balance (a payout or refund whose liability was released).
    pub fn disburse(&mut self, amount: u64) -> Result<(), LedgerError> {
        if amount > self.balance {
            return Err(LedgerError::InsufficientReserve {
                requested: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    /// Removes unencumbered funds.
    pub fn withdraw(&mut self, amount: u64) -> Result<(), LedgerError> {
        let free = self.free();
        if amount > free {
            return Err(LedgerError::InsufficientReserve {
                requested: amount,
                available: free,
            });
        }
        self.balance -= amount;
        Ok(())
    }
}

impl Write for Reserve {
    fn write(&self, writer: &mut impl BufMut) {
        self.balance.write(writer);
        self.liability.write(writer);
    }
}

impl Read for Reserve {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            balance: u64::read(reader)?,
            liability: u64::read(reader)?,
        })
    }
}

impl EncodeSize for Reserve {
    fn encode_size(&self) -> usize {
        self.balance.encode_size() + self.liability.encode_size()
    }
}
