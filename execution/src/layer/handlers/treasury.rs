use super::super::*;

impl<'a, S: State> Layer<'a, S> {
    pub(in crate::layer) fn handle_fund(
        &mut self,
        public: &PublicKey,
        amount: u64,
    ) -> ExecutionResult<Vec<Event>> {
        self.ledger()?;
        self.require(public, Capability::Treasurer)?;
        if amount == 0 {
            return Err(LedgerError::ZeroAmount.into());
        }

        let mut reserve = self.reserve()?;
        reserve.deposit(amount)?;
        self.insert(Key::Reserve, Value::Reserve(reserve));
        self.debit(public, amount)?;

        info!(actor = ?public, amount, balance = reserve.balance, "reserve funded");
        Ok(vec![Event::ReserveFunded {
            actor: public.clone(),
            amount,
            balance: reserve.balance,
            timestamp: self.now_ms,
        }])
    }

    /// Sends reserve not backing any liability to the treasury.
    pub(in crate::layer) fn handle_withdraw(
        &mut self,
        public: &PublicKey,
        amount: u64,
    ) -> ExecutionResult<Vec<Event>> {
        let ledger = self.ledger()?;
        self.require(public, Capability::Treasurer)?;
        if amount == 0 {
            return Err(LedgerError::ZeroAmount.into());
        }

        let mut reserve = self.reserve()?;
        reserve.withdraw(amount)?;
        self.insert(Key::Reserve, Value::Reserve(reserve));
        let treasury = ledger.config.treasury;
        self.credit(&treasury, amount)?;

        info!(actor = ?public, amount, balance = reserve.balance, "reserve withdrawn");
        Ok(vec![Event::ReserveWithdrawn {
            actor: public.clone(),
            treasury,
            amount,
            balance: reserve.balance,
            timestamp: self.now_ms,
        }])
    }
}
