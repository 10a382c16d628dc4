use super::super::*;

impl<'a, S: State> Layer<'a, S> {
    pub(in crate::layer) fn handle_initialize(
        &mut self,
        public: &PublicKey,
        config: &oddsbook_types::wager::LedgerConfig,
    ) -> ExecutionResult<Vec<Event>> {
        if state::load_ledger(self)?.is_some() {
            return Err(LedgerError::AlreadyInitialized.into());
        }
        config.validate()?;

        let ledger = LedgerState::new(config.clone(), self.now_ms);
        self.insert(Key::Ledger, Value::Ledger(ledger));
        self.insert(Key::Reserve, Value::Reserve(Reserve::default()));

        info!(
            owner = ?config.owner,
            event_id = config.event_id,
            cutoff_ms = config.cutoff_ms,
            fee_bps = config.fee_bps,
            "ledger initialized"
        );
        Ok(vec![Event::LedgerInitialized {
            actor: public.clone(),
            config: config.clone(),
            timestamp: self.now_ms,
        }])
    }

    /// Emergency stop for stake placement. Settlement keeps working while paused.
    pub(in crate::layer) fn handle_set_paused(
        &mut self,
        public: &PublicKey,
        paused: bool,
    ) -> ExecutionResult<Vec<Event>> {
        let mut ledger = self.ledger()?;
        self.require(public, Capability::Guardian)?;

        ledger.paused = paused;
        self.insert(Key::Ledger, Value::Ledger(ledger));

        info!(actor = ?public, paused, "ledger pause changed");
        Ok(vec![Event::PauseChanged {
            actor: public.clone(),
            paused,
            timestamp: self.now_ms,
        }])
    }
}
