use super::super::*;
use oddsbook_types::wager::OddsSet;

impl<'a, S: State> Layer<'a, S> {
    /// Points new stakes at `odds`. Stakes already placed keep the index they locked.
    ///
    /// Bounds are checked here so an out-of-range quote is refused like any other.
    pub(in crate::layer) fn handle_set_odds(
        &mut self,
        public: &PublicKey,
        market_id: u64,
        odds: &[u64],
    ) -> ExecutionResult<Vec<Event>> {
        self.ledger()?;
        self.require(public, Capability::OddsManager)?;
        let market = self.market(market_id)?;
        let odds = OddsSet::new(odds.to_vec())?;
        let mut registry = self.registry(market_id)?;

        let known = registry.len();
        let odds_index = registry.set_current(market.state, odds.clone())?;
        debug!(
            market_id,
            odds_index,
            appended = registry.len() > known,
            "odds updated"
        );
        self.insert(Key::Odds(market_id), Value::Odds(registry));

        Ok(vec![Event::OddsUpdated {
            market_id,
            actor: public.clone(),
            odds_index,
            odds,
            timestamp: self.now_ms,
        }])
    }
}
