use super::super::*;
use oddsbook_types::wager::{MarketKind, OddsSet};

impl<'a, S: State> Layer<'a, S> {
    pub(in crate::layer) fn handle_create_market(
        &mut self,
        public: &PublicKey,
        market_id: u64,
        kind: MarketKind,
        odds: Option<&[u64]>,
    ) -> ExecutionResult<Vec<Event>> {
        let ledger = self.ledger()?;
        self.require(public, Capability::MarketAdmin)?;

        let max = ledger.config.outcome_count;
        if !kind.is_valid() || kind.outcome_count() > max {
            return Err(LedgerError::InvalidMarketKind {
                outcomes: kind.outcome_count(),
                max,
            }
            .into());
        }
        if state::load_market(self, market_id)?.is_some() {
            return Err(LedgerError::MarketExists { market_id }.into());
        }
        let odds = odds.map(|values| OddsSet::new(values.to_vec())).transpose()?;

        let market = Market::new(market_id, kind, self.now_ms);
        let mut registry = OddsRegistry::new(kind.outcome_count());
        let mut events = vec![Event::MarketCreated {
            market_id,
            actor: public.clone(),
            kind,
            timestamp: self.now_ms,
        }];
        if let Some(odds) = odds {
            let odds_index = registry.set_current(market.state, odds.clone())?;
            events.push(Event::OddsUpdated {
                market_id,
                actor: public.clone(),
                odds_index,
                odds,
                timestamp: self.now_ms,
            });
        }

        self.insert(Key::Market(market_id), Value::Market(market));
        self.insert(Key::Odds(market_id), Value::Odds(registry));

        info!(market_id, ?kind, "market created");
        Ok(events)
    }

    /// Administrative lifecycle moves. Resolution has its own instruction.
    pub(in crate::layer) fn handle_set_market_state(
        &mut self,
        public: &PublicKey,
        market_id: u64,
        next: MarketState,
    ) -> ExecutionResult<Vec<Event>> {
        self.ledger()?;
        let guardian_may = matches!(next, MarketState::Cancelled | MarketState::Suspended);
        if !(guardian_may && self.require(public, Capability::Guardian).is_ok()) {
            self.require(public, Capability::MarketAdmin)?;
        }

        let mut market = self.market(market_id)?;
        if next == MarketState::Resolved {
            return Err(LedgerError::InvalidTransition {
                from: market.state,
                to: next,
            }
            .into());
        }
        let from = market.transition(next)?;
        self.log_transition(&market, from);
        self.insert(Key::Market(market_id), Value::Market(market));

        Ok(vec![Event::MarketStateChanged {
            market_id,
            actor: public.clone(),
            from,
            to: next,
            timestamp: self.now_ms,
        }])
    }
}
