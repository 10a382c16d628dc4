use super::super::*;
use oddsbook_types::wager::payout;

impl<'a, S: State> Layer<'a, S> {
    /// Accepts a stake at the market's current odds.
    ///
    /// The odds index captured here is the only one the stake is ever settled against.
    pub(in crate::layer) fn handle_place_bet(
        &mut self,
        public: &PublicKey,
        market_id: u64,
        selection: u8,
        amount: u64,
    ) -> ExecutionResult<Vec<Event>> {
        let ledger = self.ledger()?;
        if ledger.paused {
            return Err(LedgerError::LedgerPaused.into());
        }
        if self.now_ms >= ledger.config.cutoff_ms {
            return Err(LedgerError::BettingClosed {
                cutoff_ms: ledger.config.cutoff_ms,
            }
            .into());
        }

        let mut market = self.market(market_id)?;
        market.ensure_state(&[MarketState::Open])?;
        if amount == 0 {
            return Err(LedgerError::ZeroAmount.into());
        }
        if !self.env.selections.is_valid(&market.kind, selection) {
            return Err(LedgerError::InvalidSelection { selection }.into());
        }

        let registry = self.registry(market_id)?;
        let odds_index = registry.current_index();
        if odds_index == 0 {
            return Err(LedgerError::OddsUnset.into());
        }
        let locked_odds = registry
            .locked_odds(odds_index, selection)
            .ok_or(LedgerError::InvalidSelection { selection })?;

        let minimum = ledger.config.min_stake_reference;
        if minimum > 0 {
            let reference = self
                .env
                .oracle
                .to_reference(amount)
                .map_err(|err| LedgerError::PriceUnavailable(err.to_string()))?;
            if reference < minimum {
                return Err(LedgerError::StakeBelowMinimum { reference, minimum }.into());
            }
        }

        let potential_payout = payout(amount, locked_odds)?;
        let mut reserve = self.reserve()?;
        reserve.accept(potential_payout, amount)?;

        market.total_pool = market
            .total_pool
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        market.stake_count += 1;
        let bucket = market
            .liability_by_outcome
            .get_mut(selection as usize)
            .ok_or(LedgerError::InvalidSelection { selection })?;
        *bucket = bucket
            .checked_add(potential_payout)
            .ok_or(LedgerError::Overflow)?;

        let stake_index = state::stake_count(self, market_id, public)?;
        let next_index = stake_index.checked_add(1).ok_or(LedgerError::Overflow)?;
        let stake = Stake {
            owner: public.clone(),
            amount,
            selection,
            odds_index,
            placed_at: self.now_ms,
            claimed: false,
        };
        self.insert(
            Key::Stake {
                market_id,
                owner: public.clone(),
                index: stake_index,
            },
            Value::Stake(stake),
        );
        self.insert(
            Key::StakeCount {
                market_id,
                owner: public.clone(),
            },
            Value::StakeCount(next_index),
        );
        self.insert(Key::Market(market_id), Value::Market(market));
        self.insert(Key::Reserve, Value::Reserve(reserve));
        self.debit(public, amount)?;

        debug!(
            market_id,
            owner = ?public,
            stake_index,
            amount,
            selection,
            locked_odds,
            liability = reserve.liability,
            "stake accepted"
        );
        Ok(vec![Event::BetPlaced {
            market_id,
            owner: public.clone(),
            stake_index,
            amount,
            selection,
            odds_index,
            locked_odds,
            potential_payout,
            timestamp: self.now_ms,
        }])
    }
}
