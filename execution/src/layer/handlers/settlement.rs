use super::super::*;
use super::SETTLEABLE;

/// Marks `stake` claimed, releases its liability and returns what it pays out.
///
/// Resolved markets pay the stake's locked odds; cancelled markets return principal.
/// The payout always comes from the stake's own `odds_index`, never the current odds.
fn settle_stake(
    market: &mut Market,
    registry: &OddsRegistry,
    reserve: &mut Reserve,
    stake: &mut Stake,
) -> ExecutionResult<u64> {
    let locked_odds = registry
        .locked_odds(stake.odds_index, stake.selection)
        .ok_or_else(|| {
            anyhow!(
                "stake locked odds index {} missing from market {}",
                stake.odds_index,
                market.id
            )
        })?;
    let potential = stake.potential_payout(locked_odds)?;
    let amount = match market.state {
        MarketState::Resolved => potential,
        MarketState::Cancelled => stake.amount,
        actual => {
            return Err(LedgerError::StateMismatch {
                required: SETTLEABLE,
                actual,
            }
            .into())
        }
    };

    stake.claimed = true;
    if let Some(bucket) = market.liability_by_outcome.get_mut(stake.selection as usize) {
        *bucket = bucket.saturating_sub(potential);
    }
    reserve.release(potential);
    reserve.disburse(amount)?;
    Ok(amount)
}

impl<'a, S: State> Layer<'a, S> {
    /// Fixes the winning outcome, releases losing liability and takes the fee.
    pub(in crate::layer) fn handle_resolve_market(
        &mut self,
        public: &PublicKey,
        market_id: u64,
        result: u8,
    ) -> ExecutionResult<Vec<Event>> {
        let ledger = self.ledger()?;
        self.require(public, Capability::Resolver)?;

        let mut market = self.market(market_id)?;
        if market.state == MarketState::Resolved {
            return Err(LedgerError::AlreadySettled.into());
        }
        market.ensure_state(&[MarketState::Open, MarketState::Closed])?;
        if !self.env.selections.is_valid(&market.kind, result) {
            return Err(LedgerError::InvalidSelection { selection: result }.into());
        }

        let mut released = 0u64;
        for (outcome, bucket) in market.liability_by_outcome.iter_mut().enumerate() {
            if outcome != result as usize {
                released = released.saturating_add(*bucket);
                *bucket = 0;
            }
        }
        let mut reserve = self.reserve()?;
        reserve.release(released);
        let fee = ledger.fee_on(market.total_pool).min(reserve.free());
        reserve.disburse(fee)?;

        let from = market.state;
        market.state = MarketState::Resolved;
        market.result = Some(result);
        market.resolved_at = self.now_ms;
        market.fee_collected = fee;
        self.log_transition(&market, from);

        let total_pool = market.total_pool;
        self.insert(Key::Market(market_id), Value::Market(market));
        self.insert(Key::Reserve, Value::Reserve(reserve));
        let treasury = ledger.config.treasury;
        if fee > 0 {
            self.credit(&treasury, fee)?;
        }

        info!(market_id, result, released, fee, "market resolved");
        let mut events = vec![
            Event::MarketStateChanged {
                market_id,
                actor: public.clone(),
                from,
                to: MarketState::Resolved,
                timestamp: self.now_ms,
            },
            Event::MarketResolved {
                market_id,
                actor: public.clone(),
                result,
                total_pool,
                released_liability: released,
                timestamp: self.now_ms,
            },
        ];
        if fee > 0 {
            info!(market_id, fee, treasury = ?treasury, "fee collected");
            events.push(Event::FeeCollected {
                market_id,
                treasury,
                amount: fee,
                timestamp: self.now_ms,
            });
        }
        Ok(events)
    }

    pub(in crate::layer) fn handle_claim(
        &mut self,
        public: &PublicKey,
        market_id: u64,
        stake_index: u32,
    ) -> ExecutionResult<Vec<Event>> {
        self.ledger()?;
        let mut market = self.market(market_id)?;
        market.ensure_state(&[MarketState::Resolved])?;
        let mut stake = self.stake(market_id, public, stake_index)?;
        if stake.claimed {
            return Err(LedgerError::AlreadyClaimed.into());
        }
        if market.result != Some(stake.selection) {
            return Err(LedgerError::StakeLost.into());
        }

        let registry = self.registry(market_id)?;
        let mut reserve = self.reserve()?;
        let amount = settle_stake(&mut market, &registry, &mut reserve, &mut stake)?;
        self.store_settlement(market, reserve, public, stake_index, stake);
        self.credit(public, amount)?;

        debug!(market_id, owner = ?public, stake_index, amount, "payout claimed");
        Ok(vec![Event::PayoutClaimed {
            market_id,
            owner: public.clone(),
            stake_index,
            amount,
            timestamp: self.now_ms,
        }])
    }

    pub(in crate::layer) fn handle_claim_refund(
        &mut self,
        public: &PublicKey,
        market_id: u64,
        stake_index: u32,
    ) -> ExecutionResult<Vec<Event>> {
        self.ledger()?;
        let mut market = self.market(market_id)?;
        market.ensure_state(&[MarketState::Cancelled])?;
        let mut stake = self.stake(market_id, public, stake_index)?;
        if stake.claimed {
            return Err(LedgerError::AlreadyClaimed.into());
        }

        let registry = self.registry(market_id)?;
        let mut reserve = self.reserve()?;
        let amount = settle_stake(&mut market, &registry, &mut reserve, &mut stake)?;
        self.store_settlement(market, reserve, public, stake_index, stake);
        self.credit(public, amount)?;

        debug!(market_id, owner = ?public, stake_index, amount, "refund claimed");
        Ok(vec![Event::RefundClaimed {
            market_id,
            owner: public.clone(),
            stake_index,
            amount,
            timestamp: self.now_ms,
        }])
    }

    /// Settles every eligible stake the caller holds on a market with one transfer.
    ///
    /// Claimed stakes are skipped, as are losing stakes on a resolved market.
    pub(in crate::layer) fn handle_claim_all(
        &mut self,
        public: &PublicKey,
        market_id: u64,
    ) -> ExecutionResult<Vec<Event>> {
        self.ledger()?;
        let mut market = self.market(market_id)?;
        market.ensure_state(SETTLEABLE)?;
        let registry = self.registry(market_id)?;
        let mut reserve = self.reserve()?;
        let refunding = market.state == MarketState::Cancelled;

        let mut events = Vec::new();
        let mut total = 0u64;
        let mut settled = 0u32;
        for stake_index in 0..state::stake_count(self, market_id, public)? {
            let mut stake = self.stake(market_id, public, stake_index)?;
            if stake.claimed || (!refunding && market.result != Some(stake.selection)) {
                continue;
            }
            let amount = settle_stake(&mut market, &registry, &mut reserve, &mut stake)?;
            total = total.checked_add(amount).ok_or(LedgerError::Overflow)?;
            settled += 1;
            self.insert(
                Key::Stake {
                    market_id,
                    owner: public.clone(),
                    index: stake_index,
                },
                Value::Stake(stake),
            );
            events.push(if refunding {
                Event::RefundClaimed {
                    market_id,
                    owner: public.clone(),
                    stake_index,
                    amount,
                    timestamp: self.now_ms,
                }
            } else {
                Event::PayoutClaimed {
                    market_id,
                    owner: public.clone(),
                    stake_index,
                    amount,
                    timestamp: self.now_ms,
                }
            });
        }
        if settled == 0 {
            return Err(LedgerError::NothingToClaim.into());
        }

        self.insert(Key::Market(market_id), Value::Market(market));
        self.insert(Key::Reserve, Value::Reserve(reserve));
        self.credit(public, total)?;

        debug!(market_id, owner = ?public, settled, total, "batch claimed");
        events.push(Event::BatchClaimed {
            market_id,
            owner: public.clone(),
            stakes: settled,
            amount: total,
            timestamp: self.now_ms,
        });
        Ok(events)
    }

    fn store_settlement(
        &mut self,
        market: Market,
        reserve: Reserve,
        owner: &PublicKey,
        stake_index: u32,
        stake: Stake,
    ) {
        let market_id = market.id;
        self.insert(Key::Market(market_id), Value::Market(market));
        self.insert(Key::Reserve, Value::Reserve(reserve));
        self.insert(
            Key::Stake {
                market_id,
                owner: owner.clone(),
                index: stake_index,
            },
            Value::Stake(stake),
        );
    }
}
