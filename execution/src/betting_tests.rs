//! Stake admission tests.
//!
//! Covers the admission gates (pause, cutoff, state, selection, minimum stake), odds
//! locking, pool accounting and the solvency check.

#[cfg(test)]
mod tests {
    use crate::mocks::{account, ledger_config, rejection, FixedPrice, Harness, TransferRecord};
    use oddsbook_types::{
        execution::{Event, Instruction},
        wager::{
            MarketKind, MarketState, ERROR_BETTING_CLOSED, ERROR_INSUFFICIENT_LIQUIDITY,
            ERROR_INVALID_SELECTION, ERROR_LEDGER_PAUSED, ERROR_ODDS_UNSET,
            ERROR_PRICE_UNAVAILABLE, ERROR_STAKE_BELOW_MINIMUM, ERROR_STATE_MISMATCH,
            ERROR_TRANSFER_FAILED, ERROR_UNKNOWN_MARKET, ERROR_ZERO_AMOUNT,
        },
    };

    const MARKET: u64 = 7;
    const ODDS: [u64; 3] = [22_000, 33_000, 28_000];

    fn harness(reserve: u64) -> Harness {
        let owner = account(1);
        let treasury = account(2);
        let mut harness = Harness::new(owner.clone());
        harness.initialize(ledger_config(&owner, &treasury), reserve);
        harness.open_market(MARKET, MarketKind::MatchResult, &ODDS);
        harness
    }

    fn set_odds(harness: &mut Harness, values: &[u64]) -> Vec<Event> {
        harness.admin(Instruction::SetOdds {
            market_id: MARKET,
            odds: values.to_vec(),
        })
    }

    #[test]
    fn test_bet_locks_current_odds() {
        let mut harness = harness(10_000);
        let bettor = account(10);

        let events = harness.bet(&bettor, MARKET, 0, 100);
        assert_eq!(
            events,
            vec![Event::BetPlaced {
                market_id: MARKET,
                owner: bettor.clone(),
                stake_index: 0,
                amount: 100,
                selection: 0,
                odds_index: 1,
                locked_odds: 22_000,
                potential_payout: 220,
                timestamp: harness.now_ms,
            }]
        );

        let stakes = harness.stakes(MARKET, &bettor);
        assert_eq!(stakes.len(), 1);
        assert_eq!(stakes[0].odds_index, 1);
        assert!(!stakes[0].claimed);
        assert_eq!(harness.transfers.balance(&bettor), 0);
        assert_eq!(
            harness.transfers.records().last(),
            Some(&TransferRecord::Debit(bettor, 100))
        );
    }

    #[test]
    fn test_odds_change_only_affects_later_bets() {
        let mut harness = harness(10_000);
        let early = account(10);
        let late = account(11);

        harness.bet(&early, MARKET, 0, 100);
        assert!(rejection(&set_odds(&mut harness, &[25_000, 33_000, 28_000])).is_none());
        harness.bet(&late, MARKET, 0, 100);

        let early_stake = harness.stakes(MARKET, &early).remove(0);
        let late_stake = harness.stakes(MARKET, &late).remove(0);
        assert_eq!(early_stake.odds_index, 1);
        assert_eq!(late_stake.odds_index, 2);

        let registry = harness.registry(MARKET);
        assert_eq!(registry.locked_odds(early_stake.odds_index, 0), Some(22_000));
        assert_eq!(registry.locked_odds(late_stake.odds_index, 0), Some(25_000));
    }

    #[test]
    fn test_repeating_odds_reuses_index() {
        let mut harness = harness(10_000);

        let events = set_odds(&mut harness, &ODDS);
        assert!(matches!(
            events.as_slice(),
            [Event::OddsUpdated { odds_index: 1, .. }]
        ));
        set_odds(&mut harness, &[25_000, 33_000, 28_000]);
        let events = set_odds(&mut harness, &ODDS);
        assert!(matches!(
            events.as_slice(),
            [Event::OddsUpdated { odds_index: 1, .. }]
        ));

        let registry = harness.registry(MARKET);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.current_index(), 1);
    }

    #[test]
    fn test_total_pool_tracks_every_stake() {
        let mut harness = harness(100_000);
        let amounts = [100u64, 250, 75, 1, 999];
        for (i, amount) in amounts.iter().enumerate() {
            let bettor = account(10 + (i as u64 % 2));
            let events = harness.bet(&bettor, MARKET, (i % 3) as u8, *amount);
            assert!(rejection(&events).is_none(), "{events:?}");
        }

        let market = harness.market(MARKET);
        assert_eq!(market.total_pool, amounts.iter().sum::<u64>());
        assert_eq!(market.stake_count, amounts.len() as u64);

        let staked: u64 = [account(10), account(11)]
            .iter()
            .flat_map(|bettor| harness.stakes(MARKET, bettor))
            .map(|stake| stake.amount)
            .sum();
        assert_eq!(market.total_pool, staked);
        assert_eq!(market.outstanding_liability(), harness.reserve().liability);
    }

    #[test]
    fn test_solvency_rejects_without_side_effects() {
        let mut harness = harness(810);
        let first = account(10);
        let second = account(11);
        set_odds(&mut harness, &[50_000, 30_000, 30_000]);

        // 190 at 5.0x books 950 against a balance of 1000.
        assert!(rejection(&harness.bet(&first, MARKET, 0, 190)).is_none());
        let reserve = harness.reserve();
        assert_eq!(reserve.balance, 1_000);
        assert_eq!(reserve.liability, 950);
        let market_before = harness.market(MARKET);

        // 20 at 5.0x needs 100 more: 1050 > 1020.
        let events = harness.bet(&second, MARKET, 0, 20);
        assert_eq!(rejection(&events), Some(ERROR_INSUFFICIENT_LIQUIDITY));

        assert_eq!(harness.reserve(), reserve);
        assert_eq!(harness.market(MARKET), market_before);
        assert!(harness.stakes(MARKET, &second).is_empty());
        assert_eq!(harness.transfers.balance(&second), 20);
    }

    #[test]
    fn test_incoming_deposit_counts_toward_solvency() {
        // Empty reserve: 100 at 2.2x needs 220 but only 100 arrives.
        let mut harness = harness(0);
        let bettor = account(10);
        assert_eq!(
            rejection(&harness.bet(&bettor, MARKET, 0, 100)),
            Some(ERROR_INSUFFICIENT_LIQUIDITY)
        );

        // With 120 in reserve the stake itself covers the rest exactly.
        let owner = harness.owner.clone();
        harness.transfers.fund(&owner, 120);
        assert!(rejection(&harness.admin(Instruction::Fund { amount: 120 })).is_none());
        assert!(rejection(&harness.submit(
            &bettor,
            Instruction::PlaceBet {
                market_id: MARKET,
                selection: 0,
                amount: 100,
            }
        ))
        .is_none());
        assert_eq!(harness.reserve().liability, 220);
        assert_eq!(harness.reserve().free(), 0);
    }

    #[test]
    fn test_bet_requires_open_market() {
        let mut harness = harness(10_000);
        let bettor = account(10);

        harness.admin(Instruction::SetMarketState {
            market_id: MARKET,
            state: MarketState::Suspended,
        });
        assert_eq!(
            rejection(&harness.bet(&bettor, MARKET, 0, 100)),
            Some(ERROR_STATE_MISMATCH)
        );

        harness.admin(Instruction::SetMarketState {
            market_id: MARKET,
            state: MarketState::Open,
        });
        assert!(rejection(&harness.bet(&bettor, MARKET, 0, 100)).is_none());

        assert_eq!(
            rejection(&harness.bet(&bettor, MARKET + 1, 0, 100)),
            Some(ERROR_UNKNOWN_MARKET)
        );
    }

    #[test]
    fn test_bet_rejects_bad_input() {
        let mut harness = harness(10_000);
        let bettor = account(10);

        assert_eq!(
            rejection(&harness.bet(&bettor, MARKET, 0, 0)),
            Some(ERROR_ZERO_AMOUNT)
        );
        assert_eq!(
            rejection(&harness.bet(&bettor, MARKET, 3, 100)),
            Some(ERROR_INVALID_SELECTION)
        );
        assert_eq!(harness.market(MARKET).total_pool, 0);
    }

    #[test]
    fn test_bet_requires_odds() {
        let mut harness = harness(10_000);
        let bettor = account(10);
        harness.admin(Instruction::CreateMarket {
            market_id: 9,
            kind: MarketKind::TwoWay,
            odds: None,
        });
        harness.admin(Instruction::SetMarketState {
            market_id: 9,
            state: MarketState::Open,
        });

        assert_eq!(
            rejection(&harness.bet(&bettor, 9, 0, 100)),
            Some(ERROR_ODDS_UNSET)
        );
    }

    #[test]
    fn test_pause_blocks_bets_only() {
        let mut harness = harness(10_000);
        let bettor = account(10);

        assert!(rejection(&harness.admin(Instruction::SetPaused { paused: true })).is_none());
        assert_eq!(
            rejection(&harness.bet(&bettor, MARKET, 0, 100)),
            Some(ERROR_LEDGER_PAUSED)
        );
        // Odds management is unaffected.
        assert!(rejection(&set_odds(&mut harness, &[25_000, 33_000, 28_000])).is_none());

        harness.admin(Instruction::SetPaused { paused: false });
        assert!(rejection(&harness.bet(&bettor, MARKET, 0, 100)).is_none());
    }

    #[test]
    fn test_cutoff_closes_betting() {
        let owner = account(1);
        let mut config = ledger_config(&owner, &account(2));
        config.cutoff_ms = 5_000;
        let mut harness = Harness::new(owner);
        harness.initialize(config, 10_000);
        harness.open_market(MARKET, MarketKind::MatchResult, &ODDS);
        let bettor = account(10);

        harness.now_ms = 4_999;
        assert!(rejection(&harness.bet(&bettor, MARKET, 0, 100)).is_none());
        harness.now_ms = 5_000;
        assert_eq!(
            rejection(&harness.bet(&bettor, MARKET, 0, 100)),
            Some(ERROR_BETTING_CLOSED)
        );
    }

    #[test]
    fn test_minimum_stake_uses_price_reference() {
        let owner = account(1);
        let mut config = ledger_config(&owner, &account(2));
        config.min_stake_reference = 50;
        let mut harness = Harness::new(owner);
        harness.initialize(config, 10_000);
        harness.open_market(MARKET, MarketKind::MatchResult, &ODDS);
        let bettor = account(10);

        // Half a reference unit per stake unit.
        harness.oracle = FixedPrice::Rate(5_000);
        assert_eq!(
            rejection(&harness.bet(&bettor, MARKET, 0, 99)),
            Some(ERROR_STAKE_BELOW_MINIMUM)
        );
        assert!(rejection(&harness.bet(&bettor, MARKET, 0, 100)).is_none());

        harness.oracle = FixedPrice::Unavailable;
        assert_eq!(
            rejection(&harness.bet(&bettor, MARKET, 0, 1_000)),
            Some(ERROR_PRICE_UNAVAILABLE)
        );
        harness.oracle = FixedPrice::Stale(60_000);
        let events = harness.bet(&bettor, MARKET, 0, 1_000);
        match events.as_slice() {
            [Event::OperationRejected {
                error_code,
                message,
                ..
            }] => {
                assert_eq!(*error_code, ERROR_PRICE_UNAVAILABLE);
                assert!(message.contains("stale"), "{message}");
            }
            other => panic!("unexpected events: {other:?}"),
        }
        assert_eq!(harness.stakes(MARKET, &bettor).len(), 1);
    }

    #[test]
    fn test_failed_debit_rolls_back_bet() {
        let mut harness = harness(10_000);
        let bettor = account(10);
        let reserve = harness.reserve();

        // Wallet is empty, so the debit fails after every check passed.
        let events = harness.submit(
            &bettor,
            Instruction::PlaceBet {
                market_id: MARKET,
                selection: 0,
                amount: 100,
            },
        );
        assert_eq!(rejection(&events), Some(ERROR_TRANSFER_FAILED));
        assert_eq!(harness.reserve(), reserve);
        assert_eq!(harness.market(MARKET).total_pool, 0);
        assert!(harness.stakes(MARKET, &bettor).is_empty());

        harness.transfers.fund(&bettor, 100);
        let events = harness.submit(
            &bettor,
            Instruction::PlaceBet {
                market_id: MARKET,
                selection: 0,
                amount: 100,
            },
        );
        assert!(matches!(
            events.as_slice(),
            [Event::BetPlaced { stake_index: 0, .. }]
        ));
    }
}
