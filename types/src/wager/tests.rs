use super::*;
use crate::execution::{Event, Instruction, Key, Value};
use commonware_codec::{DecodeExt, Encode, ReadExt};
use commonware_cryptography::{ed25519::PrivateKey, Signer};
use proptest::prelude::*;

fn odds(values: &[u64]) -> OddsSet {
    OddsSet::new(values.to_vec()).expect("valid odds")
}

#[test]
fn test_odds_set_rejects_out_of_bounds_component() {
    assert_eq!(
        OddsSet::new(vec![22_000, MIN_ODDS - 1]),
        Err(LedgerError::OddsOutOfBounds {
            value: MIN_ODDS - 1
        })
    );
    assert_eq!(
        OddsSet::new(vec![MAX_ODDS + 1, 22_000]),
        Err(LedgerError::OddsOutOfBounds {
            value: MAX_ODDS + 1
        })
    );
    assert!(OddsSet::new(vec![MIN_ODDS, MAX_ODDS]).is_ok());
}

#[test]
fn test_odds_set_rejects_bad_length() {
    assert!(matches!(
        OddsSet::new(vec![]),
        Err(LedgerError::OddsShape { got: 0, .. })
    ));
    assert!(matches!(
        OddsSet::new(vec![20_000; MAX_OUTCOMES as usize + 1]),
        Err(LedgerError::OddsShape { .. })
    ));
}

#[test]
fn test_registry_dedups_and_keeps_indices() {
    let mut registry = OddsRegistry::new(3);
    assert_eq!(registry.current_index(), 0);
    assert!(registry.current_odds().is_none());

    let first = registry
        .set_current(MarketState::Inactive, odds(&[22_000, 33_000, 28_000]))
        .unwrap();
    let second = registry
        .set_current(MarketState::Open, odds(&[25_000, 33_000, 28_000]))
        .unwrap();
    let again = registry
        .set_current(MarketState::Open, odds(&[22_000, 33_000, 28_000]))
        .unwrap();

    assert_eq!((first, second, again), (1, 2, 1));
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.current_index(), 1);
    assert_eq!(registry.locked_odds(2, 0), Some(25_000));
    assert_eq!(registry.locked_odds(0, 0), None);
    assert_eq!(registry.locked_odds(3, 0), None);
}

#[test]
fn test_registry_rejects_wrong_shape() {
    let mut registry = OddsRegistry::new(3);
    assert_eq!(
        registry.get_or_create_index(odds(&[20_000, 20_000])),
        Err(LedgerError::OddsShape {
            expected: 3,
            got: 2
        })
    );
    assert!(registry.is_empty());
}

#[test]
fn test_registry_frozen_outside_inactive_and_open() {
    let mut registry = OddsRegistry::new(2);
    for state in [
        MarketState::Suspended,
        MarketState::Closed,
        MarketState::Resolved,
        MarketState::Cancelled,
    ] {
        assert!(matches!(
            registry.set_current(state, odds(&[19_000, 19_000])),
            Err(LedgerError::StateMismatch { actual, .. }) if actual == state
        ));
    }
    assert!(registry.is_empty());
}

#[test]
fn test_registry_decode_rebuilds_lookup() {
    let mut registry = OddsRegistry::new(2);
    registry
        .set_current(MarketState::Open, odds(&[15_000, 26_000]))
        .unwrap();
    registry
        .set_current(MarketState::Open, odds(&[16_000, 24_000]))
        .unwrap();

    let decoded = OddsRegistry::decode(registry.encode()).unwrap();
    assert_eq!(decoded, registry);
    assert_eq!(decoded.index_of(&odds(&[15_000, 26_000])), Some(1));
}

#[test]
fn test_registry_decode_rejects_duplicates() {
    let set = odds(&[15_000, 26_000]);
    let mut buf = Vec::new();
    commonware_codec::Write::write(&2u8, &mut buf);
    commonware_codec::Write::write(&vec![set.clone(), set], &mut buf);
    commonware_codec::Write::write(&1u32, &mut buf);
    assert!(OddsRegistry::decode(buf.as_slice()).is_err());
}

#[test]
fn test_registry_decode_rejects_dangling_current() {
    let mut buf = Vec::new();
    commonware_codec::Write::write(&2u8, &mut buf);
    commonware_codec::Write::write(&vec![odds(&[15_000, 26_000])], &mut buf);
    commonware_codec::Write::write(&2u32, &mut buf);
    assert!(OddsRegistry::decode(buf.as_slice()).is_err());
}

#[test]
fn test_market_transitions() {
    use MarketState::*;
    let allowed = [
        (Inactive, Open),
        (Open, Suspended),
        (Suspended, Open),
        (Open, Closed),
        (Suspended, Closed),
        (Closed, Resolved),
        (Inactive, Cancelled),
        (Open, Cancelled),
        (Suspended, Cancelled),
        (Closed, Cancelled),
    ];
    let all = [Inactive, Open, Suspended, Closed, Resolved, Cancelled];
    for from in all {
        for to in all {
            assert_eq!(
                from.can_transition_to(to),
                allowed.contains(&(from, to)),
                "{from} -> {to}"
            );
        }
    }
    for terminal in [Resolved, Cancelled] {
        assert!(terminal.is_terminal());
        assert!(all.iter().all(|to| !terminal.can_transition_to(*to)));
    }
}

#[test]
fn test_market_transition_keeps_state_on_error() {
    let mut market = Market::new(7, MarketKind::MatchResult, 1_000);
    assert_eq!(market.liability_by_outcome, vec![0, 0, 0]);
    assert_eq!(
        market.transition(MarketState::Closed),
        Err(LedgerError::InvalidTransition {
            from: MarketState::Inactive,
            to: MarketState::Closed,
        })
    );
    assert_eq!(market.state, MarketState::Inactive);
    assert_eq!(market.transition(MarketState::Open), Ok(MarketState::Inactive));
    assert_eq!(market.state, MarketState::Open);
}

#[test]
fn test_market_kind_outcomes() {
    assert_eq!(MarketKind::MatchResult.outcome_count(), 3);
    assert_eq!(MarketKind::TwoWay.outcome_count(), 2);
    assert_eq!(MarketKind::OverUnder.outcome_count(), 2);
    assert!(MarketKind::Outcomes(MAX_OUTCOMES).is_valid());
    assert!(!MarketKind::Outcomes(1).is_valid());
    assert!(!MarketKind::Outcomes(MAX_OUTCOMES + 1).is_valid());

    let encoded = MarketKind::Outcomes(1).encode();
    assert!(MarketKind::decode(encoded).is_err());
}

#[test]
fn test_market_decode_checks_buckets() {
    let mut market = Market::new(1, MarketKind::TwoWay, 0);
    market.liability_by_outcome.push(5);
    assert!(Market::decode(market.encode()).is_err());

    let market = Market::new(1, MarketKind::TwoWay, 0);
    assert_eq!(Market::decode(market.encode()).unwrap(), market);
}

#[test]
fn test_payout_rounds_down() {
    assert_eq!(payout(100, 22_000), Ok(220));
    assert_eq!(payout(3, 15_000), Ok(4));
    assert_eq!(payout(u64::MAX, MAX_ODDS), Err(LedgerError::Overflow));
}

#[test]
fn test_ledger_config_validation() {
    let owner = PrivateKey::from_seed(1).public_key();
    let mut config = LedgerConfig {
        owner: owner.clone(),
        event_id: 9,
        cutoff_ms: 10_000,
        fee_bps: 250,
        treasury: owner,
        outcome_count: 3,
        min_stake_reference: 0,
    };
    assert!(config.validate().is_ok());

    config.fee_bps = 10_001;
    assert!(matches!(
        config.validate(),
        Err(LedgerError::InvalidConfig(_))
    ));

    config.fee_bps = 10_000;
    config.outcome_count = 1;
    assert!(matches!(
        config.validate(),
        Err(LedgerError::InvalidConfig(_))
    ));

    let state = LedgerState::new(
        LedgerConfig {
            outcome_count: 3,
            fee_bps: 250,
            ..config
        },
        0,
    );
    assert_eq!(state.fee_on(10_000), 250);
    assert_eq!(state.fee_on(39), 0);
}

#[test]
fn test_stake_value_roundtrip() {
    let stake = Stake {
        owner: PrivateKey::from_seed(3).public_key(),
        amount: 100,
        selection: 0,
        odds_index: 2,
        placed_at: 55,
        claimed: false,
    };
    let value = Value::Stake(stake);
    let decoded = Value::read(&mut &value.encode()[..]).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn test_stake_decode_rejects_unlocked_odds() {
    let stake = Stake {
        owner: PrivateKey::from_seed(3).public_key(),
        amount: 100,
        selection: 0,
        odds_index: 0,
        placed_at: 55,
        claimed: false,
    };
    assert!(Stake::decode(stake.encode()).is_err());
}

#[test]
fn test_keys_order_by_owner_then_index() {
    let owner = PrivateKey::from_seed(4).public_key();
    let key = |index| Key::Stake {
        market_id: 1,
        owner: owner.clone(),
        index,
    };
    assert!(key(0) < key(1));
    let encoded = key(3).encode();
    assert_eq!(encoded.len(), commonware_codec::EncodeSize::encode_size(&key(3)));
    assert_eq!(Key::decode(encoded).unwrap(), key(3));
}

#[test]
fn test_instruction_from_json() {
    let instruction: Instruction = serde_json::from_str(
        r#"{"op":"create_market","market_id":4,"kind":"match_result","odds":[22000,33000,28000]}"#,
    )
    .unwrap();
    assert_eq!(
        instruction,
        Instruction::CreateMarket {
            market_id: 4,
            kind: MarketKind::MatchResult,
            odds: Some(vec![22_000, 33_000, 28_000]),
        }
    );

    // Out-of-range odds still parse; the ledger refuses them on execution.
    let unchecked: Instruction =
        serde_json::from_str(r#"{"op":"set_odds","market_id":4,"odds":[100,33000,28000]}"#)
            .unwrap();
    assert_eq!(
        unchecked,
        Instruction::SetOdds {
            market_id: 4,
            odds: vec![100, 33_000, 28_000],
        }
    );
}

#[test]
fn test_event_json_uses_hex_keys() {
    let owner = PrivateKey::from_seed(5).public_key();
    let event = Event::PayoutClaimed {
        market_id: 1,
        owner: owner.clone(),
        stake_index: 0,
        amount: 220,
        timestamp: 10,
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "payout_claimed");
    assert_eq!(
        json["owner"],
        crate::serde_hex::encode_public_key(&owner).as_str()
    );
    let encoded = event.encode();
    assert_eq!(Event::decode(encoded).unwrap(), event);
}

#[test]
fn test_rejection_event_bounds_message() {
    let event = Event::OperationRejected {
        actor: PrivateKey::from_seed(6).public_key(),
        market_id: None,
        error_code: ERROR_NOT_INITIALIZED,
        message: "x".repeat(MAX_MESSAGE_LENGTH + 1),
    };
    assert!(Event::decode(event.encode()).is_err());
}

fn arb_odds_set(outcomes: usize) -> impl Strategy<Value = OddsSet> {
    prop::collection::vec(MIN_ODDS..=MIN_ODDS + 8, outcomes)
        .prop_map(|values| OddsSet::new(values).expect("bounded odds"))
}

proptest! {
    /// Property: the registry never holds duplicates and a value always maps back to
    /// the index it was first given.
    #[test]
    fn prop_registry_is_deduplicated(updates in prop::collection::vec(arb_odds_set(2), 1..64)) {
        let mut registry = OddsRegistry::new(2);
        let mut first_seen: Vec<(OddsSet, u32)> = Vec::new();
        for set in updates {
            let index = registry.set_current(MarketState::Open, set.clone()).unwrap();
            match first_seen.iter().find(|(seen, _)| *seen == set) {
                Some((_, original)) => prop_assert_eq!(index, *original),
                None => first_seen.push((set.clone(), index)),
            }
            prop_assert_eq!(registry.current_odds(), Some(&set));
        }
        prop_assert_eq!(registry.len(), first_seen.len());
        for (set, index) in &first_seen {
            prop_assert_eq!(registry.odds_at(*index), Some(set));
        }
    }
}
