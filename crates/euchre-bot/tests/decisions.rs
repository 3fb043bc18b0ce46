use euchre_bot::config::{MonteCarloConfig, RolloutDriver};
use euchre_bot::policy::{
    Action, DecisionPhase, MonteCarloPolicy, Policy, PolicyContext, PolicyKind, PolicySet,
};
use euchre_bot::sim::{SimStats, bid_out};
use euchre_core::model::card::Card;
use euchre_core::model::deck::Deck;
use euchre_core::model::hand::Hand;
use euchre_core::model::player::PlayerPosition;
use euchre_core::model::round::{CARDS_IN_PLAY, RoundPhase, RoundState};

fn tiny_config(seed: u64) -> MonteCarloConfig {
    let driver = if seed % 3 == 0 {
        RolloutDriver::Softmax { temperature: 0.8 }
    } else {
        RolloutDriver::Heuristic
    };
    MonteCarloConfig::fast()
        .with_sims(2, 3)
        .with_seed(seed)
        .with_rollout_driver(driver)
        .with_parallel(seed % 4 == 1)
}

#[test]
fn monte_carlo_never_returns_an_illegal_play() {
    let mut contexts = 0usize;
    let mut total = SimStats::new();

    for seed in 0..80u64 {
        let dealer = PlayerPosition::LOOP[(seed % 4) as usize];
        let mut round = RoundState::deal(&Deck::shuffled_with_seed(seed), dealer);
        let mut bidders =
            PolicySet::uniform(&PolicyKind::Softmax { temperature: 1.5 }, seed).unwrap();
        bid_out(&mut round, &mut bidders, &mut SimStats::new()).unwrap();
        assert_eq!(round.phase(), RoundPhase::Playing);

        let mut policy = MonteCarloPolicy::new(tiny_config(seed));
        while let Some(seat) = round.to_act() {
            let legal = round.legal_cards(seat);
            let context = round.context_for(seat);
            let action = policy
                .decide(&PolicyContext::new(
                    DecisionPhase::PlayCard,
                    &context,
                    round.hand(seat),
                ))
                .unwrap();
            let Action::Play { card } = action else {
                panic!("expected a play, got {action:?}");
            };
            assert!(legal.contains(&card), "{card} is not legal for {seat}");
            contexts += 1;
            round.play_card(seat, card).unwrap();
            assert_eq!(round.card_total(), CARDS_IN_PLAY);
        }
        total.merge(policy.stats());
    }

    assert!(contexts >= 1000, "only {contexts} contexts checked");
    assert!(total.rollouts > 0);
    assert_eq!(total.illegal_corrections, 0);
}

#[test]
fn monte_carlo_bids_are_well_formed() {
    for seed in 0..40u64 {
        let dealer = PlayerPosition::LOOP[(seed % 4) as usize];
        let mut round = RoundState::deal(&Deck::shuffled_with_seed(seed + 500), dealer);
        let mut policy = MonteCarloPolicy::new(tiny_config(seed));
        while matches!(round.phase(), RoundPhase::OrderUp | RoundPhase::CallTrump) {
            let Some(seat) = round.to_act() else { break };
            let forced = round.phase() == RoundPhase::CallTrump && seat == round.dealer();
            let phase = match round.phase() {
                RoundPhase::OrderUp => DecisionPhase::OrderUp,
                _ if forced => DecisionPhase::CallTrumpForced,
                _ => DecisionPhase::CallTrump,
            };
            let context = round.context_for(seat);
            let action = policy
                .decide(&PolicyContext::new(phase, &context, round.hand(seat)))
                .unwrap();
            assert!(action.fits(phase), "{action:?} for {phase:?}");
            match action {
                Action::OrderUp { call, alone } => {
                    round.order_up(seat, call, alone).unwrap();
                }
                Action::CallTrump { suit, alone } => {
                    assert_ne!(suit, Some(round.upcard().suit));
                    round.call_trump(seat, suit, alone).unwrap();
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert!(matches!(
            round.phase(),
            RoundPhase::Discard | RoundPhase::Playing
        ));
    }
}

#[test]
fn unbeatable_hand_orders_up_alone() {
    let own: Vec<Card> = ["JH", "JD", "AH", "KH", "QH"]
        .iter()
        .map(|c| c.parse().unwrap())
        .collect();
    let round = {
        // North deals; East holds the top five hearts and the upcard is the nine.
        let mut rest: Vec<Card> = Deck::standard()
            .cards()
            .iter()
            .copied()
            .filter(|c| !own.contains(c) && c.to_string() != "9H")
            .collect();
        let mut hands: [Hand; 4] = Default::default();
        hands[PlayerPosition::East.index()] = Hand::with_cards(own.clone());
        for seat in [PlayerPosition::South, PlayerPosition::West, PlayerPosition::North] {
            hands[seat.index()] = Hand::with_cards(rest.drain(..5).collect());
        }
        RoundState::from_hands(PlayerPosition::North, hands, "9H".parse().unwrap())
    };
    let seat = PlayerPosition::East;
    let context = round.context_for(seat);
    let mut policy = MonteCarloPolicy::new(MonteCarloConfig::fast().with_seed(12));
    let action = policy
        .decide(&PolicyContext::new(
            DecisionPhase::OrderUp,
            &context,
            round.hand(seat),
        ))
        .unwrap();
    assert_eq!(
        action,
        Action::OrderUp {
            call: true,
            alone: true
        }
    );
}
