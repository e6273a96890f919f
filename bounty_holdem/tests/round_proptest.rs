/// Property-based tests for the round state machine and hand
/// evaluation, across randomly shuffled decks and action scripts.
use bounty_holdem::game::{
    Round, Transition,
    entities::{Action, ActionKind, Card, Chips, Deck, GameSettings, LegalActions, Suit},
    functional::{HandStrength, eval},
};
use proptest::prelude::*;

fn full_deck() -> Vec<Card> {
    let mut cards = Vec::with_capacity(52);
    for value in 2..=14u8 {
        for suit in Suit::ALL {
            cards.push(Card::new(value, suit));
        }
    }
    cards
}

// Strategy to generate a uniformly shuffled deck
fn deck_strategy() -> impl Strategy<Value = Deck> {
    Just(full_deck()).prop_shuffle().prop_map(|cards| {
        let cards: [Card; 52] = cards.try_into().unwrap();
        Deck::from_cards(cards)
    })
}

// Strategy to generate a bounty rank per player
fn bounty_strategy() -> impl Strategy<Value = u8> {
    2u8..=14
}

/// Maps one script byte onto a legal action, spreading raises across
/// the legal bounds.
fn scripted_action(byte: u8, legal: LegalActions, bounds: (Chips, Chips)) -> Action {
    let mut candidates = Vec::new();
    for kind in [
        ActionKind::Fold,
        ActionKind::Call,
        ActionKind::Check,
        ActionKind::Raise,
    ] {
        if legal.contains(kind) {
            candidates.push(kind);
        }
    }
    match candidates[byte as usize % candidates.len()] {
        ActionKind::Fold => Action::Fold,
        ActionKind::Call => Action::Call,
        ActionKind::Check => Action::Check,
        ActionKind::Raise => {
            let (min, max) = bounds;
            let span = max - min + 1;
            Action::Raise(min + Chips::from(byte) * 7 % span)
        }
    }
}

proptest! {
    #[test]
    fn scripted_rounds_conserve_chips_and_settle_zero_sum(
        deck in deck_strategy(),
        bounty0 in bounty_strategy(),
        bounty1 in bounty_strategy(),
        script in prop::collection::vec(any::<u8>(), 512),
    ) {
        let settings = GameSettings::default();
        let start = settings.starting_stack;
        let mut round = Round::new(settings.clone(), deck, [bounty0, bounty1]);
        let mut id = Round::ROOT;
        let mut terminal = None;
        for byte in script {
            let state = round.state(id);
            prop_assert_eq!(
                state.pips[0] + state.stacks[0] + state.pips[1] + state.stacks[1],
                2 * start,
                "chips leaked at a betting state",
            );
            let legal = round.legal_actions(id);
            let action = scripted_action(byte, legal, round.raise_bounds(id));
            match round.proceed(id, action).unwrap() {
                Transition::Continue(next) => id = next,
                Transition::Terminal(t) => {
                    terminal = Some(t);
                    break;
                }
            }
        }
        let terminal = terminal.expect("512 actions must finish any round");
        prop_assert_eq!(terminal.deltas[0] + terminal.deltas[1], 0);
        let bound = (f64::from(start) * settings.bounty_ratio).ceil() as i64
            + settings.bounty_constant;
        prop_assert!(terminal.deltas[0].abs() <= bound);
    }

    #[test]
    fn raise_bounds_are_ordered_and_enforced(
        deck in deck_strategy(),
        amount in 0u32..=1000,
    ) {
        let mut round = Round::new(GameSettings::default(), deck, [2, 2]);
        let (min, max) = round.raise_bounds(Round::ROOT);
        prop_assert!(min <= max);
        let result = round.proceed(Round::ROOT, Action::Raise(amount));
        if (min..=max).contains(&amount) {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(result.is_err());
        }
    }

    #[test]
    fn seven_card_eval_matches_its_best_five_card_subset(deck in deck_strategy()) {
        let mut deck = deck;
        let seven = deck.deal(7);
        let full = eval(&seven);
        let mut best: Option<HandStrength> = None;
        for skip_a in 0..7 {
            for skip_b in (skip_a + 1)..7 {
                let subset: Vec<Card> = seven
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != skip_a && *i != skip_b)
                    .map(|(_, c)| *c)
                    .collect();
                let strength = eval(&subset);
                best = Some(best.map_or(strength, |b| b.max(strength)));
            }
        }
        prop_assert_eq!(Some(full), best);
    }

    #[test]
    fn bounty_hits_follow_dealt_cards(
        deck in deck_strategy(),
        bounty0 in bounty_strategy(),
        bounty1 in bounty_strategy(),
    ) {
        let round = Round::new(GameSettings::default(), deck, [bounty0, bounty1]);
        let hits = round.bounty_hits(Round::ROOT);
        // Pre-flop, only the hole cards can hit.
        let hands = round.hands();
        prop_assert_eq!(hits[0], hands[0].iter().any(|c| c.value == bounty0));
        prop_assert_eq!(hits[1], hands[1].iter().any(|c| c.value == bounty1));
    }
}
