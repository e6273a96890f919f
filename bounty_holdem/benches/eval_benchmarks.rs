use bounty_holdem::{
    Round, Transition,
    entities::{Action, Card, Deck, GameSettings, Suit},
    functional::eval,
};
use criterion::{Criterion, criterion_group, criterion_main};

fn hand(cards: &[&str]) -> Vec<Card> {
    cards.iter().map(|s| s.parse().unwrap()).collect()
}

/// Benchmark hand evaluation with 7 cards (hole cards + full board)
fn bench_hand_eval_7_cards(c: &mut Criterion) {
    let royal = hand(&["As", "Ks", "Qs", "Js", "Ts", "2h", "3d"]);
    let air = hand(&["9s", "Jh", "7d", "6c", "5d", "2c", "3h"]);

    c.bench_function("hand_eval_royal_flush", |b| {
        b.iter(|| eval(&royal));
    });
    c.bench_function("hand_eval_high_card", |b| {
        b.iter(|| eval(&air));
    });
}

/// Benchmark a full round played to showdown with no betting
fn bench_checked_down_round(c: &mut Criterion) {
    let mut cards = Vec::with_capacity(52);
    for value in 2..=14u8 {
        for suit in Suit::ALL {
            cards.push(Card::new(value, suit));
        }
    }
    let cards: [Card; 52] = cards.try_into().unwrap();

    c.bench_function("checked_down_round", |b| {
        b.iter(|| {
            let mut round =
                Round::new(GameSettings::default(), Deck::from_cards(cards), [2, 14]);
            let mut id = Round::ROOT;
            let mut action = Action::Call;
            loop {
                match round.proceed(id, action).unwrap() {
                    Transition::Continue(next) => {
                        id = next;
                        action = Action::Check;
                    }
                    Transition::Terminal(terminal) => break terminal,
                }
            }
        });
    });
}

criterion_group!(
    benches,
    bench_hand_eval_7_cards,
    bench_checked_down_round
);
criterion_main!(benches);
