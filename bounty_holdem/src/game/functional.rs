//! Seven-card hand evaluation.
//!
//! [`eval`] reduces a hand of 5 to 7 cards to a single packed value that
//! orders identically to poker hand strength, so showdown is one integer
//! comparison. Categories are detected from rank and suit histograms in
//! descending strength order; the best five cards within the winning
//! category supply the tiebreakers.

use super::entities::{Card, Value};

/// Packed, comparable hand strength. Higher is better.
///
/// Layout (most significant first): category in bits 20.., then five
/// 4-bit tiebreaker values in descending significance.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct HandStrength(u32);

impl HandStrength {
    #[must_use]
    pub fn category(self) -> HandCategory {
        match self.0 >> 20 {
            0 => HandCategory::HighCard,
            1 => HandCategory::OnePair,
            2 => HandCategory::TwoPair,
            3 => HandCategory::ThreeOfAKind,
            4 => HandCategory::Straight,
            5 => HandCategory::Flush,
            6 => HandCategory::FullHouse,
            7 => HandCategory::FourOfAKind,
            _ => HandCategory::StraightFlush,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
#[repr(u8)]
pub enum HandCategory {
    HighCard = 0,
    OnePair = 1,
    TwoPair = 2,
    ThreeOfAKind = 3,
    Straight = 4,
    Flush = 5,
    FullHouse = 6,
    FourOfAKind = 7,
    StraightFlush = 8,
}

/// Evaluates the best five-card hand within `cards` (5 to 7 of them).
#[must_use]
pub fn eval(cards: &[Card]) -> HandStrength {
    debug_assert!((5..=7).contains(&cards.len()));
    let mut counts = [0u8; 15];
    let mut suits = [0u16; 4];
    for card in cards {
        counts[card.value as usize] += 1;
        suits[card.suit as usize] |= 1 << card.value;
    }

    let flush_mask = suits.iter().copied().find(|m| m.count_ones() >= 5);
    if let Some(mask) = flush_mask {
        if let Some(high) = straight_high(mask) {
            return pack(HandCategory::StraightFlush, [high, 0, 0, 0, 0]);
        }
    }

    if let Some(quad) = values_with_count(&counts, 4).first().copied() {
        let kicker = kickers(&counts, &[quad], 1)[0];
        return pack(HandCategory::FourOfAKind, [quad, kicker, 0, 0, 0]);
    }

    let trips = values_with_count(&counts, 3);
    let pairs = values_with_count(&counts, 2);
    if let Some(&over) = trips.first() {
        // A second set fills the house as the pair.
        let under = trips.get(1).copied().or_else(|| pairs.first().copied());
        if let Some(under) = under {
            return pack(HandCategory::FullHouse, [over, under, 0, 0, 0]);
        }
    }

    if let Some(mask) = flush_mask {
        return pack(HandCategory::Flush, top_five(mask));
    }

    let union = suits.iter().fold(0, |acc, m| acc | m);
    if let Some(high) = straight_high(union) {
        return pack(HandCategory::Straight, [high, 0, 0, 0, 0]);
    }

    if let Some(&trip) = trips.first() {
        let ks = kickers(&counts, &[trip], 2);
        return pack(HandCategory::ThreeOfAKind, [trip, ks[0], ks[1], 0, 0]);
    }

    if pairs.len() >= 2 {
        // With three pairs in seven cards, the third pair's value is
        // still a kicker candidate.
        let kicker = kickers(&counts, &pairs[..2], 1)[0];
        return pack(HandCategory::TwoPair, [pairs[0], pairs[1], kicker, 0, 0]);
    }

    if let Some(&pair) = pairs.first() {
        let ks = kickers(&counts, &[pair], 3);
        return pack(HandCategory::OnePair, [pair, ks[0], ks[1], ks[2], 0]);
    }

    let ks = kickers(&counts, &[], 5);
    pack(HandCategory::HighCard, [ks[0], ks[1], ks[2], ks[3], ks[4]])
}

fn pack(category: HandCategory, values: [Value; 5]) -> HandStrength {
    let mut packed = (category as u32) << 20;
    for (i, v) in values.iter().enumerate() {
        packed |= u32::from(*v) << (16 - 4 * i as u32);
    }
    HandStrength(packed)
}

/// Highest straight top card within a rank bitmask, wheel included.
fn straight_high(mask: u16) -> Option<Value> {
    // The ace also plays low.
    let mask = if mask & (1 << 14) != 0 { mask | 1 << 1 } else { mask };
    (5..=14u8).rev().find(|&high| {
        let run = 0b11111u16 << (high - 4);
        mask & run == run
    })
}

/// Values appearing exactly `count` times, descending.
fn values_with_count(counts: &[u8; 15], count: u8) -> Vec<Value> {
    (2..=14u8).rev().filter(|&v| counts[v as usize] == count).collect()
}

/// The top `n` values present in the hand, excluding `used`, descending.
fn kickers(counts: &[u8; 15], used: &[Value], n: usize) -> Vec<Value> {
    (2..=14u8)
        .rev()
        .filter(|&v| counts[v as usize] > 0 && !used.contains(&v))
        .take(n)
        .collect()
}

/// The five highest set bits of a suit mask, descending.
fn top_five(mask: u16) -> [Value; 5] {
    let mut values = [0; 5];
    let mut i = 0;
    for v in (2..=14u8).rev() {
        if mask & (1 << v) != 0 && i < 5 {
            values[i] = v;
            i += 1;
        }
    }
    values
}
