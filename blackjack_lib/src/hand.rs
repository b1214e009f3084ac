//! Hand scoring. Aces are dual valued: the soft sum counts every ace as 1, the hard sum promotes
//! at most one ace to 11 when that does not bust the hand.

use crate::card::{Card, Orientation};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub const BLACKJACK: u32 = 21;

/// Computes `(soft_sum, hard_sum)` for a sequence of cards.
pub fn compute_sums(cards: &[Card]) -> (u32, u32) {
    let ace_count = cards.iter().filter(|c| c.is_ace()).count() as u32;
    let non_ace_sum: u32 = cards
        .iter()
        .filter(|c| !c.is_ace())
        .map(|c| c.val() as u32)
        .sum();
    if ace_count == 0 {
        return (non_ace_sum, non_ace_sum);
    }
    let soft_sum = non_ace_sum + ace_count;
    let candidate_hard = soft_sum + 10;
    if candidate_hard <= BLACKJACK {
        (soft_sum, candidate_hard)
    } else {
        (soft_sum, soft_sum)
    }
}

/// A hand is bust once its soft sum exceeds 21. The hard sum is already capped so it is never
/// used for this test.
pub fn is_bust(cards: &[Card]) -> bool {
    compute_sums(cards).0 > BLACKJACK
}

pub fn is_blackjack(cards: &[Card]) -> bool {
    cards.len() == 2 && compute_sums(cards).1 == BLACKJACK
}

/// A hand may take another card only while its soft sum is below 21.
pub fn is_hittable(cards: &[Card]) -> bool {
    compute_sums(cards).0 < BLACKJACK
}

/// Two cards of the same literal rank. Ten-valued faces only pair with their own face,
/// so ten/king is not a pair.
pub fn is_pair(cards: &[Card]) -> bool {
    match cards {
        [first, second] => first.rank == second.rank,
        _ => false,
    }
}

/// An ordered sequence of cards with its soft and hard sums cached on every mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hand {
    cards: Vec<Card>,
    soft_sum: u32,
    hard_sum: u32,
}

impl Hand {
    pub fn new() -> Hand {
        Hand::default()
    }

    /// Builds a hand from the given cards, keeping their orientation.
    pub fn from_cards(cards: Vec<Card>) -> Hand {
        let (soft_sum, hard_sum) = compute_sums(&cards);
        Hand {
            cards,
            soft_sum,
            hard_sum,
        }
    }

    /// Method for receiving a card, updates the cached sums.
    pub fn receive_card(&mut self, card: Card) {
        self.cards.push(card);
        self.recompute();
    }

    /// Removes and returns the last card of the hand.
    pub fn pop(&mut self) -> Option<Card> {
        let card = self.cards.pop();
        self.recompute();
        card
    }

    /// Empties the hand, returning its cards in the order they were received.
    pub fn take_cards(&mut self) -> Vec<Card> {
        let cards = std::mem::take(&mut self.cards);
        self.recompute();
        cards
    }

    /// Turns every card of the hand face up.
    pub fn reveal(&mut self) {
        for card in self.cards.iter_mut() {
            card.orientation = Orientation::FaceUp;
        }
    }

    fn recompute(&mut self) {
        let (soft_sum, hard_sum) = compute_sums(&self.cards);
        self.soft_sum = soft_sum;
        self.hard_sum = hard_sum;
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn soft_sum(&self) -> u32 {
        self.soft_sum
    }

    pub fn hard_sum(&self) -> u32 {
        self.hard_sum
    }

    /// True when an ace is currently counted as 11.
    pub fn is_soft(&self) -> bool {
        self.hard_sum != self.soft_sum
    }

    pub fn is_bust(&self) -> bool {
        self.soft_sum > BLACKJACK
    }

    pub fn is_blackjack(&self) -> bool {
        self.cards.len() == 2 && self.hard_sum == BLACKJACK
    }

    pub fn is_hittable(&self) -> bool {
        self.soft_sum < BLACKJACK
    }

    pub fn is_pair(&self) -> bool {
        is_pair(&self.cards)
    }

    /// The first card dealt to the hand, the dealer's up card.
    pub fn up_card(&self) -> Option<&Card> {
        self.cards.first()
    }

    /// Cards currently visible to the table.
    pub fn visible_cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter().filter(|c| c.is_face_up())
    }

    /// Formats the hand value, showing both totals while an ace is soft.
    pub fn formatted_hand_values(&self) -> String {
        if self.is_soft() {
            format!("{}/{}", self.soft_sum, self.hard_sum)
        } else {
            format!("{}", self.hard_sum)
        }
    }
}

impl Display for Hand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cards = self
            .cards
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<String>>()
            .join(" ");
        write!(f, "[{}] ({})", cards, self.formatted_hand_values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Rank, Suit};

    fn hand(ranks: &[Rank]) -> Hand {
        Hand::from_cards(ranks.iter().map(|r| Card::new(*r, Suit::Spades)).collect())
    }

    #[test]
    fn no_aces_soft_equals_hard() {
        for ranks in [
            vec![Rank::King, Rank::Seven],
            vec![Rank::Two, Rank::Three, Rank::Four],
            vec![Rank::Ten, Rank::Nine, Rank::Five],
        ] {
            let h = hand(&ranks);
            let total: u32 = ranks.iter().map(|r| r.val() as u32).sum();
            assert_eq!(h.soft_sum(), total);
            assert_eq!(h.hard_sum(), total);
        }
    }

    #[test]
    fn aces_promote_at_most_one() {
        let h = hand(&[Rank::Ace, Rank::Ace, Rank::Nine]);
        assert_eq!(h.soft_sum(), 11);
        assert_eq!(h.hard_sum(), 21);

        let h = hand(&[Rank::Ace, Rank::Six, Rank::Nine]);
        assert_eq!(h.soft_sum(), 16);
        assert_eq!(h.hard_sum(), 16);
        assert!(!h.is_soft());

        let h = hand(&[Rank::Ace, Rank::Ace, Rank::Ace, Rank::Ace]);
        assert_eq!(h.soft_sum(), 4);
        assert_eq!(h.hard_sum(), 14);
    }

    #[test]
    fn hard_sum_never_below_soft_sum_with_aces() {
        for second in Rank::ALL {
            for third in Rank::ALL {
                let h = hand(&[Rank::Ace, second, third]);
                assert!(h.hard_sum() >= h.soft_sum());
                if h.soft_sum() + 10 <= 21 {
                    assert_eq!(h.hard_sum(), h.soft_sum() + 10);
                } else {
                    assert_eq!(h.hard_sum(), h.soft_sum());
                }
            }
        }
    }

    #[test]
    fn ace_queen_is_blackjack() {
        let h = hand(&[Rank::Ace, Rank::Queen]);
        assert!(h.is_blackjack());
        assert_eq!(h.hard_sum(), 21);
        assert_eq!(h.soft_sum(), 11);
        assert!(!h.is_bust());
    }

    #[test]
    fn bust_uses_soft_sum() {
        let h = hand(&[Rank::King, Rank::Queen, Rank::Two]);
        assert!(h.is_bust());
        assert!(!h.is_blackjack());

        let h = hand(&[Rank::Ace, Rank::King, Rank::Queen]);
        assert_eq!(h.soft_sum(), 21);
        assert!(!h.is_bust());
        assert!(!h.is_hittable());
    }

    #[test]
    fn never_bust_and_blackjack() {
        for first in Rank::ALL {
            for second in Rank::ALL {
                let h = hand(&[first, second]);
                assert!(!(h.is_bust() && h.is_blackjack()));
            }
        }
    }

    #[test]
    fn soft_twenty_one_with_two_cards_is_still_hittable() {
        let h = hand(&[Rank::Ace, Rank::Ten]);
        assert!(h.is_hittable());
    }

    #[test]
    fn pair_rules() {
        assert!(hand(&[Rank::Eight, Rank::Eight]).is_pair());
        assert!(hand(&[Rank::Ten, Rank::Ten]).is_pair());
        assert!(hand(&[Rank::King, Rank::King]).is_pair());
        assert!(!hand(&[Rank::Ten, Rank::Jack]).is_pair());
        assert!(!hand(&[Rank::Queen, Rank::King]).is_pair());
        assert!(!hand(&[Rank::Eight, Rank::Eight, Rank::Two]).is_pair());
    }

    #[test]
    fn pop_and_take_update_sums() {
        let mut h = hand(&[Rank::Eight, Rank::Eight]);
        let card = h.pop();
        assert_eq!(card.map(|c| c.rank), Some(Rank::Eight));
        assert_eq!(h.hard_sum(), 8);
        let cards = h.take_cards();
        assert_eq!(cards.len(), 1);
        assert!(h.is_empty());
        assert_eq!(h.soft_sum(), 0);
    }
}
