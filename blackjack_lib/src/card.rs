use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Display;

/// The thirteen faces of a standard deck, ordered from ace (low) to king.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    Ace,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    /// The blackjack value of the rank with aces counted low.
    pub fn val(&self) -> u8 {
        match self {
            Rank::Ace => 1,
            Rank::Two => 2,
            Rank::Three => 3,
            Rank::Four => 4,
            Rank::Five => 5,
            Rank::Six => 6,
            Rank::Seven => 7,
            Rank::Eight => 8,
            Rank::Nine => 9,
            Rank::Ten | Rank::Jack | Rank::Queen | Rank::King => 10,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Rank::Ace => "A",
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    pub fn symbol(&self) -> &'static str {
        match self {
            Suit::Clubs => "C",
            Suit::Diamonds => "D",
            Suit::Hearts => "H",
            Suit::Spades => "S",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    FaceUp,
    FaceDown,
}

/// A single playing card. Rank and suit never change once the card is created, only the
/// orientation is flipped as the card moves around the table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
    pub orientation: Orientation,
}

impl Card {
    /// Associated function for creating a new face down card.
    pub fn new(rank: Rank, suit: Suit) -> Card {
        Card {
            rank,
            suit,
            orientation: Orientation::FaceDown,
        }
    }

    /// Returns the 52 cards of a single standard deck, all face down.
    pub fn deck() -> Vec<Card> {
        Suit::ALL
            .iter()
            .flat_map(|suit| Rank::ALL.iter().map(move |rank| Card::new(*rank, *suit)))
            .collect()
    }

    /// The blackjack value of the card, aces count as 1 and every ten-valued face as 10.
    pub fn val(&self) -> u8 {
        self.rank.val()
    }

    pub fn is_ace(&self) -> bool {
        self.rank == Rank::Ace
    }

    pub fn is_ten_valued(&self) -> bool {
        self.val() == 10
    }

    pub fn is_face_up(&self) -> bool {
        self.orientation == Orientation::FaceUp
    }

    pub fn flip(&mut self) {
        self.orientation = match self.orientation {
            Orientation::FaceUp => Orientation::FaceDown,
            Orientation::FaceDown => Orientation::FaceUp,
        };
    }
}

impl PartialEq for Card {
    fn eq(&self, other: &Self) -> bool {
        self.rank == other.rank && self.suit == other.suit
    }
}

impl Eq for Card {}

impl PartialOrd for Card {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Card {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank
            .cmp(&other.rank)
            .then_with(|| self.suit.cmp(&other.suit))
    }
}

impl Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.orientation {
            Orientation::FaceUp => write!(f, "{}{}", self.rank.symbol(), self.suit.symbol()),
            Orientation::FaceDown => write!(f, "??"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deck_has_52_unique_cards() {
        let mut deck = Card::deck();
        assert_eq!(deck.len(), 52);
        deck.sort();
        deck.dedup();
        assert_eq!(deck.len(), 52);
        assert_eq!(deck.iter().filter(|c| c.is_ten_valued()).count(), 16);
        assert_eq!(deck.iter().filter(|c| c.is_ace()).count(), 4);
    }

    #[test]
    fn equality_ignores_orientation() {
        let mut up = Card::new(Rank::Queen, Suit::Hearts);
        up.flip();
        assert!(up.is_face_up());
        assert_eq!(up, Card::new(Rank::Queen, Suit::Hearts));
        assert_eq!(format!("{}", up), "QH");
    }

    #[test]
    fn ordering_is_rank_then_suit() {
        let two_spades = Card::new(Rank::Two, Suit::Spades);
        let three_clubs = Card::new(Rank::Three, Suit::Clubs);
        let three_hearts = Card::new(Rank::Three, Suit::Hearts);
        assert!(two_spades < three_clubs);
        assert!(three_clubs < three_hearts);
    }
}
