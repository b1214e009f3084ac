//! The shoe: one or more decks dealt from the top, a discard pile collecting played cards and a
//! cut card marking when the next reshuffle is due.

use crate::card::{Card, Orientation};
use crate::config::{MarkerConfig, TableConfig};
use crate::error::ShoeError;
use crate::hand::Hand;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DECK_SIZE: usize = 52;

pub struct Shoe {
    // top of the shoe is the end of the vec
    cards: Vec<Card>,
    discard_pile: Vec<Card>,
    // offset from the bottom of the remaining pile
    marker: Option<usize>,
    force_shuffle: bool,
    num_decks: usize,
    num_shuffles: u32,
    marker_config: MarkerConfig,
    dealt: usize,
    rng: StdRng,
}

impl Shoe {
    /// Associated function for building a new, unshuffled shoe. `rng` is owned by the shoe and
    /// never shared, so two shoes built from equally seeded generators deal identical cards.
    pub fn new(
        num_decks: usize,
        num_shuffles: u32,
        marker_config: MarkerConfig,
        rng: StdRng,
    ) -> Shoe {
        let cards = (0..num_decks).flat_map(|_| Card::deck()).collect();
        Shoe {
            cards,
            discard_pile: Vec::new(),
            marker: None,
            force_shuffle: false,
            num_decks,
            num_shuffles,
            marker_config,
            dealt: 0,
            rng,
        }
    }

    /// Builds a shoe from the table configuration, seeding the generator from `config.seed`
    /// when present.
    pub fn from_config(config: &TableConfig) -> Shoe {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Shoe::new(
            config.num_decks,
            config.shuffle_passes,
            config.marker,
            rng,
        )
    }

    /// Total number of cards the shoe was built with.
    pub fn size(&self) -> usize {
        self.num_decks * DECK_SIZE
    }

    pub fn num_decks(&self) -> usize {
        self.num_decks
    }

    /// Cards left to deal.
    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    pub fn discarded(&self) -> usize {
        self.discard_pile.len()
    }

    /// Cards dealt since the last shuffle.
    pub fn dealt(&self) -> usize {
        self.dealt
    }

    pub fn marker(&self) -> Option<usize> {
        self.marker
    }

    pub fn marker_window(&self) -> (usize, usize) {
        self.marker_config.window(self.size())
    }

    /// Folds the discard pile back in, clears the marker and performs the configured number of
    /// riffle and cut passes.
    pub fn shuffle(&mut self) {
        self.cards.append(&mut self.discard_pile);
        for card in self.cards.iter_mut() {
            card.orientation = Orientation::FaceDown;
        }
        self.marker = None;
        self.force_shuffle = false;
        self.dealt = 0;
        for _ in 0..self.num_shuffles {
            self.riffle();
            self.randomized_split();
        }
        log::info!(
            "shuffled {} cards with {} passes",
            self.cards.len(),
            self.num_shuffles
        );
    }

    /// Cuts the pile at a point drawn uniformly from its middle third, moving the back portion in
    /// front of the front portion.
    pub fn randomized_split(&mut self) {
        let len = self.cards.len();
        if len < 3 {
            return;
        }
        let point = self.rng.gen_range(len / 3..=(2 * len) / 3);
        self.cards.rotate_left(point);
    }

    /// Splits the pile near the middle and interleaves small packets from each half.
    fn riffle(&mut self) {
        let len = self.cards.len();
        if len < 2 {
            return;
        }
        let cut = self.rng.gen_range(len / 3..=(2 * len) / 3);
        let right = self.cards.split_off(cut);
        let left = std::mem::take(&mut self.cards);
        let mut merged = Vec::with_capacity(len);
        let (mut i, mut j) = (0usize, 0usize);
        let mut from_left = self.rng.gen_bool(0.5);
        while i < left.len() || j < right.len() {
            let packet = self.rng.gen_range(1..=3);
            if from_left {
                let end = usize::min(i + packet, left.len());
                merged.extend_from_slice(&left[i..end]);
                i = end;
            } else {
                let end = usize::min(j + packet, right.len());
                merged.extend_from_slice(&right[j..end]);
                j = end;
            }
            from_left = !from_left;
        }
        self.cards = merged;
    }

    /// Places the cut card. Without an explicit offset one is drawn uniformly from the valid
    /// window around the configured penetration.
    pub fn place_marker_card(&mut self, offset: Option<usize>) -> Result<usize, ShoeError> {
        let (min, max) = self.marker_window();
        let offset = match offset {
            Some(o) => o,
            None => self.rng.gen_range(min..=max),
        };
        debug_assert!(max <= self.size());
        if offset < min || offset > max {
            log::error!("rejected marker placement at {offset}, window is {min}..={max}");
            return Err(ShoeError::InvalidMarkerPlacement { offset, min, max });
        }
        self.marker = Some(offset);
        log::debug!("marker placed {offset} cards from the back of the shoe");
        Ok(offset)
    }

    /// Requests a shuffle before the next round regardless of the marker.
    pub fn force_shuffle(&mut self) {
        self.force_shuffle = true;
    }

    pub fn needs_shuffle(&self) -> bool {
        self.force_shuffle || matches!(self.marker, Some(offset) if self.cards.len() < offset)
    }

    /// Takes the top card of the shoe, recycling the discard pile if the shoe ran dry mid round.
    pub fn draw(&mut self, orientation: Orientation) -> Result<Card, ShoeError> {
        if self.marker.is_none() {
            return Err(ShoeError::MarkerNotPlaced);
        }
        if self.cards.is_empty() {
            if self.discard_pile.is_empty() {
                log::error!("no cards left in the shoe or the discard pile");
                return Err(ShoeError::Exhausted);
            }
            log::warn!(
                "shoe ran out mid round, recycling {} discarded cards",
                self.discard_pile.len()
            );
            self.cards.append(&mut self.discard_pile);
            self.riffle();
            self.randomized_split();
        }
        let mut card = self.cards.pop().ok_or(ShoeError::Exhausted)?;
        card.orientation = orientation;
        self.dealt += 1;
        Ok(card)
    }

    /// Moves exactly one card from the shoe into `destination` with the given orientation.
    pub fn deal_one(
        &mut self,
        destination: &mut Hand,
        orientation: Orientation,
    ) -> Result<Card, ShoeError> {
        let card = self.draw(orientation)?;
        destination.receive_card(card);
        Ok(card)
    }

    /// Returns played cards to the discard pile face down.
    pub fn discard<I: IntoIterator<Item = Card>>(&mut self, cards: I) {
        self.discard_pile.extend(cards.into_iter().map(|mut c| {
            c.orientation = Orientation::FaceDown;
            c
        }));
    }

    /// Proportion of ten-valued cards among those still to be dealt before the marker.
    pub fn current_ten_percentage(&self) -> f64 {
        let offset = usize::min(self.marker.unwrap_or(0), self.cards.len());
        let before_marker = &self.cards[offset..];
        if before_marker.is_empty() {
            return 0.0;
        }
        let tens = before_marker.iter().filter(|c| c.is_ten_valued()).count();
        tens as f64 / before_marker.len() as f64
    }

    /// Stacks specific cards on top of the shoe so they are dealt next, in the given order.
    pub fn stack(&mut self, cards: &[Card]) {
        for card in cards.iter().rev() {
            if let Some(pos) = self.cards.iter().position(|c| c == card) {
                let found = self.cards.remove(pos);
                self.cards.push(found);
            }
        }
    }
}
