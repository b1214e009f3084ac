//! The table: the shoe, the wager positions, the dealer's hand, the house bank and the seated
//! players. Rules live in `TableConfig`, the round itself is driven by `GamePlay`.

use crate::bank::Bank;
use crate::bet_box::BetBoxes;
use crate::card::Card;
use crate::config::TableConfig;
use crate::error::{BlackjackGameError, ConfigError};
use crate::hand::Hand;
use crate::player::Player;
use crate::policy::DecisionPolicy;
use crate::shoe::Shoe;

pub struct Table {
    pub(crate) config: TableConfig,
    pub(crate) shoe: Shoe,
    pub(crate) boxes: BetBoxes,
    pub(crate) dealer: Hand,
    pub(crate) house: Bank,
    pub(crate) players: Vec<Player>,
    // players who left, kept so a simulation can seat them again
    departed: Vec<Player>,
    next_player_id: usize,
}

impl Table {
    /// Builds a table with a freshly shuffled shoe and a placed marker.
    pub fn new(config: TableConfig) -> Result<Table, BlackjackGameError> {
        config.validate()?;
        let shoe = Shoe::from_config(&config);
        Table::with_shoe(config, shoe)
    }

    /// Builds a table around an existing shoe, shuffling it and placing the marker.
    pub fn with_shoe(config: TableConfig, mut shoe: Shoe) -> Result<Table, BlackjackGameError> {
        config.validate()?;
        if shoe.num_decks() != config.num_decks {
            return Err(ConfigError::Invalid(format!(
                "shoe holds {} decks but the table expects {}",
                shoe.num_decks(),
                config.num_decks
            ))
            .into());
        }
        shoe.shuffle();
        shoe.place_marker_card(None)?;
        Ok(Table {
            boxes: BetBoxes::new(config.num_positions),
            house: Bank::new("house", config.house_balance),
            config,
            shoe,
            dealer: Hand::new(),
            players: Vec::new(),
            departed: Vec::new(),
            next_player_id: 0,
        })
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn shoe(&self) -> &Shoe {
        &self.shoe
    }

    pub fn shoe_mut(&mut self) -> &mut Shoe {
        &mut self.shoe
    }

    pub fn boxes(&self) -> &BetBoxes {
        &self.boxes
    }

    pub fn dealer(&self) -> &Hand {
        &self.dealer
    }

    pub fn house(&self) -> &Bank {
        &self.house
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: usize) -> Option<&Player> {
        self.players.iter().find(|p| p.id() == id)
    }

    /// Seats a new player at `seat`, returning the player's id.
    pub fn seat_player<S: Into<String>>(
        &mut self,
        name: S,
        seat: usize,
        starting_balance: f64,
        policy: Box<dyn DecisionPolicy + Send>,
    ) -> Result<usize, BlackjackGameError> {
        if seat >= self.config.num_positions || self.players.iter().any(|p| p.seat() == seat) {
            return Err(BlackjackGameError::SeatUnavailable(seat));
        }
        let id = self.next_player_id;
        self.next_player_id += 1;
        let player = Player::new(id, name, seat, starting_balance, policy);
        log::info!("{} sits down at seat {} with ${:.2}", player.name(), seat, starting_balance);
        self.players.push(player);
        self.players.sort_by_key(|p| p.seat());
        Ok(id)
    }

    /// Removes a player from the table between rounds. Returns false if no such player is seated.
    pub fn remove_player(&mut self, id: usize) -> bool {
        match self.players.iter().position(|p| p.id() == id) {
            Some(idx) => {
                let player = self.players.remove(idx);
                log::info!("{} leaves the table with ${:.2}", player.name(), player.balance());
                self.departed.push(player);
                true
            }
            None => false,
        }
    }

    pub fn departed(&self) -> &[Player] {
        &self.departed
    }

    /// Seat positions a player sitting at `seat` may bet on: their own seat and the positions to
    /// its right, stopping at another player's seat or the table's per-player limit.
    pub fn available_positions(&self, seat: usize) -> Vec<usize> {
        (seat..self.config.num_positions)
            .take_while(|&p| p == seat || !self.players.iter().any(|pl| pl.seat() == p))
            .take(self.config.max_bets_per_player)
            .collect()
    }

    /// Every face up card on the table.
    pub fn visible_cards(&self) -> Vec<Card> {
        let boxes = self
            .boxes
            .active_leaves()
            .into_iter()
            .filter_map(|id| self.boxes.get(id).ok())
            .flat_map(|b| b.hand().visible_cards().copied().collect::<Vec<Card>>());
        boxes.chain(self.dealer.visible_cards().copied()).collect()
    }

    /// All money the table has seen: every bank of a seated or departed player, the house and
    /// everything staked.
    pub fn total_money(&self) -> f64 {
        self.players
            .iter()
            .chain(self.departed.iter())
            .map(|p| p.balance())
            .sum::<f64>()
            + self.house.balance()
            + self.boxes.total_in_play()
    }

    /// Seats every departed player again, restores bankrolls and forces a reshuffle. Used when a
    /// simulation restarts.
    pub fn reset_balances(&mut self, player_balance: f64) {
        self.players.append(&mut self.departed);
        self.players.sort_by_key(|p| p.seat());
        self.house.reset(self.config.house_balance);
        for player in self.players.iter_mut() {
            player.reset(player_balance);
        }
        self.shoe.force_shuffle();
    }
}

pub(crate) fn player_index(players: &[Player], id: usize) -> Result<usize, BlackjackGameError> {
    players
        .iter()
        .position(|p| p.id() == id)
        .ok_or(BlackjackGameError::UnknownPlayer(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ScriptedPolicy;

    fn table(positions: usize, per_player: usize) -> Table {
        let config = TableConfig {
            num_positions: positions,
            max_bets_per_player: per_player,
            seed: Some(1),
            ..TableConfig::default()
        };
        Table::new(config).unwrap()
    }

    #[test]
    fn new_table_is_ready_to_deal() {
        let t = table(7, 3);
        assert!(t.shoe().marker().is_some());
        assert!(!t.shoe().needs_shuffle());
        assert_eq!(t.boxes().num_positions(), 7);
    }

    #[test]
    fn seats_are_exclusive() {
        let mut t = table(3, 2);
        t.seat_player("a", 0, 100.0, Box::new(ScriptedPolicy::new())).unwrap();
        assert!(matches!(
            t.seat_player("b", 0, 100.0, Box::new(ScriptedPolicy::new())),
            Err(BlackjackGameError::SeatUnavailable(0))
        ));
        assert!(t.seat_player("c", 3, 100.0, Box::new(ScriptedPolicy::new())).is_err());
    }

    #[test]
    fn adjacency_stops_at_other_players() {
        let mut t = table(7, 3);
        t.seat_player("a", 1, 100.0, Box::new(ScriptedPolicy::new())).unwrap();
        t.seat_player("b", 3, 100.0, Box::new(ScriptedPolicy::new())).unwrap();
        assert_eq!(t.available_positions(1), vec![1, 2]);
        assert_eq!(t.available_positions(3), vec![3, 4, 5]);
        assert_eq!(t.available_positions(6), vec![6]);
    }

    #[test]
    fn total_money_counts_every_bank() {
        let mut t = table(2, 1);
        let before = t.total_money();
        t.seat_player("a", 0, 250.0, Box::new(ScriptedPolicy::new())).unwrap();
        assert_eq!(t.total_money(), before + 250.0);
        let id = t.players()[0].id();
        assert!(t.remove_player(id));
        assert!(!t.remove_player(id));
        assert_eq!(t.total_money(), before + 250.0);
        assert_eq!(t.departed().len(), 1);
    }

    #[test]
    fn reset_reseats_departed_players() {
        let mut t = table(3, 1);
        let a = t.seat_player("a", 2, 10.0, Box::new(ScriptedPolicy::new())).unwrap();
        t.seat_player("b", 0, 10.0, Box::new(ScriptedPolicy::new())).unwrap();
        t.remove_player(a);
        t.reset_balances(500.0);
        let seats: Vec<usize> = t.players().iter().map(|p| p.seat()).collect();
        assert_eq!(seats, vec![0, 2]);
        assert!(t.players().iter().all(|p| p.balance() == 500.0));
        assert!(t.departed().is_empty());
        assert!(t.shoe().needs_shuffle());
    }
}
