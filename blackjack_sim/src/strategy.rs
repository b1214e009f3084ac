use blackjack_lib::{
    Action, BoxId, DecisionPolicy, InsuranceChoice, Outcome, PlayerView, PositionView, Stay, Step,
};
use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};
use std::fmt::Display;

pub mod prelude {
    pub use super::{
        BasicStrategy, BettingStrategy, DecisionStrategy, FlatBetting, MarginBettingStrategy,
        PlayerStrategy, PlayerStrategyDyn,
    };
}

/// Share of ten valued cards in a full deck, the point where the shoe neither favours the player
/// nor the house.
pub const NEUTRAL_TEN_PERCENTAGE: f64 = 4.0 / 13.0;

lazy_static! {
    /// Keyed by (hard total, dealer up card) with aces counted as 1 on the dealer side.
    static ref HARD_TOTALS: HashMap<(u32, u32), Action> = {
        let mut table = HashMap::new();
        for i in 2..=21 {
            for j in 1..=10 {
                let option = match i {
                    9 => match j {
                        3..=6 => Action::DoubleDown,
                        _ => Action::Hit,
                    },
                    10 => match j {
                        2..=9 => Action::DoubleDown,
                        _ => Action::Hit,
                    },
                    11 => Action::DoubleDown,
                    12 => match j {
                        1..=3 | 7..=10 => Action::Hit,
                        _ => Action::Stand,
                    },
                    13..=16 => match j {
                        2..=6 => Action::Stand,
                        _ => Action::Hit,
                    },
                    17..=21 => Action::Stand,
                    _ => Action::Hit,
                };
                table.insert((i, j), option);
            }
        }
        table
    };

    /// Keyed by (soft sum, dealer up card), the soft sum counting the ace as 1.
    static ref SOFT_TOTALS: HashMap<(u32, u32), Action> = {
        let mut table = HashMap::new();
        for i in 3..=10 {
            for j in 1..=10 {
                let option = match i {
                    3..=7 => Action::Hit,
                    8 => match j {
                        2..=6 => Action::DoubleDown,
                        7 | 8 => Action::Stand,
                        _ => Action::Hit,
                    },
                    9 => match j {
                        6 => Action::DoubleDown,
                        _ => Action::Stand,
                    },
                    _ => Action::Stand,
                };
                table.insert((i, j), option);
            }
        }
        table
    };

    /// Pairs worth splitting, keyed by (soft sum, dealer up card). Pairs missing from the table
    /// fall back to the soft or hard totals.
    static ref PAIR_SPLITS: HashSet<(u32, u32)> = {
        let mut table = HashSet::new();
        for j in 1..=10 {
            let split = |i: u32| match i {
                2 | 16 => true,
                4 | 6 | 14 => (2..=7).contains(&j),
                8 => j == 5 || j == 6,
                12 => (2..=6).contains(&j),
                18 => (2..=6).contains(&j) || j == 8 || j == 9,
                _ => false,
            };
            for i in (2..=20).step_by(2) {
                if split(i) {
                    table.insert((i, j));
                }
            }
        }
        table
    };

    static ref SURRENDER: HashSet<(u32, u32)> =
        [(15, 10), (16, 9), (16, 10), (16, 1)].into_iter().collect();
}

/// Chooses how to play a position. `excluded` holds actions the table already rejected for the
/// current decision, so an implementation must fall back to something else.
pub trait DecisionStrategy {
    fn decide_option(&self, view: &PositionView<'_>, excluded: &HashSet<Action>) -> Action;

    fn name(&self) -> String;
}

/// Chooses stakes and how many positions to play.
pub trait BettingStrategy {
    fn bet(&self, view: &PlayerView<'_>) -> f64;

    fn positions(&self, _view: &PlayerView<'_>, available: usize) -> usize {
        usize::min(1, available)
    }

    fn name(&self) -> String;
}

/// A struct that implements the `DecisionStrategy` trait. Decides playing option according to
/// strict basic strategy only, looking at nothing but the dealer's up card and the player's hand.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicStrategy;

impl BasicStrategy {
    pub fn new() -> BasicStrategy {
        BasicStrategy
    }

    /// Degrades an unavailable double down to a hit.
    fn playable(option: Action, view: &PositionView<'_>, excluded: &HashSet<Action>) -> Action {
        match option {
            Action::DoubleDown if view.hand.len() != 2 || excluded.contains(&option) => {
                Action::Hit
            }
            _ => option,
        }
    }
}

impl DecisionStrategy for BasicStrategy {
    fn decide_option(&self, view: &PositionView<'_>, excluded: &HashSet<Action>) -> Action {
        let dealers_card = view.dealer_up_card.map(|c| c.val() as u32).unwrap_or(10);
        let hand = view.hand;
        let two_cards = hand.len() == 2;

        // Pairs are split before anything else is considered
        if hand.is_pair()
            && !excluded.contains(&Action::Split)
            && view.balance >= view.stake
            && PAIR_SPLITS.contains(&(hand.soft_sum(), dealers_card))
        {
            return Action::Split;
        }

        if two_cards
            && !view.is_split_child
            && !hand.is_soft()
            && !excluded.contains(&Action::Surrender)
            && SURRENDER.contains(&(hand.hard_sum(), dealers_card))
        {
            return Action::Surrender;
        }

        // Soft hands use their own table until the ace has to count as 1
        if hand.is_soft() {
            if let Some(option) = SOFT_TOTALS.get(&(hand.soft_sum(), dealers_card)) {
                let option = BasicStrategy::playable(*option, view, excluded);
                if !excluded.contains(&option) {
                    return option;
                }
            }
        }

        match HARD_TOTALS.get(&(hand.hard_sum(), dealers_card)) {
            Some(option) => {
                let option = BasicStrategy::playable(*option, view, excluded);
                if excluded.contains(&option) {
                    Action::Stand
                } else {
                    option
                }
            }
            None => Action::Stand,
        }
    }

    fn name(&self) -> String {
        "basic strategy".to_string()
    }
}

/// Bets the same number of table minimums every round.
#[derive(Debug, Clone, Copy)]
pub struct FlatBetting {
    units: f64,
}

impl FlatBetting {
    pub fn new(units: f64) -> FlatBetting {
        FlatBetting { units }
    }
}

impl Default for FlatBetting {
    fn default() -> Self {
        FlatBetting::new(1.0)
    }
}

impl BettingStrategy for FlatBetting {
    fn bet(&self, view: &PlayerView<'_>) -> f64 {
        let bet = f64::max(view.min_bet, view.min_bet * self.units);
        f64::min(f64::min(bet, view.max_bet), view.balance)
    }

    fn name(&self) -> String {
        format!("flat {}x", self.units)
    }
}

/// Struct that encapsulates the logic needed for a simple margin based betting strategy. The
/// count is the excess ten density of the remaining shoe in percentage points, and for each
/// positive value the count takes the bet is `min_bet * ceil(count) * margin`.
#[derive(Debug, Clone, Copy)]
pub struct MarginBettingStrategy {
    margin: f64,
}

impl MarginBettingStrategy {
    /// Associated method for returning a new `MarginBettingStrategy` struct
    pub fn new(margin: f64) -> MarginBettingStrategy {
        MarginBettingStrategy { margin }
    }

    pub fn count(ten_percentage: f64) -> f64 {
        (ten_percentage - NEUTRAL_TEN_PERCENTAGE) * 100.0
    }
}

impl BettingStrategy for MarginBettingStrategy {
    fn bet(&self, view: &PlayerView<'_>) -> f64 {
        let count = MarginBettingStrategy::count(view.ten_percentage);
        let bet = if count > 0.0 {
            f64::max(view.min_bet, view.min_bet * f64::ceil(count) * self.margin)
        } else {
            view.min_bet
        };
        f64::min(f64::min(bet, view.max_bet), view.balance)
    }

    fn name(&self) -> String {
        format!("margin {}", self.margin)
    }
}

/// Composes a decision strategy and a betting strategy into a player that never leaves, never
/// takes insurance, and doubles for the full stake whenever it can.
pub struct PlayerStrategy<D, B>
where
    D: DecisionStrategy,
    B: BettingStrategy,
{
    decision_strategy: D,
    betting_strategy: B,
    // rejected actions for the decision in progress, keyed by box and hand size
    excluded: HashSet<Action>,
    decision_key: Option<(BoxId, usize)>,
    last_action: Option<Action>,
    outcomes: HashMap<Outcome, u32>,
}

impl<D: DecisionStrategy, B: BettingStrategy> PlayerStrategy<D, B> {
    pub fn new(decision_strategy: D, betting_strategy: B) -> PlayerStrategy<D, B> {
        PlayerStrategy {
            decision_strategy,
            betting_strategy,
            excluded: HashSet::new(),
            decision_key: None,
            last_action: None,
            outcomes: HashMap::new(),
        }
    }

    pub fn label(&self) -> String {
        format!(
            "{} / {}",
            self.decision_strategy.name(),
            self.betting_strategy.name()
        )
    }

    /// Forgets the actions rejected for the current decision. Box ids are reused every round.
    fn clear_decision(&mut self) {
        self.excluded.clear();
        self.decision_key = None;
        self.last_action = None;
    }

    /// How many times each outcome has been reported to this player.
    pub fn outcomes(&self) -> &HashMap<Outcome, u32> {
        &self.outcomes
    }
}

impl<D: DecisionStrategy, B: BettingStrategy> Display for PlayerStrategy<D, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl<D: DecisionStrategy, B: BettingStrategy> DecisionPolicy for PlayerStrategy<D, B> {
    fn stay(&mut self, _view: &PlayerView<'_>) -> Stay {
        Stay::Stay
    }

    fn bet_count(&mut self, view: &PlayerView<'_>, available: usize) -> usize {
        self.clear_decision();
        self.betting_strategy.positions(view, available)
    }

    fn bet_amount(&mut self, view: &PlayerView<'_>, _position: usize) -> f64 {
        self.betting_strategy.bet(view)
    }

    fn insurance(&mut self, _view: &PositionView<'_>) -> InsuranceChoice {
        InsuranceChoice::NoInsurance
    }

    fn insurance_amount(&mut self, view: &PositionView<'_>) -> f64 {
        f64::min(view.stake / 2.0, view.balance)
    }

    fn play(&mut self, view: &PositionView<'_>) -> Action {
        let key = (view.box_id, view.hand.len());
        if self.decision_key != Some(key) {
            self.decision_key = Some(key);
            self.excluded.clear();
        }
        let action = self.decision_strategy.decide_option(view, &self.excluded);
        self.last_action = Some(action);
        action
    }

    fn double_amount(&mut self, view: &PositionView<'_>) -> f64 {
        f64::min(view.stake, view.balance)
    }

    fn outcome(&mut self, outcome: Outcome, _amount: f64) {
        self.clear_decision();
        *self.outcomes.entry(outcome).or_insert(0) += 1;
    }

    fn error(&mut self, step: Step, message: &str) {
        log::debug!("strategy {} corrected at {:?}: {}", self.label(), step, message);
        if step == Step::Play {
            if let Some(action) = self.last_action.take() {
                self.excluded.insert(action);
            }
        }
    }
}

/// A `PlayerStrategy` whose parts are chosen at runtime.
pub type PlayerStrategyDyn =
    PlayerStrategy<Box<dyn DecisionStrategy + Send>, Box<dyn BettingStrategy + Send>>;

impl<S: DecisionStrategy + ?Sized> DecisionStrategy for Box<S> {
    fn decide_option(&self, view: &PositionView<'_>, excluded: &HashSet<Action>) -> Action {
        (**self).decide_option(view, excluded)
    }

    fn name(&self) -> String {
        (**self).name()
    }
}

impl<S: BettingStrategy + ?Sized> BettingStrategy for Box<S> {
    fn bet(&self, view: &PlayerView<'_>) -> f64 {
        (**self).bet(view)
    }

    fn positions(&self, view: &PlayerView<'_>, available: usize) -> usize {
        (**self).positions(view, available)
    }

    fn name(&self) -> String {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blackjack_lib::{Card, Hand, Rank, Suit};

    fn c(rank: Rank) -> Card {
        Card::new(rank, Suit::Spades)
    }

    fn decide(player: &[Rank], dealer: Rank, excluded: &[Action]) -> Action {
        let hand = Hand::from_cards(player.iter().map(|r| c(*r)).collect());
        let view = PositionView {
            box_id: BoxId(0),
            hand: &hand,
            stake: 10.0,
            balance: 100.0,
            dealer_up_card: Some(c(dealer)),
            visible_cards: &[],
            num_splits: 0,
            is_split_child: false,
        };
        let excluded: HashSet<Action> = excluded.iter().copied().collect();
        BasicStrategy::new().decide_option(&view, &excluded)
    }

    fn player_view(balance: f64, ten_percentage: f64) -> PlayerView<'static> {
        PlayerView {
            player: 0,
            name: "sim",
            balance,
            min_bet: 5.0,
            max_bet: 500.0,
            ten_percentage,
            rounds_played: 0,
        }
    }

    #[test]
    fn hard_totals() {
        assert_eq!(decide(&[Rank::Ten, Rank::Six], Rank::Six, &[]), Action::Stand);
        assert_eq!(decide(&[Rank::Ten, Rank::Two], Rank::Two, &[]), Action::Hit);
        assert_eq!(decide(&[Rank::Six, Rank::Five], Rank::Ten, &[]), Action::DoubleDown);
        assert_eq!(decide(&[Rank::Ten, Rank::Seven], Rank::Ace, &[]), Action::Stand);
    }

    #[test]
    fn soft_totals() {
        // A7 doubles against 5, stands against 8, hits against 9
        assert_eq!(decide(&[Rank::Ace, Rank::Seven], Rank::Five, &[]), Action::DoubleDown);
        assert_eq!(decide(&[Rank::Ace, Rank::Seven], Rank::Eight, &[]), Action::Stand);
        assert_eq!(decide(&[Rank::Ace, Rank::Seven], Rank::Nine, &[]), Action::Hit);
        // three card soft 18 cannot double any more
        assert_eq!(
            decide(&[Rank::Ace, Rank::Four, Rank::Three], Rank::Five, &[]),
            Action::Hit
        );
    }

    #[test]
    fn pairs_and_surrender() {
        assert_eq!(decide(&[Rank::Eight, Rank::Eight], Rank::Ten, &[]), Action::Split);
        assert_eq!(decide(&[Rank::Ace, Rank::Ace], Rank::Six, &[]), Action::Split);
        assert_eq!(decide(&[Rank::King, Rank::King], Rank::Six, &[]), Action::Stand);
        assert_eq!(decide(&[Rank::Ten, Rank::Six], Rank::Ten, &[]), Action::Surrender);
        assert_eq!(decide(&[Rank::Ten, Rank::Six], Rank::Ace, &[]), Action::Surrender);
    }

    #[test]
    fn rejected_actions_fall_back() {
        assert_eq!(
            decide(&[Rank::Ten, Rank::Six], Rank::Ten, &[Action::Surrender]),
            Action::Hit
        );
        assert_eq!(
            decide(&[Rank::Six, Rank::Five], Rank::Ten, &[Action::DoubleDown]),
            Action::Hit
        );
        assert_eq!(
            decide(&[Rank::Eight, Rank::Eight], Rank::Ten, &[Action::Split, Action::Surrender]),
            Action::Hit
        );
    }

    #[test]
    fn margin_bet_scales_with_ten_density() {
        let strategy = MarginBettingStrategy::new(3.0);
        assert_eq!(strategy.bet(&player_view(500.0, NEUTRAL_TEN_PERCENTAGE)), 5.0);
        assert_eq!(strategy.bet(&player_view(500.0, 0.2)), 5.0);
        // 1.5 points above neutral rounds up to 2
        let rich = NEUTRAL_TEN_PERCENTAGE + 0.015;
        assert!((strategy.bet(&player_view(500.0, rich)) - 30.0).abs() < 1e-9);
        assert!((strategy.bet(&player_view(12.0, rich)) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn flat_bet_respects_balance() {
        let strategy = FlatBetting::new(2.0);
        assert_eq!(strategy.bet(&player_view(500.0, 0.3)), 10.0);
        assert_eq!(strategy.bet(&player_view(7.0, 0.3)), 7.0);
    }

    #[test]
    fn player_strategy_excludes_rejected_actions() {
        let mut player = PlayerStrategy::new(BasicStrategy::new(), FlatBetting::default());
        let hand = Hand::from_cards(vec![c(Rank::Ten), c(Rank::Six)]);
        let view = PositionView {
            box_id: BoxId(2),
            hand: &hand,
            stake: 10.0,
            balance: 100.0,
            dealer_up_card: Some(c(Rank::Ten)),
            visible_cards: &[],
            num_splits: 0,
            is_split_child: false,
        };
        assert_eq!(player.play(&view), Action::Surrender);
        player.error(Step::Play, "surrender is not offered at this table");
        assert_eq!(player.play(&view), Action::Hit);

        // a new decision starts with a clean slate
        let other = PositionView {
            box_id: BoxId(3),
            ..view.clone()
        };
        assert_eq!(player.play(&other), Action::Surrender);
        assert_eq!(player.label(), "basic strategy / flat 1x");
    }

    #[test]
    fn rejections_do_not_carry_into_the_next_round() {
        let mut player = PlayerStrategy::new(BasicStrategy::new(), FlatBetting::default());
        let first = Hand::from_cards(vec![c(Rank::Six), c(Rank::Five)]);
        let view = PositionView {
            box_id: BoxId(0),
            hand: &first,
            stake: 10.0,
            balance: 100.0,
            dealer_up_card: Some(c(Rank::Six)),
            visible_cards: &[],
            num_splits: 0,
            is_split_child: false,
        };
        assert_eq!(player.play(&view), Action::DoubleDown);
        player.error(Step::Play, "doubling is not allowed on 11");
        assert_eq!(player.play(&view), Action::Hit);
        player.outcome(Outcome::Won, 10.0);

        // same box and hand size in the following round
        let second = Hand::from_cards(vec![c(Rank::Seven), c(Rank::Four)]);
        let next = PositionView {
            hand: &second,
            ..view.clone()
        };
        assert_eq!(player.play(&next), Action::DoubleDown);
        assert_eq!(player.outcomes()[&Outcome::Won], 1);
    }

    #[test]
    fn betting_starts_a_fresh_round() {
        let mut player = PlayerStrategy::new(BasicStrategy::new(), FlatBetting::default());
        let hand = Hand::from_cards(vec![c(Rank::Eight), c(Rank::Eight)]);
        let view = PositionView {
            box_id: BoxId(1),
            hand: &hand,
            stake: 10.0,
            balance: 100.0,
            dealer_up_card: Some(c(Rank::Seven)),
            visible_cards: &[],
            num_splits: 0,
            is_split_child: false,
        };
        assert_eq!(player.play(&view), Action::Split);
        player.error(Step::Play, "split limit reached");
        assert_eq!(player.play(&view), Action::Hit);

        // the hand ended without an outcome reaching this player, then betting reopened
        player.bet_count(&player_view(100.0, 4.0 / 13.0), 1);
        assert_eq!(player.play(&view), Action::Split);
    }
}
