//! The decision interface. The round state machine never decides how a hand is played, it asks a
//! `DecisionPolicy` and validates the answer. Rejected answers are reported through `error` and
//! the same question is asked again.

use crate::bet_box::BoxId;
use crate::card::Card;
use crate::hand::Hand;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt::Display;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Step {
    Stay,
    BetCount,
    BetAmount,
    Insurance,
    InsuranceAmount,
    Play,
    DoubleAmount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stay {
    Stay,
    Leave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsuranceChoice {
    Insurance,
    NoInsurance,
    EvenMoney,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Hit,
    Stand,
    Split,
    DoubleDown,
    Surrender,
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Action::Hit => "hit",
            Action::Stand => "stand",
            Action::Split => "split",
            Action::DoubleDown => "double down",
            Action::Surrender => "surrender",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Won,
    Blackjack,
    Lost,
    Pushed,
    Bust,
    Surrendered,
    EvenMoney,
    InsuranceWon,
    InsuranceLost,
}

/// What a player can see when deciding whether to stay and how much to bet.
#[derive(Debug, Clone)]
pub struct PlayerView<'a> {
    pub player: usize,
    pub name: &'a str,
    pub balance: f64,
    pub min_bet: f64,
    pub max_bet: f64,
    /// Ten density of the cards left before the marker.
    pub ten_percentage: f64,
    pub rounds_played: u32,
}

/// What a player can see when deciding how to play one wager position.
#[derive(Debug, Clone)]
pub struct PositionView<'a> {
    pub box_id: BoxId,
    pub hand: &'a Hand,
    pub stake: f64,
    pub balance: f64,
    pub dealer_up_card: Option<Card>,
    /// Every face up card on the table, the dealer's included.
    pub visible_cards: &'a [Card],
    pub num_splits: usize,
    pub is_split_child: bool,
}

/// Supplies every decision a player makes during a round.
pub trait DecisionPolicy {
    fn stay(&mut self, view: &PlayerView<'_>) -> Stay;

    /// How many positions to bet on this round, at most `available`.
    fn bet_count(&mut self, view: &PlayerView<'_>, available: usize) -> usize;

    /// The wager for the given seat position.
    fn bet_amount(&mut self, view: &PlayerView<'_>, position: usize) -> f64;

    fn insurance(&mut self, view: &PositionView<'_>) -> InsuranceChoice;

    fn insurance_amount(&mut self, view: &PositionView<'_>) -> f64;

    fn play(&mut self, view: &PositionView<'_>) -> Action;

    fn double_amount(&mut self, view: &PositionView<'_>) -> f64;

    /// Notification of a resolved wager and the amount won or lost.
    fn outcome(&mut self, _outcome: Outcome, _amount: f64) {}

    /// Notification that the last answer given at `step` was rejected.
    fn error(&mut self, _step: Step, _message: &str) {}
}

impl<P: DecisionPolicy + ?Sized> DecisionPolicy for Box<P> {
    fn stay(&mut self, view: &PlayerView<'_>) -> Stay {
        (**self).stay(view)
    }

    fn bet_count(&mut self, view: &PlayerView<'_>, available: usize) -> usize {
        (**self).bet_count(view, available)
    }

    fn bet_amount(&mut self, view: &PlayerView<'_>, position: usize) -> f64 {
        (**self).bet_amount(view, position)
    }

    fn insurance(&mut self, view: &PositionView<'_>) -> InsuranceChoice {
        (**self).insurance(view)
    }

    fn insurance_amount(&mut self, view: &PositionView<'_>) -> f64 {
        (**self).insurance_amount(view)
    }

    fn play(&mut self, view: &PositionView<'_>) -> Action {
        (**self).play(view)
    }

    fn double_amount(&mut self, view: &PositionView<'_>) -> f64 {
        (**self).double_amount(view)
    }

    fn outcome(&mut self, outcome: Outcome, amount: f64) {
        (**self).outcome(outcome, amount)
    }

    fn error(&mut self, step: Step, message: &str) {
        (**self).error(step, message)
    }
}

/// Everything a `ScriptedPolicy` was told, shared so it can be inspected after the policy has
/// been handed to a table.
#[derive(Debug, Default)]
pub struct PolicyLog {
    pub outcomes: Vec<(Outcome, f64)>,
    pub errors: Vec<(Step, String)>,
}

pub type SharedPolicyLog = Arc<Mutex<PolicyLog>>;

/// Replays queued answers in order. Once a queue runs dry the policy stays, bets the table
/// minimum on one position, declines insurance and stands.
#[derive(Debug, Default)]
pub struct ScriptedPolicy {
    stays: VecDeque<Stay>,
    bet_counts: VecDeque<usize>,
    bet_amounts: VecDeque<f64>,
    insurances: VecDeque<InsuranceChoice>,
    insurance_amounts: VecDeque<f64>,
    plays: VecDeque<Action>,
    double_amounts: VecDeque<f64>,
    log: SharedPolicyLog,
}

impl ScriptedPolicy {
    pub fn new() -> ScriptedPolicy {
        ScriptedPolicy::default()
    }

    pub fn stays<I: IntoIterator<Item = Stay>>(mut self, answers: I) -> Self {
        self.stays.extend(answers);
        self
    }

    pub fn bet_counts<I: IntoIterator<Item = usize>>(mut self, answers: I) -> Self {
        self.bet_counts.extend(answers);
        self
    }

    pub fn bet_amounts<I: IntoIterator<Item = f64>>(mut self, answers: I) -> Self {
        self.bet_amounts.extend(answers);
        self
    }

    pub fn insurances<I: IntoIterator<Item = InsuranceChoice>>(mut self, answers: I) -> Self {
        self.insurances.extend(answers);
        self
    }

    pub fn insurance_amounts<I: IntoIterator<Item = f64>>(mut self, answers: I) -> Self {
        self.insurance_amounts.extend(answers);
        self
    }

    pub fn plays<I: IntoIterator<Item = Action>>(mut self, answers: I) -> Self {
        self.plays.extend(answers);
        self
    }

    pub fn double_amounts<I: IntoIterator<Item = f64>>(mut self, answers: I) -> Self {
        self.double_amounts.extend(answers);
        self
    }

    /// Handle on the outcomes and errors this policy receives.
    pub fn log(&self) -> SharedPolicyLog {
        Arc::clone(&self.log)
    }
}

impl DecisionPolicy for ScriptedPolicy {
    fn stay(&mut self, _view: &PlayerView<'_>) -> Stay {
        self.stays.pop_front().unwrap_or(Stay::Stay)
    }

    fn bet_count(&mut self, _view: &PlayerView<'_>, available: usize) -> usize {
        self.bet_counts
            .pop_front()
            .unwrap_or(usize::min(1, available))
    }

    fn bet_amount(&mut self, view: &PlayerView<'_>, _position: usize) -> f64 {
        self.bet_amounts.pop_front().unwrap_or(view.min_bet)
    }

    fn insurance(&mut self, _view: &PositionView<'_>) -> InsuranceChoice {
        self.insurances
            .pop_front()
            .unwrap_or(InsuranceChoice::NoInsurance)
    }

    fn insurance_amount(&mut self, view: &PositionView<'_>) -> f64 {
        self.insurance_amounts
            .pop_front()
            .unwrap_or(view.stake / 2.0)
    }

    fn play(&mut self, _view: &PositionView<'_>) -> Action {
        self.plays.pop_front().unwrap_or(Action::Stand)
    }

    fn double_amount(&mut self, view: &PositionView<'_>) -> f64 {
        self.double_amounts.pop_front().unwrap_or(view.stake)
    }

    fn outcome(&mut self, outcome: Outcome, amount: f64) {
        if let Ok(mut log) = self.log.lock() {
            log.outcomes.push((outcome, amount));
        }
    }

    fn error(&mut self, step: Step, message: &str) {
        if let Ok(mut log) = self.log.lock() {
            log.errors.push((step, message.to_string()));
        }
    }
}
