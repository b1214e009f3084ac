use crate::bank::Bank;
use crate::policy::DecisionPolicy;
use std::fmt::Display;

/// A seated player: a bankroll and the policy that makes every decision for it.
pub struct Player {
    pub(crate) id: usize,
    pub(crate) name: String,
    pub(crate) seat: usize,
    pub(crate) bank: Bank,
    pub(crate) policy: Box<dyn DecisionPolicy + Send>,
    pub(crate) rounds_played: u32,
}

impl Player {
    pub fn new<S: Into<String>>(
        id: usize,
        name: S,
        seat: usize,
        starting_balance: f64,
        policy: Box<dyn DecisionPolicy + Send>,
    ) -> Player {
        let name = name.into();
        Player {
            id,
            bank: Bank::new(name.clone(), starting_balance),
            name,
            seat,
            policy,
            rounds_played: 0,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The seat position the player sits at, the first position they may bet on.
    pub fn seat(&self) -> usize {
        self.seat
    }

    pub fn balance(&self) -> f64 {
        self.bank.balance()
    }

    pub fn bank(&self) -> &Bank {
        &self.bank
    }

    pub fn rounds_played(&self) -> u32 {
        self.rounds_played
    }

    /// Method for determining whether the player can still afford the table minimum.
    pub fn continue_play(&self, min_bet: f64) -> bool {
        self.bank.balance() >= min_bet
    }

    /// Restores the bankroll, used between simulations.
    pub fn reset(&mut self, balance: f64) {
        self.bank.reset(balance);
        self.rounds_played = 0;
    }
}

impl Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:<21}{}\n{:<21}{}\n{:<21}${:.2}",
            "player:", self.name, "seat:", self.seat, "balance:", self.bank.balance()
        )
    }
}
