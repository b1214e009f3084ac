//! Round statistics. The round state machine reports discrete events here and nothing in the
//! engine reads them back, so the aggregator can be tested and merged on its own.

use crate::policy::Outcome;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoundEvent {
    RoundPlayed,
    BetPlaced { player: usize, amount: f64 },
    /// Insurance side bets, kept out of `total_wagered`.
    InsurancePlaced { player: usize, amount: f64 },
    HandResolved { player: usize, outcome: Outcome, amount: f64 },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub rounds: u32,
    pub hands: u32,
    pub wins: u32,
    pub pushes: u32,
    pub losses: u32,
    pub busts: u32,
    pub surrenders: u32,
    pub blackjacks: u32,
    pub insurance_won: u32,
    pub insurance_lost: u32,
    /// Main wagers only: opening bets, split stakes and double downs.
    pub total_wagered: f64,
    pub total_insured: f64,
    /// Net result for the players, positive when the players are ahead.
    pub winnings: f64,
}

impl Statistics {
    pub fn new() -> Statistics {
        Statistics::default()
    }

    pub fn record(&mut self, event: &RoundEvent) {
        match *event {
            RoundEvent::RoundPlayed => self.rounds += 1,
            RoundEvent::BetPlaced { amount, .. } => self.total_wagered += amount,
            RoundEvent::InsurancePlaced { amount, .. } => self.total_insured += amount,
            RoundEvent::HandResolved {
                outcome, amount, ..
            } => {
                self.winnings += amount;
                match outcome {
                    Outcome::InsuranceWon => self.insurance_won += 1,
                    Outcome::InsuranceLost => self.insurance_lost += 1,
                    _ => {
                        self.hands += 1;
                        match outcome {
                            Outcome::Won => self.wins += 1,
                            Outcome::Blackjack | Outcome::EvenMoney => {
                                self.wins += 1;
                                self.blackjacks += 1;
                            }
                            Outcome::Pushed => self.pushes += 1,
                            Outcome::Lost => self.losses += 1,
                            Outcome::Bust => {
                                self.losses += 1;
                                self.busts += 1;
                            }
                            Outcome::Surrendered => {
                                self.losses += 1;
                                self.surrenders += 1;
                            }
                            Outcome::InsuranceWon | Outcome::InsuranceLost => {}
                        }
                    }
                }
            }
        }
    }

    /// Adds the counts of `other` into `self`.
    pub fn merge(&mut self, other: &Statistics) {
        self.rounds += other.rounds;
        self.hands += other.hands;
        self.wins += other.wins;
        self.pushes += other.pushes;
        self.losses += other.losses;
        self.busts += other.busts;
        self.surrenders += other.surrenders;
        self.blackjacks += other.blackjacks;
        self.insurance_won += other.insurance_won;
        self.insurance_lost += other.insurance_lost;
        self.total_wagered += other.total_wagered;
        self.total_insured += other.total_insured;
        self.winnings += other.winnings;
    }

    fn ratio(n: u32, d: u32) -> f64 {
        if d == 0 {
            0.0
        } else {
            n as f64 / d as f64
        }
    }

    pub fn win_percentage(&self) -> f64 {
        Statistics::ratio(self.wins, self.hands)
    }

    pub fn push_percentage(&self) -> f64 {
        Statistics::ratio(self.pushes, self.hands)
    }

    pub fn loss_percentage(&self) -> f64 {
        Statistics::ratio(self.losses, self.hands)
    }

    pub fn average_winnings_per_hand(&self) -> f64 {
        if self.hands == 0 {
            0.0
        } else {
            self.winnings / self.hands as f64
        }
    }
}

impl Display for Statistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const TEXT_WIDTH: usize = "average winnings per hand".len() + 10;
        const NUM_WIDTH: usize = 80 - TEXT_WIDTH;
        writeln!(f, "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}", "rounds played", self.rounds)?;
        writeln!(f, "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}", "hands played", self.hands)?;
        writeln!(f, "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}", "hands won", self.wins)?;
        writeln!(f, "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}", "hands pushed", self.pushes)?;
        writeln!(f, "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}", "hands lost", self.losses)?;
        writeln!(f, "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}", "busts", self.busts)?;
        writeln!(f, "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}", "surrenders", self.surrenders)?;
        writeln!(f, "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}", "player blackjacks", self.blackjacks)?;
        writeln!(
            f,
            "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}",
            "insurance won/lost",
            format!("{}/{}", self.insurance_won, self.insurance_lost)
        )?;
        writeln!(f, "{:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}", "total wagered", self.total_wagered)?;
        writeln!(f, "{:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}", "total insured", self.total_insured)?;
        writeln!(f, "{:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}", "winnings", self.winnings)?;
        writeln!(f, "{:<TEXT_WIDTH$}{:>NUM_WIDTH$.4}", "win percentage", self.win_percentage())?;
        write!(
            f,
            "{:<TEXT_WIDTH$}{:>NUM_WIDTH$.4}",
            "average winnings per hand",
            self.average_winnings_per_hand()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_outcomes() {
        let mut stats = Statistics::new();
        stats.record(&RoundEvent::RoundPlayed);
        stats.record(&RoundEvent::BetPlaced { player: 0, amount: 10.0 });
        stats.record(&RoundEvent::BetPlaced { player: 0, amount: 10.0 });
        stats.record(&RoundEvent::HandResolved { player: 0, outcome: Outcome::Blackjack, amount: 15.0 });
        stats.record(&RoundEvent::HandResolved { player: 0, outcome: Outcome::Bust, amount: -10.0 });
        stats.record(&RoundEvent::HandResolved { player: 0, outcome: Outcome::InsuranceLost, amount: -5.0 });

        assert_eq!(stats.rounds, 1);
        assert_eq!(stats.hands, 2);
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.blackjacks, 1);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.busts, 1);
        assert_eq!(stats.insurance_lost, 1);
        assert_eq!(stats.total_wagered, 20.0);
        assert_eq!(stats.winnings, 0.0);
        assert_eq!(stats.win_percentage(), 0.5);
    }

    #[test]
    fn merge_adds_counts() {
        let mut a = Statistics::new();
        a.record(&RoundEvent::HandResolved { player: 0, outcome: Outcome::Pushed, amount: 0.0 });
        let mut b = Statistics::new();
        b.record(&RoundEvent::HandResolved { player: 1, outcome: Outcome::Surrendered, amount: -5.0 });
        a.merge(&b);
        assert_eq!(a.hands, 2);
        assert_eq!(a.pushes, 1);
        assert_eq!(a.surrenders, 1);
        assert_eq!(a.winnings, -5.0);
    }

    #[test]
    fn insurance_is_kept_apart_from_wagers() {
        let mut stats = Statistics::new();
        stats.record(&RoundEvent::BetPlaced { player: 0, amount: 10.0 });
        stats.record(&RoundEvent::InsurancePlaced { player: 0, amount: 5.0 });
        stats.record(&RoundEvent::HandResolved { player: 0, outcome: Outcome::InsuranceWon, amount: 10.0 });
        stats.record(&RoundEvent::HandResolved { player: 0, outcome: Outcome::Lost, amount: -10.0 });
        assert_eq!(stats.total_wagered, 10.0);
        assert_eq!(stats.total_insured, 5.0);
        assert_eq!(stats.hands, 1);

        let mut merged = Statistics::new();
        merged.merge(&stats);
        merged.merge(&stats);
        assert_eq!(merged.total_insured, 10.0);
        assert!(format!("{}", merged).contains("total insured"));
    }

    #[test]
    fn empty_statistics_have_zero_ratios() {
        let stats = Statistics::new();
        assert_eq!(stats.win_percentage(), 0.0);
        assert_eq!(stats.average_winnings_per_hand(), 0.0);
        assert!(format!("{}", stats).contains("hands played"));
    }
}
