//! Presentation hooks. Announcers are told what happens at the table but never influence it.

use crate::bet_box::BoxId;
use crate::policy::Outcome;

#[derive(Debug, Clone, PartialEq)]
pub enum TableEvent {
    RoundStarted { round: u32 },
    Shuffled { cards: usize },
    HandValue { box_id: BoxId, soft_sum: u32, hard_sum: u32 },
    DealerHandValue { soft_sum: u32, hard_sum: u32 },
    Outcome { player: usize, box_id: Option<BoxId>, outcome: Outcome, amount: f64 },
    PlayerLeft { player: usize },
}

pub trait Announcer {
    fn announce(&mut self, event: &TableEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAnnouncer;

impl Announcer for NullAnnouncer {
    fn announce(&mut self, _event: &TableEvent) {}
}

/// Forwards every event to the `log` facade at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAnnouncer;

impl Announcer for LogAnnouncer {
    fn announce(&mut self, event: &TableEvent) {
        match event {
            TableEvent::RoundStarted { round } => log::debug!("round {round} started"),
            TableEvent::Shuffled { cards } => log::debug!("shoe shuffled, {cards} cards"),
            TableEvent::HandValue {
                box_id,
                soft_sum,
                hard_sum,
            } => log::debug!("box {box_id} now at {soft_sum}/{hard_sum}"),
            TableEvent::DealerHandValue { soft_sum, hard_sum } => {
                log::debug!("dealer now at {soft_sum}/{hard_sum}")
            }
            TableEvent::Outcome {
                player,
                box_id,
                outcome,
                amount,
            } => log::debug!("player {player} box {box_id:?}: {outcome:?} {amount:+.2}"),
            TableEvent::PlayerLeft { player } => log::debug!("player {player} left the table"),
        }
    }
}
