//! The round state machine. A `GamePlay` drives one `Table` through
//! `BettingOpen -> Dealing -> DealerBlackjackCheck -> InsuranceResolution -> PlayerTurns ->
//! DealerTurn -> Settlement -> Reset`, asking each player's `DecisionPolicy` for every choice and
//! validating the answer before anything is committed.

use crate::announcer::{Announcer, NullAnnouncer, TableEvent};
use crate::bet_box::{BetBox, BoxId, BoxStatus};
use crate::card::{Card, Orientation};
use crate::config::TableConfig;
use crate::error::{BetBoxError, BlackjackGameError};
use crate::hand::{Hand, BLACKJACK};
use crate::player::Player;
use crate::policy::{
    Action, DecisionPolicy, InsuranceChoice, Outcome, PlayerView, PositionView, Stay, Step,
};
use crate::stats::{RoundEvent, Statistics};
use crate::table::{player_index, Table};
use std::fmt::Debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    BettingOpen,
    Dealing,
    DealerBlackjackCheck,
    InsuranceResolution,
    PlayerTurns,
    DealerTurn,
    Settlement,
    Reset,
}

/// The dealer's fixed drawing rule.
pub fn dealer_should_hit(hand: &Hand, hits_soft_17: bool) -> bool {
    hand.hard_sum() < 17 || (hits_soft_17 && hand.hard_sum() == 17 && hand.is_soft())
}

/// A natural only counts on a position that was never split.
pub fn is_natural(bet_box: &BetBox) -> bool {
    bet_box.hand().is_blackjack() && !bet_box.is_split_child()
}

/// Outcome of a position still in play once the dealer has finished.
pub fn settle_outcome(
    natural: bool,
    player_total: u32,
    dealer_blackjack: bool,
    dealer_total: u32,
    dealer_bust: bool,
) -> Outcome {
    if dealer_blackjack {
        return if natural {
            Outcome::Pushed
        } else {
            Outcome::Lost
        };
    }
    if natural {
        return Outcome::Blackjack;
    }
    if dealer_bust || player_total > dealer_total {
        Outcome::Won
    } else if dealer_total > player_total {
        Outcome::Lost
    } else {
        Outcome::Pushed
    }
}

/// Legality of `action` on `bet_box`, `Err` holds the message passed back to the policy.
pub fn check_action(
    config: &TableConfig,
    bet_box: &BetBox,
    num_splits: usize,
    balance: f64,
    action: Action,
) -> Result<(), String> {
    let hand = bet_box.hand();
    match action {
        Action::Stand => Ok(()),
        Action::Hit if !hand.is_hittable() => Err(format!(
            "cannot hit on {}",
            hand.formatted_hand_values()
        )),
        Action::Hit => Ok(()),
        Action::Surrender if !config.surrender => {
            Err("surrender is not offered at this table".to_string())
        }
        Action::Surrender if hand.len() != 2 || bet_box.is_split_child() => {
            Err("surrender is only allowed on the original two cards".to_string())
        }
        Action::Surrender => Ok(()),
        Action::Split if !hand.is_pair() => Err(format!("{} is not a pair", hand)),
        Action::Split if num_splits >= config.max_splits => Err(format!(
            "the table allows at most {} splits",
            config.max_splits
        )),
        Action::Split if balance < bet_box.stake() => Err(format!(
            "insufficient funds to split: need {:.2}, have {:.2}",
            bet_box.stake(),
            balance
        )),
        Action::Split => Ok(()),
        Action::DoubleDown if hand.len() != 2 => {
            Err("double down is only allowed on two cards".to_string())
        }
        Action::DoubleDown if !config.can_double_on(hand.soft_sum(), hand.hard_sum()) => Err(
            format!("cannot double down on {}", hand.formatted_hand_values()),
        ),
        Action::DoubleDown if !(balance > 0.0) => {
            Err("insufficient funds to double down".to_string())
        }
        Action::DoubleDown => Ok(()),
    }
}

fn check_amount(amount: f64, min: f64, max: f64, balance: f64) -> Result<(), String> {
    if !amount.is_finite() || amount < min || amount > max {
        return Err(format!(
            "amount {:.2} must lie between {:.2} and {:.2}",
            amount, min, max
        ));
    }
    if amount > balance {
        return Err(format!(
            "insufficient funds: requested {:.2}, available {:.2}",
            amount, balance
        ));
    }
    Ok(())
}

/// Asks `policy` until `validate` accepts the answer. Every rejection is reported back through
/// `DecisionPolicy::error`; with a retry limit configured, hitting it is fatal.
fn solicit<P, T, A, V>(
    policy: &mut P,
    step: Step,
    limit: Option<u32>,
    mut ask: A,
    validate: V,
) -> Result<T, BlackjackGameError>
where
    P: DecisionPolicy + ?Sized,
    T: Debug,
    A: FnMut(&mut P) -> T,
    V: Fn(&T) -> Result<(), String>,
{
    let mut attempts = 0u32;
    loop {
        let answer = ask(&mut *policy);
        match validate(&answer) {
            Ok(()) => return Ok(answer),
            Err(message) => {
                log::warn!("rejected {:?} at step {:?}: {}", answer, step, message);
                policy.error(step, &message);
                attempts += 1;
                if let Some(limit) = limit {
                    if attempts >= limit {
                        log::error!("giving up on step {:?} after {} attempts", step, attempts);
                        return Err(BlackjackGameError::RetryLimitExceeded { step });
                    }
                }
            }
        }
    }
}

fn position_view<'a>(
    bet_box: &'a BetBox,
    balance: f64,
    dealer_up_card: Option<Card>,
    visible_cards: &'a [Card],
    num_splits: usize,
) -> PositionView<'a> {
    PositionView {
        box_id: bet_box.id(),
        hand: bet_box.hand(),
        stake: bet_box.stake(),
        balance,
        dealer_up_card,
        visible_cards,
        num_splits,
        is_split_child: bet_box.is_split_child(),
    }
}

/// Drives rounds at a single table.
pub struct GamePlay {
    table: Table,
    announcer: Box<dyn Announcer + Send>,
    stats: Statistics,
    phase: Phase,
    round: u32,
    dealer_blackjack: bool,
}

impl GamePlay {
    pub fn new(table: Table) -> GamePlay {
        GamePlay {
            table,
            announcer: Box::new(NullAnnouncer),
            stats: Statistics::new(),
            phase: Phase::Reset,
            round: 0,
            dealer_blackjack: false,
        }
    }

    pub fn with_announcer(mut self, announcer: Box<dyn Announcer + Send>) -> GamePlay {
        self.announcer = announcer;
        self
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut Table {
        &mut self.table
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    /// Hands back the statistics gathered so far and starts a fresh aggregate.
    pub fn take_stats(&mut self) -> Statistics {
        std::mem::take(&mut self.stats)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of betting rounds opened so far.
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn into_table(self) -> Table {
        self.table
    }

    /// Plays rounds until the configured round limit is reached or every player has left.
    pub fn run(&mut self) -> Result<(), BlackjackGameError> {
        loop {
            if let Some(max_rounds) = self.table.config.max_rounds {
                if self.round >= max_rounds {
                    break;
                }
            }
            if self.table.players.is_empty() {
                log::info!("no players left at the table");
                break;
            }
            self.play_round()?;
        }
        Ok(())
    }

    /// Plays at most `rounds` more rounds, stopping early once the table is empty.
    pub fn play_rounds(&mut self, rounds: u32) -> Result<u32, BlackjackGameError> {
        let mut played = 0;
        for _ in 0..rounds {
            if self.table.players.is_empty() {
                break;
            }
            self.play_round()?;
            played += 1;
        }
        Ok(played)
    }

    /// Method that plays a single round. Returns `false` when nobody placed a wager, in which
    /// case nothing was dealt.
    pub fn play_round(&mut self) -> Result<bool, BlackjackGameError> {
        self.round += 1;
        self.announcer
            .announce(&TableEvent::RoundStarted { round: self.round });

        if self.table.shoe.needs_shuffle() {
            self.table.shoe.shuffle();
            self.table.shoe.place_marker_card(None)?;
            self.announcer.announce(&TableEvent::Shuffled {
                cards: self.table.shoe.remaining(),
            });
        }

        if !self.open_betting()? {
            log::info!("round {}: no wagers placed", self.round);
            self.phase = Phase::Reset;
            return Ok(false);
        }
        self.deal()?;
        self.check_dealer_blackjack()?;
        if !self.dealer_blackjack {
            self.player_turns()?;
            self.dealer_turn()?;
        }
        self.settle()?;
        self.reset()?;
        self.stats.record(&RoundEvent::RoundPlayed);
        log::info!("round {} finished", self.round);
        Ok(true)
    }

    fn owner(&self, id: BoxId) -> Result<(usize, usize), BlackjackGameError> {
        let player = self
            .table
            .boxes
            .get(id)?
            .player()
            .ok_or(BetBoxError::Unowned(id))?;
        Ok((player, player_index(&self.table.players, player)?))
    }

    fn leave(&mut self, player: usize) {
        if self.table.remove_player(player) {
            self.announcer.announce(&TableEvent::PlayerLeft { player });
        }
    }

    fn report(
        &mut self,
        player: usize,
        box_id: Option<BoxId>,
        outcome: Outcome,
        amount: f64,
    ) -> Result<(), BlackjackGameError> {
        self.stats.record(&RoundEvent::HandResolved {
            player,
            outcome,
            amount,
        });
        self.announcer.announce(&TableEvent::Outcome {
            player,
            box_id,
            outcome,
            amount,
        });
        let idx = player_index(&self.table.players, player)?;
        self.table.players[idx].policy.outcome(outcome, amount);
        Ok(())
    }

    fn announce_hand(&mut self, id: BoxId) -> Result<(), BlackjackGameError> {
        let hand = self.table.boxes.get(id)?.hand();
        let event = TableEvent::HandValue {
            box_id: id,
            soft_sum: hand.soft_sum(),
            hard_sum: hand.hard_sum(),
        };
        self.announcer.announce(&event);
        Ok(())
    }

    fn announce_dealer(&mut self) {
        let event = TableEvent::DealerHandValue {
            soft_sum: self.table.dealer.soft_sum(),
            hard_sum: self.table.dealer.hard_sum(),
        };
        self.announcer.announce(&event);
    }

    fn open_betting(&mut self) -> Result<bool, BlackjackGameError> {
        self.phase = Phase::BettingOpen;
        let min_bet = self.table.config.min_bet;
        let max_bet = self.table.config.max_bet;
        let limit = self.table.config.decision_retry_limit;
        let ten_percentage = self.table.shoe.current_ten_percentage();
        let ids: Vec<usize> = self.table.players.iter().map(|p| p.id()).collect();

        for id in ids {
            let idx = player_index(&self.table.players, id)?;
            // Players who can no longer cover the minimum are walked from the table
            if !self.table.players[idx].continue_play(min_bet) {
                log::info!("player {} cannot cover the table minimum", id);
                self.leave(id);
                continue;
            }
            let positions = self
                .table
                .available_positions(self.table.players[idx].seat());

            let Player {
                name,
                bank,
                policy,
                rounds_played,
                ..
            } = &mut self.table.players[idx];
            let view = PlayerView {
                player: id,
                name: name.as_str(),
                balance: bank.balance(),
                min_bet,
                max_bet,
                ten_percentage,
                rounds_played: *rounds_played,
            };
            if policy.stay(&view) == Stay::Leave {
                self.leave(id);
                continue;
            }

            let available = positions.len();
            let count = solicit(
                &mut **policy,
                Step::BetCount,
                limit,
                |p| p.bet_count(&view, available),
                |&count| {
                    if count <= available {
                        Ok(())
                    } else {
                        Err(format!("at most {} positions are available", available))
                    }
                },
            )?;

            for &position in positions.iter().take(count) {
                let balance = bank.balance();
                if balance < min_bet {
                    log::debug!("player {} has no funds left for position {}", id, position);
                    break;
                }
                let view = PlayerView {
                    balance,
                    ..view.clone()
                };
                let amount = solicit(
                    &mut **policy,
                    Step::BetAmount,
                    limit,
                    |p| p.bet_amount(&view, position),
                    |&amount| check_amount(amount, min_bet, max_bet, balance),
                )?;
                let root = self.table.boxes.root(position);
                self.table.boxes.bet(root, id, bank, amount)?;
                self.stats.record(&RoundEvent::BetPlaced { player: id, amount });
            }
            *rounds_played += 1;
        }

        Ok(!self.table.boxes.active_leaves().is_empty())
    }

    fn deal(&mut self) -> Result<(), BlackjackGameError> {
        self.phase = Phase::Dealing;
        let leaves = self.table.boxes.active_leaves();
        for &id in leaves.iter() {
            self.table
                .shoe
                .deal_one(self.table.boxes.hand_mut(id)?, Orientation::FaceUp)?;
        }
        self.table
            .shoe
            .deal_one(&mut self.table.dealer, Orientation::FaceUp)?;
        for &id in leaves.iter() {
            self.table
                .shoe
                .deal_one(self.table.boxes.hand_mut(id)?, Orientation::FaceUp)?;
        }
        self.table
            .shoe
            .deal_one(&mut self.table.dealer, Orientation::FaceDown)?;

        for &id in leaves.iter() {
            self.announce_hand(id)?;
        }
        Ok(())
    }

    fn check_dealer_blackjack(&mut self) -> Result<(), BlackjackGameError> {
        self.phase = Phase::DealerBlackjackCheck;
        self.dealer_blackjack = false;
        let up_card = match self.table.dealer.up_card() {
            Some(card) => *card,
            None => return Ok(()),
        };
        if up_card.is_ace() && self.table.config.insurance {
            self.offer_insurance(up_card)?;
        }
        if !(up_card.is_ace() || up_card.is_ten_valued()) {
            return Ok(());
        }

        self.phase = Phase::InsuranceResolution;
        self.dealer_blackjack = self.table.dealer.is_blackjack();
        if self.dealer_blackjack {
            log::debug!("dealer has blackjack");
            self.table.dealer.reveal();
            self.announce_dealer();
        }

        for id in self.table.boxes.active_leaves() {
            let insured = self.table.boxes.get(id)?.insurance();
            if insured == 0.0 {
                continue;
            }
            let (player, idx) = self.owner(id)?;
            let bet_box = self.table.boxes.get_mut(id)?;
            if self.dealer_blackjack {
                let payout = insured * 2.0;
                self.table
                    .house
                    .transfer_to(&mut bet_box.insurance, payout)?;
                bet_box
                    .insurance
                    .drain_to(&mut self.table.players[idx].bank)?;
                self.report(player, Some(id), Outcome::InsuranceWon, payout)?;
            } else {
                bet_box.insurance.drain_to(&mut self.table.house)?;
                self.report(player, Some(id), Outcome::InsuranceLost, -insured)?;
            }
        }
        Ok(())
    }

    fn offer_insurance(&mut self, up_card: Card) -> Result<(), BlackjackGameError> {
        let limit = self.table.config.decision_retry_limit;
        let visible = self.table.visible_cards();

        for id in self.table.boxes.active_leaves() {
            let (player, idx) = self.owner(id)?;
            let num_splits = self.table.boxes.num_splits(id)?;
            let bet_box = self.table.boxes.get(id)?;
            let Player { bank, policy, .. } = &mut self.table.players[idx];
            let balance = bank.balance();
            let stake = bet_box.stake();
            let view = position_view(bet_box, balance, Some(up_card), &visible, num_splits);
            let natural = is_natural(bet_box);

            let choice = solicit(
                &mut **policy,
                Step::Insurance,
                limit,
                |p| p.insurance(&view),
                |&choice| match choice {
                    InsuranceChoice::EvenMoney if !natural => {
                        Err("even money is only offered on a natural blackjack".to_string())
                    }
                    InsuranceChoice::Insurance if !(balance > 0.0) => {
                        Err("insufficient funds for an insurance wager".to_string())
                    }
                    _ => Ok(()),
                },
            )?;

            match choice {
                InsuranceChoice::NoInsurance => {}
                InsuranceChoice::Insurance => {
                    let amount = solicit(
                        &mut **policy,
                        Step::InsuranceAmount,
                        limit,
                        |p| p.insurance_amount(&view),
                        |&amount| {
                            if amount > 0.0 {
                                check_amount(amount, 0.0, stake / 2.0, balance)
                            } else {
                                Err("insurance must be a positive amount".to_string())
                            }
                        },
                    )?;
                    let bet_box = self.table.boxes.get_mut(id)?;
                    bank.transfer_to(&mut bet_box.insurance, amount)?;
                    self.stats.record(&RoundEvent::InsurancePlaced { player, amount });
                }
                InsuranceChoice::EvenMoney => {
                    let bet_box = self.table.boxes.get_mut(id)?;
                    self.table.house.transfer_to(&mut bet_box.stake, stake)?;
                    bet_box.stake.drain_to(bank)?;
                    bet_box.status = BoxStatus::Resolved;
                    self.report(player, Some(id), Outcome::EvenMoney, stake)?;
                }
            }
        }
        Ok(())
    }

    fn player_turns(&mut self) -> Result<(), BlackjackGameError> {
        self.phase = Phase::PlayerTurns;
        let roots: Vec<BoxId> = self
            .table
            .boxes
            .active_roots()
            .filter(|b| b.status() == BoxStatus::InPlay)
            .map(|b| b.id())
            .collect();
        for id in roots {
            self.play_box(id)?;
        }
        Ok(())
    }

    /// Plays one position to the end of its turn. A split plays both children out completely,
    /// left before right, before returning.
    fn play_box(&mut self, id: BoxId) -> Result<(), BlackjackGameError> {
        // Split children arrive holding a single card
        if self.table.boxes.get(id)?.hand().len() < 2 {
            self.table
                .shoe
                .deal_one(self.table.boxes.hand_mut(id)?, Orientation::FaceUp)?;
            self.announce_hand(id)?;
        }

        loop {
            let bet_box = self.table.boxes.get(id)?;
            if bet_box.status() != BoxStatus::InPlay {
                return Ok(());
            }
            if bet_box.hand().hard_sum() == BLACKJACK || bet_box.from_split_aces() {
                self.table.boxes.get_mut(id)?.status = BoxStatus::Stood;
                return Ok(());
            }

            let action = self.solicit_action(id)?;
            log::debug!("box {}: {}", id, action);
            match action {
                Action::Hit => self.hit(id)?,
                Action::Stand => self.table.boxes.get_mut(id)?.status = BoxStatus::Stood,
                Action::DoubleDown => self.double_down(id)?,
                Action::Surrender => self.surrender(id)?,
                Action::Split => {
                    let (player, idx) = self.owner(id)?;
                    let max_splits = self.table.config.max_splits;
                    let (left, right) = self.table.boxes.split(
                        id,
                        &mut self.table.players[idx].bank,
                        max_splits,
                    )?;
                    let amount = self.table.boxes.get(left)?.stake();
                    self.stats.record(&RoundEvent::BetPlaced { player, amount });
                    self.play_box(left)?;
                    self.play_box(right)?;
                    return Ok(());
                }
            }
        }
    }

    fn solicit_action(&mut self, id: BoxId) -> Result<Action, BlackjackGameError> {
        let limit = self.table.config.decision_retry_limit;
        let visible = self.table.visible_cards();
        let up_card = self.table.dealer.up_card().copied();
        let num_splits = self.table.boxes.num_splits(id)?;
        let (_, idx) = self.owner(id)?;

        let config = &self.table.config;
        let bet_box = self.table.boxes.get(id)?;
        let Player { bank, policy, .. } = &mut self.table.players[idx];
        let balance = bank.balance();
        let view = position_view(bet_box, balance, up_card, &visible, num_splits);
        solicit(
            &mut **policy,
            Step::Play,
            limit,
            |p| p.play(&view),
            |&action| check_action(config, bet_box, num_splits, balance, action),
        )
    }

    fn hit(&mut self, id: BoxId) -> Result<(), BlackjackGameError> {
        self.table
            .shoe
            .deal_one(self.table.boxes.hand_mut(id)?, Orientation::FaceUp)?;
        self.announce_hand(id)?;
        if self.table.boxes.get(id)?.hand().is_bust() {
            self.bust(id)?;
        }
        Ok(())
    }

    fn bust(&mut self, id: BoxId) -> Result<(), BlackjackGameError> {
        let (player, _) = self.owner(id)?;
        let bet_box = self.table.boxes.get_mut(id)?;
        let lost = bet_box.stake.drain_to(&mut self.table.house)?;
        bet_box.status = BoxStatus::Bust;
        self.report(player, Some(id), Outcome::Bust, -lost)
    }

    fn double_down(&mut self, id: BoxId) -> Result<(), BlackjackGameError> {
        let limit = self.table.config.decision_retry_limit;
        let visible = self.table.visible_cards();
        let up_card = self.table.dealer.up_card().copied();
        let num_splits = self.table.boxes.num_splits(id)?;
        let (player, idx) = self.owner(id)?;

        let amount = {
            let bet_box = self.table.boxes.get(id)?;
            let Player { bank, policy, .. } = &mut self.table.players[idx];
            let balance = bank.balance();
            let stake = bet_box.stake();
            let view = position_view(bet_box, balance, up_card, &visible, num_splits);
            solicit(
                &mut **policy,
                Step::DoubleAmount,
                limit,
                |p| p.double_amount(&view),
                |&amount| {
                    if amount > 0.0 {
                        check_amount(amount, 0.0, stake, balance)
                    } else {
                        Err("double down must be a positive amount".to_string())
                    }
                },
            )?
        };

        let bet_box = self.table.boxes.get_mut(id)?;
        self.table.players[idx]
            .bank
            .transfer_to(&mut bet_box.stake, amount)?;
        bet_box.doubled = true;
        self.stats.record(&RoundEvent::BetPlaced { player, amount });

        self.hit(id)?;
        let bet_box = self.table.boxes.get_mut(id)?;
        if bet_box.status == BoxStatus::InPlay {
            bet_box.status = BoxStatus::Stood;
        }
        Ok(())
    }

    fn surrender(&mut self, id: BoxId) -> Result<(), BlackjackGameError> {
        let (player, idx) = self.owner(id)?;
        let bet_box = self.table.boxes.get_mut(id)?;
        let stake = bet_box.stake.balance();
        let half = stake / 2.0;
        bet_box
            .stake
            .transfer_to(&mut self.table.players[idx].bank, half)?;
        let lost = bet_box.stake.drain_to(&mut self.table.house)?;
        bet_box.status = BoxStatus::Surrendered;
        self.report(player, Some(id), Outcome::Surrendered, -lost)
    }

    fn dealer_turn(&mut self) -> Result<(), BlackjackGameError> {
        self.phase = Phase::DealerTurn;
        self.table.dealer.reveal();
        self.announce_dealer();

        let boxes = &self.table.boxes;
        let needs_play = boxes
            .active_leaves()
            .into_iter()
            .filter_map(|id| boxes.get(id).ok())
            .any(|b| b.status() == BoxStatus::Stood && !is_natural(b));
        if !needs_play {
            log::debug!("no hands left to beat, dealer stands");
            return Ok(());
        }

        let hits_soft_17 = self.table.config.dealer_hits_soft_17;
        while dealer_should_hit(&self.table.dealer, hits_soft_17) {
            self.table
                .shoe
                .deal_one(&mut self.table.dealer, Orientation::FaceUp)?;
            self.announce_dealer();
        }
        log::debug!("dealer finishes on {}", self.table.dealer);
        Ok(())
    }

    fn settle(&mut self) -> Result<(), BlackjackGameError> {
        self.phase = Phase::Settlement;
        let dealer_total = self.table.dealer.hard_sum();
        let dealer_bust = self.table.dealer.is_bust();
        let payout = self.table.config.blackjack_payout;

        for id in self.table.boxes.active_leaves() {
            let bet_box = self.table.boxes.get(id)?;
            if !bet_box.is_active() {
                continue;
            }
            let outcome = settle_outcome(
                is_natural(bet_box),
                bet_box.hand().hard_sum(),
                self.dealer_blackjack,
                dealer_total,
                dealer_bust,
            );
            let stake = bet_box.stake();
            let (player, idx) = self.owner(id)?;

            let bet_box = self.table.boxes.get_mut(id)?;
            let bank = &mut self.table.players[idx].bank;
            let amount = match outcome {
                Outcome::Blackjack | Outcome::Won => {
                    let winnings = if outcome == Outcome::Blackjack {
                        stake * payout
                    } else {
                        stake
                    };
                    self.table
                        .house
                        .transfer_to(&mut bet_box.stake, winnings)?;
                    bet_box.stake.drain_to(bank)?;
                    winnings
                }
                Outcome::Pushed => {
                    bet_box.stake.drain_to(bank)?;
                    0.0
                }
                _ => -bet_box.stake.drain_to(&mut self.table.house)?,
            };
            bet_box.status = BoxStatus::Resolved;
            self.report(player, Some(id), outcome, amount)?;
        }
        Ok(())
    }

    fn reset(&mut self) -> Result<(), BlackjackGameError> {
        self.phase = Phase::Reset;
        self.table.boxes.reset(&mut self.table.shoe)?;
        let cards = self.table.dealer.take_cards();
        self.table.shoe.discard(cards);
        self.dealer_blackjack = false;
        Ok(())
    }
}
