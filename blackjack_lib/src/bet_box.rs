//! Wager positions. Every seat position on the table owns a root `BetBox`; splitting a box adds two
//! children to an arena and links them back to their parent, so a root can grow into a binary tree
//! of independent hand/stake pairs. All play and settlement happens on the leaves of that tree.

use crate::bank::Bank;
use crate::card::Card;
use crate::error::{BankError, BetBoxError, BlackjackGameError};
use crate::hand::Hand;
use crate::shoe::Shoe;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoxId(pub usize);

impl Display for BoxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoxStatus {
    /// No wager this round.
    Empty,
    /// Holds a wager and is still being played.
    InPlay,
    Stood,
    Bust,
    Surrendered,
    /// Paid out and closed before settlement, e.g. an even money blackjack.
    Resolved,
    /// Replaced by its two split children.
    Split,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetBox {
    id: BoxId,
    position: usize,
    player: Option<usize>,
    pub(crate) stake: Bank,
    pub(crate) insurance: Bank,
    pub(crate) hand: Hand,
    pub(crate) status: BoxStatus,
    pub(crate) doubled: bool,
    parent_split_box: Option<BoxId>,
    split_boxes: Option<(BoxId, BoxId)>,
    root: BoxId,
    num_splits: usize,
    from_split_aces: bool,
}

impl BetBox {
    fn new(id: BoxId, position: usize, root: BoxId) -> BetBox {
        BetBox {
            id,
            position,
            player: None,
            stake: Bank::empty(format!("box {}", id)),
            insurance: Bank::empty(format!("insurance {}", id)),
            hand: Hand::new(),
            status: BoxStatus::Empty,
            doubled: false,
            parent_split_box: None,
            split_boxes: None,
            root,
            num_splits: 0,
            from_split_aces: false,
        }
    }

    pub fn id(&self) -> BoxId {
        self.id
    }

    /// The seat position on the table the tree belongs to.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn player(&self) -> Option<usize> {
        self.player
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    pub fn stake(&self) -> f64 {
        self.stake.balance()
    }

    pub fn insurance(&self) -> f64 {
        self.insurance.balance()
    }

    pub fn status(&self) -> BoxStatus {
        self.status
    }

    pub fn doubled(&self) -> bool {
        self.doubled
    }

    pub fn parent_split_box(&self) -> Option<BoxId> {
        self.parent_split_box
    }

    pub fn split_boxes(&self) -> Option<(BoxId, BoxId)> {
        self.split_boxes
    }

    pub fn root(&self) -> BoxId {
        self.root
    }

    pub fn is_split(&self) -> bool {
        self.split_boxes.is_some()
    }

    /// True for a box created by splitting another box.
    pub fn is_split_child(&self) -> bool {
        self.parent_split_box.is_some()
    }

    /// True for a box created by splitting a pair of aces.
    pub fn from_split_aces(&self) -> bool {
        self.from_split_aces
    }

    /// Whether the box holds a wager that still takes part in the round.
    pub fn is_active(&self) -> bool {
        matches!(self.status, BoxStatus::InPlay | BoxStatus::Stood)
    }
}

/// Depth first iterator over the leaves of a split tree, left child before right child.
pub struct Leaves<'a> {
    boxes: &'a BetBoxes,
    stack: Vec<BoxId>,
}

impl<'a> Iterator for Leaves<'a> {
    type Item = &'a BetBox;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            let bet_box = self.boxes.boxes.get(id.0)?;
            match bet_box.split_boxes {
                Some((left, right)) => {
                    self.stack.push(right);
                    self.stack.push(left);
                }
                None => return Some(bet_box),
            }
        }
        None
    }
}

/// Arena holding every wager position at the table. The first `num_positions` boxes are the
/// roots, split children are appended behind them and dropped when the round is reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetBoxes {
    boxes: Vec<BetBox>,
    num_positions: usize,
}

impl BetBoxes {
    pub fn new(num_positions: usize) -> BetBoxes {
        let boxes = (0..num_positions)
            .map(|p| BetBox::new(BoxId(p), p, BoxId(p)))
            .collect();
        BetBoxes {
            boxes,
            num_positions,
        }
    }

    pub fn num_positions(&self) -> usize {
        self.num_positions
    }

    /// The root box of a seat position.
    pub fn root(&self, position: usize) -> BoxId {
        BoxId(position)
    }

    pub fn get(&self, id: BoxId) -> Result<&BetBox, BetBoxError> {
        self.boxes.get(id.0).ok_or(BetBoxError::UnknownBox(id))
    }

    pub(crate) fn get_mut(&mut self, id: BoxId) -> Result<&mut BetBox, BetBoxError> {
        self.boxes.get_mut(id.0).ok_or(BetBoxError::UnknownBox(id))
    }

    /// Mutable access to the hand of a leaf box, for dealing.
    pub fn hand_mut(&mut self, id: BoxId) -> Result<&mut Hand, BetBoxError> {
        let bet_box = self.get_mut(id)?;
        if bet_box.is_split() {
            return Err(BetBoxError::NotALeaf(id));
        }
        Ok(&mut bet_box.hand)
    }

    /// Root boxes holding a wager this round, in seat order.
    pub fn active_roots(&self) -> impl Iterator<Item = &BetBox> {
        self.boxes[..self.num_positions]
            .iter()
            .filter(|b| b.status != BoxStatus::Empty)
    }

    /// Every leaf reachable from `id`: the box itself when unsplit, otherwise its split tree
    /// depth first.
    pub fn iter(&self, id: BoxId) -> Leaves<'_> {
        Leaves {
            boxes: self,
            stack: vec![id],
        }
    }

    /// Leaves of every active root in seat order.
    pub fn active_leaves(&self) -> Vec<BoxId> {
        self.active_roots()
            .flat_map(|root| self.iter(root.id))
            .map(|b| b.id)
            .collect()
    }

    /// Number of splits performed anywhere in the tree `id` belongs to.
    pub fn num_splits(&self, id: BoxId) -> Result<usize, BetBoxError> {
        let root = self.get(id)?.root;
        Ok(self.get(root)?.num_splits)
    }

    /// Sum of every stake in the tree rooted at `id`, including split parents.
    pub fn total_stake(&self, id: BoxId) -> Result<f64, BetBoxError> {
        let bet_box = self.get(id)?;
        let mut total = bet_box.stake.balance() + bet_box.insurance.balance();
        if let Some((left, right)) = bet_box.split_boxes {
            total += self.total_stake(left)? + self.total_stake(right)?;
        }
        Ok(total)
    }

    /// Sum of every stake and insurance wager on the table.
    pub fn total_in_play(&self) -> f64 {
        self.boxes
            .iter()
            .map(|b| b.stake.balance() + b.insurance.balance())
            .sum()
    }

    /// Binds `player` to the box and moves `amount` from `from` into its stake.
    pub fn bet(
        &mut self,
        id: BoxId,
        player: usize,
        from: &mut Bank,
        amount: f64,
    ) -> Result<(), BlackjackGameError> {
        let bet_box = self.get_mut(id)?;
        from.transfer_to(&mut bet_box.stake, amount)?;
        bet_box.player = Some(player);
        bet_box.status = BoxStatus::InPlay;
        log::debug!("player {player} bet {amount:.2} on box {id}");
        Ok(())
    }

    /// Whether the leaf `id` may be split under a limit of `max_splits` splits per root.
    pub fn can_split(&self, id: BoxId, max_splits: usize) -> Result<(), BetBoxError> {
        let bet_box = self.get(id)?;
        if bet_box.is_split() {
            return Err(BetBoxError::NotALeaf(id));
        }
        if !bet_box.hand.is_pair() {
            return Err(BetBoxError::SplitNotAllowed(format!(
                "hand {} is not a pair",
                bet_box.hand
            )));
        }
        if self.num_splits(id)? >= max_splits {
            return Err(BetBoxError::SplitNotAllowed(format!(
                "already split {max_splits} times"
            )));
        }
        Ok(())
    }

    /// Splits the pair held by `id` into two children. The left child takes the first card and a
    /// fresh stake from `player_bank`, the right child takes the second card and the parent's
    /// stake. Each child is expected to be dealt its second card when its turn starts.
    pub fn split(
        &mut self,
        id: BoxId,
        player_bank: &mut Bank,
        max_splits: usize,
    ) -> Result<(BoxId, BoxId), BlackjackGameError> {
        self.can_split(id, max_splits)?;
        let stake = self.get(id)?.stake.balance();
        if !player_bank.can_afford(stake) {
            return Err(BankError::InsufficientFunds {
                requested: stake,
                available: player_bank.balance(),
            }
            .into());
        }

        let left_id = BoxId(self.boxes.len());
        let right_id = BoxId(self.boxes.len() + 1);
        let (position, player, root) = {
            let parent = self.get(id)?;
            (parent.position, parent.player, parent.root)
        };
        let mut left = BetBox::new(left_id, position, root);
        let mut right = BetBox::new(right_id, position, root);

        let parent = self.get_mut(id)?;
        let mut cards: Vec<Card> = parent.hand.take_cards();
        let second = cards.pop();
        let first = cards.pop();
        let (first, second) = match (first, second) {
            (Some(f), Some(s)) => (f, s),
            _ => return Err(BetBoxError::SplitNotAllowed("hand is not a pair".into()).into()),
        };
        let split_aces = first.is_ace();
        parent.stake.drain_to(&mut right.stake)?;
        parent.split_boxes = Some((left_id, right_id));
        parent.status = BoxStatus::Split;
        player_bank.transfer_to(&mut left.stake, stake)?;

        for (child, card) in [(&mut left, first), (&mut right, second)] {
            child.player = player;
            child.parent_split_box = Some(id);
            child.status = BoxStatus::InPlay;
            child.from_split_aces = split_aces;
            child.hand.receive_card(card);
        }
        self.boxes.push(left);
        self.boxes.push(right);
        self.get_mut(root)?.num_splits += 1;
        log::debug!("box {id} split into {left_id} and {right_id}");
        Ok((left_id, right_id))
    }

    /// Returns the cards of the tree rooted at `id` to the discard pile and clears it so it can
    /// take a wager next round. Every stake in the tree must already be settled.
    pub fn discard(&mut self, id: BoxId, shoe: &mut Shoe) -> Result<(), BetBoxError> {
        let (children, stake, insurance) = {
            let bet_box = self.get(id)?;
            (
                bet_box.split_boxes,
                bet_box.stake.balance(),
                bet_box.insurance.balance(),
            )
        };
        if stake > 0.0 || insurance > 0.0 {
            log::error!("discarding box {id} with {stake:.2} staked and {insurance:.2} insured");
            return Err(BetBoxError::UnsettledStake(id));
        }
        if let Some((left, right)) = children {
            self.discard(left, shoe)?;
            self.discard(right, shoe)?;
        }
        let bet_box = self.get_mut(id)?;
        shoe.discard(bet_box.hand.take_cards());
        bet_box.player = None;
        bet_box.status = BoxStatus::Empty;
        bet_box.doubled = false;
        bet_box.split_boxes = None;
        bet_box.num_splits = 0;
        bet_box.from_split_aces = false;
        Ok(())
    }

    /// Discards every root and drops all split children.
    pub fn reset(&mut self, shoe: &mut Shoe) -> Result<(), BetBoxError> {
        for position in 0..self.num_positions {
            self.discard(BoxId(position), shoe)?;
        }
        self.boxes.truncate(self.num_positions);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Orientation, Rank, Suit};
    use crate::config::MarkerConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn card(rank: Rank) -> Card {
        let mut c = Card::new(rank, Suit::Clubs);
        c.orientation = Orientation::FaceUp;
        c
    }

    fn shoe() -> Shoe {
        let mut s = Shoe::new(2, 3, MarkerConfig::default(), StdRng::seed_from_u64(11));
        s.shuffle();
        s.place_marker_card(None).unwrap();
        s
    }

    fn boxes_with_pair(rank: Rank, bank: &mut Bank) -> BetBoxes {
        let mut boxes = BetBoxes::new(3);
        boxes.bet(BoxId(0), 0, bank, 10.0).unwrap();
        let hand = boxes.hand_mut(BoxId(0)).unwrap();
        hand.receive_card(card(rank));
        hand.receive_card(card(rank));
        boxes
    }

    #[test]
    fn bet_funds_the_stake() {
        let mut bank = Bank::new("player", 100.0);
        let mut boxes = BetBoxes::new(2);
        boxes.bet(BoxId(1), 7, &mut bank, 25.0).unwrap();
        let b = boxes.get(BoxId(1)).unwrap();
        assert_eq!(b.player(), Some(7));
        assert_eq!(b.stake(), 25.0);
        assert_eq!(bank.balance(), 75.0);
        assert!(boxes.bet(BoxId(0), 7, &mut bank, 1000.0).is_err());
        assert_eq!(boxes.active_leaves(), vec![BoxId(1)]);
    }

    #[test]
    fn split_moves_cards_and_stakes() {
        let mut bank = Bank::new("player", 100.0);
        let mut boxes = boxes_with_pair(Rank::Eight, &mut bank);
        let (left, right) = boxes.split(BoxId(0), &mut bank, 3).unwrap();

        let parent = boxes.get(BoxId(0)).unwrap();
        assert!(parent.is_split());
        assert!(parent.hand().is_empty());
        assert_eq!(parent.stake(), 0.0);

        for id in [left, right] {
            let child = boxes.get(id).unwrap();
            assert_eq!(child.stake(), 10.0);
            assert_eq!(child.hand().len(), 1);
            assert_eq!(child.hand().cards()[0].rank, Rank::Eight);
            assert_eq!(child.parent_split_box(), Some(BoxId(0)));
            assert_eq!(child.player(), Some(0));
        }
        assert_eq!(bank.balance(), 80.0);
        assert_eq!(boxes.total_stake(BoxId(0)).unwrap(), 20.0);
        assert_eq!(boxes.num_splits(left).unwrap(), 1);
    }

    #[test]
    fn resplit_grows_tree_depth_first() {
        let mut bank = Bank::new("player", 100.0);
        let mut boxes = boxes_with_pair(Rank::Eight, &mut bank);
        let (left, right) = boxes.split(BoxId(0), &mut bank, 3).unwrap();
        boxes.hand_mut(left).unwrap().receive_card(card(Rank::Eight));
        let (ll, lr) = boxes.split(left, &mut bank, 3).unwrap();
        boxes.hand_mut(right).unwrap().receive_card(card(Rank::Eight));
        let (rl, rr) = boxes.split(right, &mut bank, 3).unwrap();

        assert_eq!(boxes.num_splits(BoxId(0)).unwrap(), 3);
        let leaves: Vec<BoxId> = boxes.iter(BoxId(0)).map(|b| b.id()).collect();
        assert_eq!(leaves, vec![ll, lr, rl, rr]);
        assert_eq!(leaves.len(), boxes.num_splits(BoxId(0)).unwrap() + 1);
        assert_eq!(boxes.total_stake(BoxId(0)).unwrap(), 40.0);
        assert_eq!(bank.balance(), 60.0);

        // the limit of three splits is reached
        boxes.hand_mut(ll).unwrap().receive_card(card(Rank::Eight));
        assert!(matches!(
            boxes.can_split(ll, 3),
            Err(BetBoxError::SplitNotAllowed(_))
        ));
        assert!(matches!(
            boxes.hand_mut(left),
            Err(BetBoxError::NotALeaf(_))
        ));
    }

    #[test]
    fn unsplit_box_iterates_itself() {
        let boxes = BetBoxes::new(2);
        let leaves: Vec<BoxId> = boxes.iter(BoxId(1)).map(|b| b.id()).collect();
        assert_eq!(leaves, vec![BoxId(1)]);
    }

    #[test]
    fn split_requires_pair_and_funds() {
        let mut bank = Bank::new("player", 100.0);
        let mut boxes = BetBoxes::new(1);
        boxes.bet(BoxId(0), 0, &mut bank, 10.0).unwrap();
        let hand = boxes.hand_mut(BoxId(0)).unwrap();
        hand.receive_card(card(Rank::Ten));
        hand.receive_card(card(Rank::Jack));
        assert!(boxes.split(BoxId(0), &mut bank, 3).is_err());

        let mut poor = Bank::new("player", 15.0);
        let mut boxes = boxes_with_pair(Rank::Nine, &mut poor);
        assert!(boxes.split(BoxId(0), &mut poor, 3).is_err());
        assert_eq!(boxes.get(BoxId(0)).unwrap().hand().len(), 2);
        assert_eq!(poor.balance(), 5.0);
    }

    #[test]
    fn split_aces_are_flagged() {
        let mut bank = Bank::new("player", 100.0);
        let mut boxes = boxes_with_pair(Rank::Ace, &mut bank);
        let (left, right) = boxes.split(BoxId(0), &mut bank, 3).unwrap();
        assert!(boxes.get(left).unwrap().from_split_aces());
        assert!(boxes.get(right).unwrap().from_split_aces());
    }

    #[test]
    fn discard_requires_settled_stakes() {
        let mut shoe = shoe();
        let mut bank = Bank::new("player", 100.0);
        let mut boxes = boxes_with_pair(Rank::Eight, &mut bank);
        let (left, _) = boxes.split(BoxId(0), &mut bank, 3).unwrap();
        assert_eq!(
            boxes.reset(&mut shoe),
            Err(BetBoxError::UnsettledStake(left))
        );
    }

    #[test]
    fn reset_returns_cards_and_clears_tree() {
        let mut shoe = shoe();
        let mut bank = Bank::new("player", 100.0);
        let mut house = Bank::new("house", 1000.0);
        let mut boxes = BetBoxes::new(2);
        boxes.bet(BoxId(0), 0, &mut bank, 10.0).unwrap();
        shoe.deal_one(boxes.hand_mut(BoxId(0)).unwrap(), Orientation::FaceUp)
            .unwrap();
        shoe.deal_one(boxes.hand_mut(BoxId(0)).unwrap(), Orientation::FaceUp)
            .unwrap();
        let in_shoe = shoe.remaining();
        boxes
            .get_mut(BoxId(0))
            .unwrap()
            .stake
            .drain_to(&mut house)
            .unwrap();
        boxes.reset(&mut shoe).unwrap();
        assert_eq!(shoe.discarded(), 2);
        assert_eq!(shoe.remaining() + shoe.discarded(), in_shoe + 2);
        let root = boxes.get(BoxId(0)).unwrap();
        assert_eq!(root.status(), BoxStatus::Empty);
        assert!(root.hand().is_empty());
        assert_eq!(root.player(), None);
        assert!(boxes.active_leaves().is_empty());
    }
}
