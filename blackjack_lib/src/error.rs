use crate::bet_box::BoxId;
use crate::policy::Step;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BankError {
    #[error("insufficient funds: requested {requested:.2}, available {available:.2}")]
    InsufficientFunds { requested: f64, available: f64 },

    #[error("invalid amount {0:.2}, amounts must be finite and non-negative")]
    InvalidAmount(f64),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ShoeError {
    #[error("marker offset {offset} outside of valid window {min}..={max}")]
    InvalidMarkerPlacement { offset: usize, min: usize, max: usize },

    #[error("cannot deal before the marker card has been placed")]
    MarkerNotPlaced,

    #[error("shoe and discard pile are both empty")]
    Exhausted,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BetBoxError {
    #[error("split not allowed: {0}")]
    SplitNotAllowed(String),

    #[error("bet box {0} still holds an unsettled stake")]
    UnsettledStake(BoxId),

    #[error("bet box {0} has been split, play must continue on its leaves")]
    NotALeaf(BoxId),

    #[error("bet box {0} does not exist")]
    UnknownBox(BoxId),

    #[error("bet box {0} holds a wager but no player")]
    Unowned(BoxId),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid table configuration: {0}")]
    Invalid(String),

    #[error("unable to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unable to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that abort a round. Rejected decisions never end up here, they are reported back to
/// the decision policy and asked again.
#[derive(Debug, Error)]
pub enum BlackjackGameError {
    #[error(transparent)]
    Bank(#[from] BankError),

    #[error(transparent)]
    Shoe(#[from] ShoeError),

    #[error(transparent)]
    BetBox(#[from] BetBoxError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("decision policy kept answering illegally at step {step:?}")]
    RetryLimitExceeded { step: Step },

    #[error("player {0} is not seated at the table")]
    UnknownPlayer(usize),

    #[error("seat {0} is not available")]
    SeatUnavailable(usize),
}
