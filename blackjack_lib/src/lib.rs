//! Blackjack round-simulation engine: cards and the shoe, hand scoring, wager positions that split
//! into trees, and the state machine that plays a round while asking a `DecisionPolicy` for every
//! decision.

pub mod announcer;
pub mod bank;
pub mod bet_box;
pub mod card;
pub mod config;
pub mod error;
pub mod game;
pub mod hand;
pub mod player;
pub mod policy;
pub mod shoe;
pub mod stats;
pub mod table;

pub use announcer::{Announcer, LogAnnouncer, NullAnnouncer, TableEvent};
pub use bank::Bank;
pub use bet_box::{BetBox, BetBoxes, BoxId, BoxStatus};
pub use card::{Card, Orientation, Rank, Suit};
pub use config::{MarkerConfig, TableConfig};
pub use error::{BankError, BetBoxError, BlackjackGameError, ConfigError, ShoeError};
pub use game::{GamePlay, Phase};
pub use hand::{Hand, BLACKJACK};
pub use player::Player;
pub use policy::{
    Action, DecisionPolicy, InsuranceChoice, Outcome, PlayerView, PositionView, ScriptedPolicy,
    Stay, Step,
};
pub use shoe::Shoe;
pub use stats::{RoundEvent, Statistics};
pub use table::Table;
