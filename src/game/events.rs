//! Game Events
//!
//! Notifications emitted by successful transitions, in call order.
//! The host drains them to update observers.

use serde::{Serialize, Deserialize};

use crate::core::hash::Hash256;
use crate::game::state::{GameId, PlayerId};

/// Why a game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinReason {
    /// All ten opponent ship cells were hit.
    AllShipsSunk,
    /// Winner's end-game multiproof showed an illegal opponent board.
    IllegalBoard,
    /// Opponent failed to respond to a report in time.
    Timeout,
    /// Opponent conceded.
    Forfeit,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Game instance created.
    GameCreated {
        creator: PlayerId,
        agreed_bet: u64,
    },

    /// Opponent bound to the game.
    PlayerJoined {
        opponent: PlayerId,
    },

    /// Stake deposited.
    BetDeposited {
        player: PlayerId,
        amount: u64,
    },

    /// Board root published.
    BoardCommitted {
        player: PlayerId,
        root: Hash256,
    },

    /// Both roots published; shooting begins.
    ShootingStarted {
        first: PlayerId,
    },

    /// Shot fired.
    ShotFired {
        shooter: PlayerId,
        index: u8,
    },

    /// Target owner proved the cell content.
    ShotConfirmed {
        shooter: PlayerId,
        index: u8,
        hit: bool,
    },

    /// Player reported an unresponsive opponent.
    Reported {
        reporter: PlayerId,
    },

    /// Reported player moved in time.
    ReportCleared {
        reporter: PlayerId,
    },

    /// Winner's board proven consistent with its commitment.
    BoardChecked {
        player: PlayerId,
        ships_proven: u8,
    },

    /// Game decided.
    GameWon {
        winner: PlayerId,
        reason: WinReason,
    },

    /// Escrow released.
    Withdrawn {
        winner: PlayerId,
        amount: u64,
    },
}

/// A game event tagged with its game and sequence number.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Game the event belongs to.
    pub game_id: GameId,
    /// Sequence number of the call that produced it.
    pub block: u64,
    /// Event data.
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(game_id: GameId, block: u64, data: GameEventData) -> Self {
        Self { game_id, block, data }
    }

    /// Winner announced by this event, if any.
    pub fn winner(&self) -> Option<PlayerId> {
        match &self.data {
            GameEventData::GameWon { winner, .. } => Some(*winner),
            _ => None,
        }
    }
}
