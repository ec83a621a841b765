//! Game Errors
//!
//! Every rejected call leaves the game exactly as it was.

use crate::game::state::GamePhase;
use crate::proof::commitment::CommitmentError;

/// Errors returned by game state transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// Call not legal in the current phase.
    #[error("call not allowed in phase {0:?}")]
    InvalidState(GamePhase),

    /// Sender lacks the required role.
    #[error("caller is not allowed to do this")]
    WrongCaller,

    /// Deposit does not equal the agreed bet.
    #[error("wrong deposit amount: expected {expected}, got {got}")]
    WrongAmount {
        /// Agreed bet.
        expected: u64,
        /// Amount sent.
        got: u64,
    },

    /// Player already deposited.
    #[error("bet already deposited")]
    AlreadyDeposited,

    /// Player already committed a board.
    #[error("board already committed")]
    AlreadyCommitted,

    /// Escrow already released.
    #[error("escrow already paid out")]
    AlreadyPaid,

    /// A report is already pending.
    #[error("a report is already pending")]
    AlreadyReported,

    /// Agreed bet exceeds the escrow limit.
    #[error("bet exceeds maximum of {max}")]
    BetTooLarge {
        /// Largest accepted bet.
        max: u64,
    },

    /// Opponent already bound.
    #[error("game already has an opponent")]
    AlreadyJoined,

    /// Creator tried to join their own game.
    #[error("cannot join your own game")]
    SelfJoin,

    /// Shot target already used by this shooter.
    #[error("cell {0} already targeted")]
    IndexReused(u8),

    /// Shot target outside the board.
    #[error("cell index {0} is outside the board")]
    IndexOutOfRange(u8),

    /// Confirmation names a cell other than the pending shot.
    #[error("confirmation is for cell {got}, pending shot is cell {expected}")]
    ShotMismatch {
        /// Pending shot index.
        expected: u8,
        /// Index supplied.
        got: u8,
    },

    /// Proof or reveal rejected.
    #[error(transparent)]
    Commitment(#[from] CommitmentError),

    /// Report window has not elapsed.
    #[error("report can be verified from sequence {ready_at}")]
    TooEarly {
        /// First sequence at which verification succeeds.
        ready_at: u64,
    },

    /// No report to verify.
    #[error("no report pending")]
    NoReport,

    /// No winner yet.
    #[error("game has no winner yet")]
    NotResolved,
}
