//! Game Logic Module
//!
//! The wagered two-player protocol. 100% deterministic: every transition
//! depends only on the instance state and the call's arguments.
//!
//! ## Module Structure
//!
//! - `state`: `GameInstance` state machine and snapshots
//! - `escrow`: Stake custody and single payout
//! - `ledger`: Per-player shot history
//! - `dispute`: Report / verify timeout
//! - `events`: Notifications emitted by transitions
//! - `config`: Tunables
//! - `error`: Transition errors

pub mod config;
pub mod dispute;
pub mod error;
pub mod escrow;
pub mod events;
pub mod ledger;
pub mod state;

// Re-export key types
pub use config::GameConfig;
pub use dispute::{DisputeClock, Report};
pub use error::GameError;
pub use escrow::Escrow;
pub use events::{GameEvent, GameEventData, WinReason};
pub use ledger::{Shot, ShotLedger, ShotOutcome};
pub use state::{
    CallContext, GameId, GameInstance, GamePhase, GameSnapshot, Payout, PlayerId, Seat,
};
