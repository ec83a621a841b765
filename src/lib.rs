//! # Merkle Battleship
//!
//! Wagered two-player Battleship where neither player has to trust the other
//! or a server with their board.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    MERKLE BATTLESHIP                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/             - Deterministic primitives                │
//! │  └── hash.rs       - Domain-separated SHA-256                │
//! │                                                              │
//! │  proof/            - Commit-reveal (pure)                    │
//! │  ├── merkle.rs     - Tree, proofs, multiproofs               │
//! │  ├── board.rs      - Player-side secret board                │
//! │  └── commitment.rs - Published root + revealed cells         │
//! │                                                              │
//! │  game/             - Protocol state machine (deterministic)  │
//! │  ├── state.rs      - GameInstance, snapshots                 │
//! │  ├── escrow.rs     - Stake custody                           │
//! │  ├── ledger.rs     - Shot history                            │
//! │  ├── dispute.rs    - Report / verify timeout                 │
//! │  └── events.rs     - Transition notifications                │
//! │                                                              │
//! │  registry/         - In-process host (non-deterministic)     │
//! │  └── games.rs      - Create, join, match, per-game locking   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Protocol
//!
//! Each player commits to the Merkle root of 64 salted cells. Every shot is
//! answered with an inclusion proof for the targeted cell, and the player
//! who sinks ten ship cells must finally prove the rest of their own board
//! with one multiproof. Stakes sit in escrow until a winner is final.
//!
//! ## Determinism Guarantee
//!
//! The `core/`, `proof/` and `game/` modules are **100% deterministic**:
//! - No HashMap (uses BTreeMap/BTreeSet for sorted iteration)
//! - No system time; the host supplies a monotonic sequence number per call
//! - Randomness only in player-side salt generation, from a caller's RNG
//!
//! Given the same ordered calls, every instance reaches the same
//! `state_hash()` on any platform.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod proof;
pub mod registry;

// Re-export commonly used types
pub use core::hash::Hash256;
pub use game::state::{CallContext, GameId, GameInstance, GamePhase, PlayerId};
pub use game::error::GameError;
pub use proof::board::Board;
pub use registry::{GameRegistry, RegistryConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Cells per board (8×8)
pub const BOARD_CELLS: usize = 64;

/// Ship cells every legal board holds
pub const SHIP_CELLS: usize = 10;

/// Sequence steps a reported player has to respond
pub const REPORT_THRESHOLD_BLOCKS: u64 = 5;

/// Largest agreed bet. Keeps the escrowed total `2 × bet` inside `u64`.
pub const MAX_BET: u64 = u64::MAX / 2;
