//! Commit-Reveal Proof System
//!
//! Keeps both players honest about board contents through:
//! - Salted cell leaves hashed into a 64-leaf Merkle tree
//! - Per-shot inclusion proofs
//! - One end-game multiproof over every untouched cell
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PROOF SYSTEM                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  merkle.rs       - Tree, proofs, multiproofs (pure)         │
//! │  board.rs        - Player-side secret board                 │
//! │  commitment.rs   - Published root + revealed cells          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod merkle;
pub mod board;
pub mod commitment;

// Re-export key types
pub use merkle::{MerkleTree, MultiProof, verify_proof, verify_multi_proof};
pub use board::{Board, BoardError, BoardProof, Cell, CellReveal, Salt, leaf_hash};
pub use commitment::{BoardCommitment, CommitmentError, FinalCheck};
