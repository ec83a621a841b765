//! Board Commitment Protocol
//!
//! Each player publishes one Merkle root before the first shot.
//! Cells are then proven against that root one at a time as they are
//! shot, and the untouched remainder is proven in a single multiproof
//! once the game is decided.

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};

use crate::core::hash::Hash256;
use crate::proof::board::{leaf_hash, Salt};
use crate::proof::merkle::{verify_proof, verify_multi_proof};
use crate::BOARD_CELLS;

/// A player's published board root plus what has been proven against it.
///
/// `root` never changes after construction. `revealed` only grows, and any
/// failed verification leaves the commitment untouched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardCommitment {
    root: Hash256,
    revealed: BTreeSet<u8>,
    ships_revealed: u8,
}

/// Result of a successful end-game multiproof.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FinalCheck {
    /// Cells covered by the multiproof.
    pub cells_proven: usize,
    /// Ship cells among them.
    pub ships_proven: usize,
}

impl BoardCommitment {
    /// Commit to a root.
    pub fn new(root: Hash256) -> Self {
        Self {
            root,
            revealed: BTreeSet::new(),
            ships_revealed: 0,
        }
    }

    /// Committed root.
    pub fn root(&self) -> &Hash256 {
        &self.root
    }

    /// Cells already proven.
    pub fn revealed(&self) -> &BTreeSet<u8> {
        &self.revealed
    }

    /// Whether `index` has been proven.
    pub fn is_revealed(&self, index: u8) -> bool {
        self.revealed.contains(&index)
    }

    /// Ship cells proven so far (hits taken by this board).
    pub fn ships_revealed(&self) -> u8 {
        self.ships_revealed
    }

    /// Check a reveal without recording it.
    pub fn check_reveal(
        &self,
        index: u8,
        is_ship: bool,
        salt: &Salt,
        proof: &[Hash256],
    ) -> Result<(), CommitmentError> {
        if index as usize >= BOARD_CELLS {
            return Err(CommitmentError::IndexOutOfRange(index));
        }
        if self.revealed.contains(&index) {
            return Err(CommitmentError::AlreadyRevealed(index));
        }
        if !verify_proof(&self.root, &leaf_hash(index, is_ship, salt), proof) {
            return Err(CommitmentError::InvalidProof);
        }
        Ok(())
    }

    /// Prove one cell against the root and record it.
    ///
    /// Returns whether the cell holds a ship.
    pub fn reveal(
        &mut self,
        index: u8,
        is_ship: bool,
        salt: &Salt,
        proof: &[Hash256],
    ) -> Result<bool, CommitmentError> {
        self.check_reveal(index, is_ship, salt, proof)?;

        self.revealed.insert(index);
        if is_ship {
            self.ships_revealed += 1;
        }
        Ok(is_ship)
    }

    /// Verify the end-game multiproof.
    ///
    /// `indexes` must be exactly the cells outside `shot`; `cells` and
    /// `salts` run parallel to it in proof order.
    pub fn final_check(
        &self,
        shot: &BTreeSet<u8>,
        indexes: &[u8],
        cells: &[bool],
        salts: &[Salt],
        proof: &[Hash256],
        proof_flags: &[bool],
    ) -> Result<FinalCheck, CommitmentError> {
        if indexes.len() != cells.len() || indexes.len() != salts.len() {
            return Err(CommitmentError::LengthMismatch {
                indexes: indexes.len(),
                cells: cells.len(),
                salts: salts.len(),
            });
        }

        let covered: BTreeSet<u8> = indexes.iter().copied().collect();
        let expected: BTreeSet<u8> = (0..BOARD_CELLS as u8)
            .filter(|i| !shot.contains(i))
            .collect();
        if covered.len() != indexes.len() || covered != expected {
            return Err(CommitmentError::IndexSetMismatch {
                expected: expected.len(),
                got: indexes.len(),
            });
        }

        let leaves: Vec<Hash256> = indexes
            .iter()
            .zip(cells)
            .zip(salts)
            .map(|((index, is_ship), salt)| leaf_hash(*index, *is_ship, salt))
            .collect();

        if !verify_multi_proof(&self.root, &leaves, proof, proof_flags) {
            return Err(CommitmentError::InvalidProof);
        }

        Ok(FinalCheck {
            cells_proven: indexes.len(),
            ships_proven: cells.iter().filter(|c| **c).count(),
        })
    }
}

/// Errors that can occur during commitment verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommitmentError {
    /// Merkle proof does not lead to the committed root.
    #[error("Merkle proof does not match the committed root")]
    InvalidProof,

    /// Cell already proven.
    #[error("cell {0} already revealed")]
    AlreadyRevealed(u8),

    /// Cell index outside the board.
    #[error("cell index {0} is outside the board")]
    IndexOutOfRange(u8),

    /// Parallel multiproof inputs differ in length.
    #[error("length mismatch: {indexes} indexes, {cells} cells, {salts} salts")]
    LengthMismatch {
        /// Number of indexes.
        indexes: usize,
        /// Number of cell flags.
        cells: usize,
        /// Number of salts.
        salts: usize,
    },

    /// Multiproof does not cover exactly the unshot cells.
    #[error("multiproof must cover the {expected} unshot cells, got {got} indexes")]
    IndexSetMismatch {
        /// Unshot cells.
        expected: usize,
        /// Indexes supplied.
        got: usize,
    },
}
