//! Player-Side Board
//!
//! A board is 64 salted cells. The owner keeps it secret, publishes only
//! the Merkle root, and later produces per-cell reveals and the end-game
//! multiproof from it.

use std::collections::BTreeSet;
use rand::Rng;
use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};

use crate::core::hash::Hash256;
use crate::proof::merkle::MerkleTree;
use crate::{BOARD_CELLS, SHIP_CELLS};

/// Domain separator for board cell leaves.
const LEAF_DOMAIN: &[u8] = b"BATTLESHIP_LEAF_V1";

/// 256-bit secret salt attached to every cell.
pub type Salt = [u8; 32];

/// Leaf hash of one board cell.
///
/// Without the salt a leaf cannot be matched to a cell value, even though
/// `index` and `is_ship` have tiny domains.
pub fn leaf_hash(index: u8, is_ship: bool, salt: &Salt) -> Hash256 {
    let mut hasher = Sha256::new();
    hasher.update(LEAF_DOMAIN);
    hasher.update([index, is_ship as u8]);
    hasher.update(salt);
    hasher.finalize().into()
}

/// One cell of a board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Cell index (0..63).
    pub index: u8,
    /// Does a ship occupy this cell?
    pub is_ship: bool,
    /// Committed secret.
    pub salt: Salt,
}

impl Cell {
    /// Leaf hash of this cell.
    pub fn leaf(&self) -> Hash256 {
        leaf_hash(self.index, self.is_ship, &self.salt)
    }
}

/// Everything needed to prove a single cell against a root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellReveal {
    /// Cell index.
    pub index: u8,
    /// Revealed content.
    pub is_ship: bool,
    /// Revealed salt.
    pub salt: Salt,
    /// Sibling path to the root.
    pub proof: Vec<Hash256>,
}

/// End-game multiproof over a set of cells.
///
/// `indexes`, `cells` and `salts` are parallel and ordered for the verifier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardProof {
    /// Cell indexes in proof order.
    pub indexes: Vec<u8>,
    /// Ship flags, parallel to `indexes`.
    pub cells: Vec<bool>,
    /// Salts, parallel to `indexes`.
    pub salts: Vec<Salt>,
    /// Combined sibling hashes.
    pub proof: Vec<Hash256>,
    /// Operand flags.
    pub proof_flags: Vec<bool>,
}

/// Board construction errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// Wrong number of ship cells.
    #[error("board must hold exactly {expected} ship cells, got {got}")]
    WrongShipCount {
        /// Required ship cells.
        expected: usize,
        /// Distinct ship cells supplied.
        got: usize,
    },

    /// Ship index outside the board.
    #[error("cell index {0} is outside the board")]
    IndexOutOfRange(u8),

    /// No cells at all.
    #[error("board has no cells")]
    Empty,

    /// Wrong number of salts.
    #[error("expected {expected} salts, got {got}")]
    WrongSaltCount {
        /// Required salts.
        expected: usize,
        /// Salts supplied.
        got: usize,
    },
}

/// A full secret board with its Merkle tree.
#[derive(Clone, Debug)]
pub struct Board {
    cells: Vec<Cell>,
    tree: MerkleTree,
}

impl Board {
    /// Build a board from ship positions and one salt per cell.
    pub fn new(ships: &[u8], salts: &[Salt]) -> Result<Self, BoardError> {
        if salts.len() != BOARD_CELLS {
            return Err(BoardError::WrongSaltCount {
                expected: BOARD_CELLS,
                got: salts.len(),
            });
        }

        let mut ship_set = BTreeSet::new();
        for &index in ships {
            if index as usize >= BOARD_CELLS {
                return Err(BoardError::IndexOutOfRange(index));
            }
            ship_set.insert(index);
        }
        if ship_set.len() != SHIP_CELLS {
            return Err(BoardError::WrongShipCount {
                expected: SHIP_CELLS,
                got: ship_set.len(),
            });
        }

        let cells: Vec<Cell> = salts
            .iter()
            .enumerate()
            .map(|(i, salt)| Cell {
                index: i as u8,
                is_ship: ship_set.contains(&(i as u8)),
                salt: *salt,
            })
            .collect();

        Self::from_cells(cells)
    }

    /// Build a board with fresh random salts.
    pub fn random<R: Rng + ?Sized>(ships: &[u8], rng: &mut R) -> Result<Self, BoardError> {
        let salts: Vec<Salt> = (0..BOARD_CELLS).map(|_| rng.gen()).collect();
        Self::new(ships, &salts)
    }

    /// Build a board from arbitrary cells without layout validation.
    ///
    /// Lets a dishonest player commit an illegal board; the protocol must
    /// still catch it at end-game check.
    pub fn from_cells_unchecked(cells: Vec<Cell>) -> Result<Self, BoardError> {
        Self::from_cells(cells)
    }

    fn from_cells(cells: Vec<Cell>) -> Result<Self, BoardError> {
        let leaves: Vec<Hash256> = cells.iter().map(Cell::leaf).collect();
        let tree = MerkleTree::from_leaf_hashes(&leaves).ok_or(BoardError::Empty)?;
        Ok(Self { cells, tree })
    }

    /// Root to publish as the commitment.
    pub fn root(&self) -> Hash256 {
        self.tree.root()
    }

    /// Cell at `index`.
    pub fn cell(&self, index: u8) -> Option<&Cell> {
        self.cells.get(index as usize)
    }

    /// Indices of all ship cells.
    pub fn ship_indices(&self) -> Vec<u8> {
        self.cells.iter().filter(|c| c.is_ship).map(|c| c.index).collect()
    }

    /// Reveal one cell with its inclusion proof.
    pub fn reveal(&self, index: u8) -> Option<CellReveal> {
        let cell = self.cell(index)?;
        let proof = self.tree.proof(index as usize)?;
        Some(CellReveal {
            index: cell.index,
            is_ship: cell.is_ship,
            salt: cell.salt,
            proof,
        })
    }

    /// Multiproof over every cell not in `shot`.
    pub fn unshot_proof(&self, shot: &BTreeSet<u8>) -> BoardProof {
        let remaining: Vec<usize> = (0..self.cells.len())
            .filter(|i| !shot.contains(&(*i as u8)))
            .collect();
        self.proof_for(&remaining)
    }

    fn proof_for(&self, indices: &[usize]) -> BoardProof {
        let Some(mp) = self.tree.multi_proof(indices) else {
            return BoardProof::default();
        };

        let mut out = BoardProof {
            proof: mp.proof,
            proof_flags: mp.proof_flags,
            ..Default::default()
        };
        for i in mp.leaf_indices {
            let cell = &self.cells[i];
            out.indexes.push(cell.index);
            out.cells.push(cell.is_ship);
            out.salts.push(cell.salt);
        }
        out
    }
}
