//! Stake Escrow
//!
//! Holds both players' stakes until the game is decided, then releases
//! everything to the winner exactly once.

use serde::{Serialize, Deserialize};

use crate::game::error::GameError;
use crate::game::state::Seat;

/// Escrow for one game.
///
/// Held funds are always `stake × deposits`, and drop to zero on payout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escrow {
    stake: u64,
    deposited: [bool; 2],
    paid_out: bool,
}

impl Escrow {
    /// Create an empty escrow for the agreed per-player stake.
    pub fn new(stake: u64) -> Self {
        Self {
            stake,
            deposited: [false; 2],
            paid_out: false,
        }
    }

    /// Agreed per-player stake.
    pub fn stake(&self) -> u64 {
        self.stake
    }

    /// Whether `seat` has deposited.
    pub fn has_deposited(&self, seat: Seat) -> bool {
        self.deposited[seat.index()]
    }

    /// Whether both players have deposited.
    pub fn both_deposited(&self) -> bool {
        self.deposited.iter().all(|d| *d)
    }

    /// Whether the escrow has been released.
    pub fn is_paid_out(&self) -> bool {
        self.paid_out
    }

    /// Funds currently held.
    pub fn held(&self) -> u64 {
        if self.paid_out {
            return 0;
        }
        let deposits = self.deposited.iter().filter(|d| **d).count() as u64;
        self.stake * deposits
    }

    /// Accept a deposit from `seat`.
    pub fn deposit(&mut self, seat: Seat, amount: u64) -> Result<(), GameError> {
        if self.deposited[seat.index()] {
            return Err(GameError::AlreadyDeposited);
        }
        if amount != self.stake {
            return Err(GameError::WrongAmount {
                expected: self.stake,
                got: amount,
            });
        }
        self.deposited[seat.index()] = true;
        Ok(())
    }

    /// Release everything held. Succeeds once.
    pub fn payout(&mut self) -> Result<u64, GameError> {
        if self.paid_out {
            return Err(GameError::AlreadyPaid);
        }
        let amount = self.held();
        self.paid_out = true;
        Ok(amount)
    }
}
