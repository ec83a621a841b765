//! Dispute Clock
//!
//! Report / verify timeout for an opponent who stops moving.
//!
//! ```text
//! Idle ──report──▶ Reported ──verify (≥ threshold)──▶ Resolved
//!                     │
//!                     └──move by reported player──▶ Idle (cleared)
//! ```

use serde::{Serialize, Deserialize};

use crate::game::error::GameError;
use crate::game::state::Seat;

/// A pending report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Player waiting on the opponent.
    pub reported_by: Seat,
    /// Sequence number of the report call.
    pub block: u64,
}

/// Report state for one game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeClock {
    threshold: u64,
    report: Option<Report>,
}

impl DisputeClock {
    /// Create an idle clock.
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold,
            report: None,
        }
    }

    /// Steps the reported player has to respond.
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Pending report, if any.
    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    /// First sequence number at which the pending report can be verified.
    pub fn ready_at(&self) -> Option<u64> {
        self.report.map(|r| r.block.saturating_add(self.threshold))
    }

    /// Open a report.
    pub fn open(&mut self, reported_by: Seat, block: u64) -> Result<(), GameError> {
        if self.report.is_some() {
            return Err(GameError::AlreadyReported);
        }
        self.report = Some(Report { reported_by, block });
        Ok(())
    }

    /// Record a move by `actor`. Clears a report aimed at them.
    ///
    /// Returns the cleared report.
    pub fn on_move(&mut self, actor: Seat) -> Option<Report> {
        match self.report {
            Some(r) if r.reported_by != actor => self.report.take(),
            _ => None,
        }
    }

    /// Check whether the pending report can be verified at `block`.
    ///
    /// Returns the reporter, who wins.
    pub fn check_verify(&self, block: u64) -> Result<Seat, GameError> {
        let report = self.report.ok_or(GameError::NoReport)?;
        let ready_at = report.block.saturating_add(self.threshold);
        if block < ready_at {
            return Err(GameError::TooEarly { ready_at });
        }
        Ok(report.reported_by)
    }

    /// Drop any pending report.
    pub fn clear(&mut self) {
        self.report = None;
    }
}
