//! Shot Ledger
//!
//! Ordered log of the shots one player has fired and how each resolved.

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};

use crate::game::error::GameError;
use crate::BOARD_CELLS;

/// Resolution of a shot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotOutcome {
    /// Fired, not yet confirmed by the target's owner.
    Pending,
    /// Confirmed ship cell.
    Hit,
    /// Confirmed empty cell.
    Miss,
}

/// One fired shot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shot {
    /// Target cell.
    pub index: u8,
    /// Resolution.
    pub outcome: ShotOutcome,
}

impl Shot {
    /// Whether the shot has been confirmed.
    pub fn is_resolved(&self) -> bool {
        self.outcome != ShotOutcome::Pending
    }
}

/// Shots fired by one player.
///
/// No index appears twice, and at most the newest shot is pending.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotLedger {
    shots: Vec<Shot>,
}

impl ShotLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// All shots in firing order.
    pub fn shots(&self) -> &[Shot] {
        &self.shots
    }

    /// Number of shots fired.
    pub fn len(&self) -> usize {
        self.shots.len()
    }

    /// Whether no shot has been fired.
    pub fn is_empty(&self) -> bool {
        self.shots.is_empty()
    }

    /// Whether `index` was already targeted.
    pub fn contains(&self, index: u8) -> bool {
        self.shots.iter().any(|s| s.index == index)
    }

    /// Set of targeted indices.
    pub fn indices(&self) -> BTreeSet<u8> {
        self.shots.iter().map(|s| s.index).collect()
    }

    /// Confirmed hits.
    pub fn hits(&self) -> usize {
        self.shots.iter().filter(|s| s.outcome == ShotOutcome::Hit).count()
    }

    /// Index of the pending shot, if any.
    pub fn pending(&self) -> Option<u8> {
        self.shots
            .last()
            .filter(|s| !s.is_resolved())
            .map(|s| s.index)
    }

    /// Check that `index` could be fired next.
    pub fn check_target(&self, index: u8) -> Result<(), GameError> {
        if index as usize >= BOARD_CELLS {
            return Err(GameError::IndexOutOfRange(index));
        }
        if self.contains(index) {
            return Err(GameError::IndexReused(index));
        }
        Ok(())
    }

    /// Append a pending shot.
    pub fn record(&mut self, index: u8) -> Result<(), GameError> {
        self.check_target(index)?;
        self.shots.push(Shot {
            index,
            outcome: ShotOutcome::Pending,
        });
        Ok(())
    }

    /// Resolve the pending shot. Returns its index, or None if nothing is pending.
    pub fn resolve(&mut self, hit: bool) -> Option<u8> {
        let shot = self.shots.last_mut().filter(|s| !s.is_resolved())?;
        shot.outcome = if hit { ShotOutcome::Hit } else { ShotOutcome::Miss };
        Some(shot.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_resolve() {
        let mut ledger = ShotLedger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.pending(), None);

        ledger.record(5).unwrap();
        assert_eq!(ledger.pending(), Some(5));

        assert_eq!(ledger.resolve(true), Some(5));
        assert_eq!(ledger.pending(), None);
        assert_eq!(ledger.hits(), 1);

        ledger.record(6).unwrap();
        assert_eq!(ledger.resolve(false), Some(6));
        assert_eq!(ledger.hits(), 1);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.shots()[1].outcome, ShotOutcome::Miss);
    }

    #[test]
    fn test_no_repeat() {
        let mut ledger = ShotLedger::new();
        ledger.record(10).unwrap();
        ledger.resolve(false);
        assert_eq!(ledger.record(10), Err(GameError::IndexReused(10)));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_out_of_range() {
        let mut ledger = ShotLedger::new();
        assert_eq!(ledger.record(64), Err(GameError::IndexOutOfRange(64)));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_resolve_without_pending() {
        let mut ledger = ShotLedger::new();
        assert_eq!(ledger.resolve(true), None);
        ledger.record(1).unwrap();
        ledger.resolve(true);
        assert_eq!(ledger.resolve(false), None);
        assert_eq!(ledger.shots()[0].outcome, ShotOutcome::Hit);
    }

    #[test]
    fn test_indices() {
        let mut ledger = ShotLedger::new();
        for i in [9u8, 3, 40] {
            ledger.record(i).unwrap();
            ledger.resolve(false);
        }
        assert_eq!(ledger.indices().into_iter().collect::<Vec<_>>(), vec![3, 9, 40]);
    }
}
