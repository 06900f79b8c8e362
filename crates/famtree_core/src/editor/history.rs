//! Bounded undo history of full-tree snapshots.
//!
//! # Invariants
//! - Snapshots are owned values, never references into the live store.
//! - At most `depth` snapshots are kept; the oldest is evicted first.
//! - The newest snapshot always equals the committed store state.

use crate::model::tree::FamilyTree;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct HistoryLog {
    snapshots: VecDeque<FamilyTree>,
    depth: usize,
}

impl HistoryLog {
    pub fn new(depth: usize) -> Self {
        Self {
            snapshots: VecDeque::new(),
            depth: depth.max(1),
        }
    }

    /// Records the state produced by a committed command.
    pub fn record(&mut self, snapshot: FamilyTree) {
        self.snapshots.push_back(snapshot);
        while self.snapshots.len() > self.depth {
            self.snapshots.pop_front();
        }
    }

    /// Drops the newest snapshot and returns the one before it.
    ///
    /// Returns `None` (and keeps the log unchanged) when fewer than two
    /// snapshots exist.
    pub fn undo(&mut self) -> Option<&FamilyTree> {
        if self.snapshots.len() < 2 {
            return None;
        }
        self.snapshots.pop_back();
        self.snapshots.back()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.snapshots.len() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::HistoryLog;
    use crate::model::person::{Gender, Person, PersonId};
    use crate::model::tree::FamilyTree;

    fn tree(id: &str) -> FamilyTree {
        FamilyTree::with_root(Person::with_id(PersonId::new(id), id, Gender::Male))
    }

    #[test]
    fn record_evicts_oldest_past_depth() {
        let mut log = HistoryLog::new(3);
        for id in ["a", "b", "c", "d"] {
            log.record(tree(id));
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.undo().unwrap(), &tree("c"));
        assert_eq!(log.undo().unwrap(), &tree("b"));
        assert!(log.undo().is_none());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn single_snapshot_cannot_be_undone() {
        let mut log = HistoryLog::new(20);
        log.record(tree("a"));
        assert!(!log.can_undo());
        assert!(log.undo().is_none());
        assert_eq!(log.len(), 1);
    }
}
