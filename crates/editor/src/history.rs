//! Undo/redo history of full editor snapshots.
//!
//! Entries form a linear list with a cursor (`current_index`). Pushing while
//! the cursor is not at the tail discards the redo branch first. The list is
//! capped; the oldest entry falls off when the cap is exceeded.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reframe_project_model::project::{read_json, write_json, EditorSnapshot, ProjectError};

/// Entries kept when no capacity is configured.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// One recorded editor state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub snapshot: EditorSnapshot,
    pub timestamp: DateTime<Utc>,
}

/// Linear undo history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    entries: Vec<HistoryEntry>,
    current_index: usize,
    #[serde(skip, default = "default_capacity")]
    capacity: usize,
}

fn default_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl History {
    /// Empty history holding at most `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            current_index: 0,
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Index of the current entry, `None` when empty.
    pub fn current_index(&self) -> Option<usize> {
        (!self.entries.is_empty()).then_some(self.current_index)
    }

    pub fn current(&self) -> Option<&EditorSnapshot> {
        self.entries.get(self.current_index).map(|e| &e.snapshot)
    }

    /// Whether `snapshot` equals the current entry.
    pub fn is_current(&self, snapshot: &EditorSnapshot) -> bool {
        self.current() == Some(snapshot)
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.current_index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current_index + 1 < self.entries.len()
    }

    /// Record `snapshot` as the new current state. Returns its index.
    pub fn push_snapshot(&mut self, snapshot: EditorSnapshot) -> usize {
        self.push_entry(HistoryEntry {
            snapshot,
            timestamp: Utc::now(),
        })
    }

    fn push_entry(&mut self, entry: HistoryEntry) -> usize {
        if !self.entries.is_empty() {
            self.entries.truncate(self.current_index + 1);
        }
        self.entries.push(entry);

        let overflow = self.entries.len().saturating_sub(self.capacity);
        if overflow > 0 {
            self.entries.drain(..overflow);
        }
        self.current_index = self.entries.len() - 1;
        self.current_index
    }

    /// Step back one entry and return it. `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<&EditorSnapshot> {
        if !self.can_undo() {
            return None;
        }
        self.current_index -= 1;
        self.current()
    }

    /// Step forward one entry and return it. `None` at the newest entry.
    pub fn redo(&mut self) -> Option<&EditorSnapshot> {
        if !self.can_redo() {
            return None;
        }
        self.current_index += 1;
        self.current()
    }

    /// Make `index` current. Out-of-range indices are ignored.
    pub fn jump_to(&mut self, index: usize) -> Option<&EditorSnapshot> {
        if index >= self.entries.len() {
            return None;
        }
        self.current_index = index;
        self.current()
    }

    /// Write the history to `path` as JSON.
    pub fn save(&self, path: &Path) -> Result<(), ProjectError> {
        write_json(path, self)
    }

    /// Read a history file, applying `capacity` and repairing the cursor.
    pub fn load(path: &Path, capacity: usize) -> Result<Self, ProjectError> {
        let mut history: History = read_json(path)?;
        history.capacity = capacity.max(1);

        let overflow = history.entries.len().saturating_sub(history.capacity);
        if overflow > 0 {
            history.entries.drain(..overflow);
            history.current_index = history.current_index.saturating_sub(overflow);
        }
        if history.current_index >= history.entries.len() {
            history.current_index = history.entries.len().saturating_sub(1);
        }
        Ok(history)
    }

    /// Like [`History::load`], but a missing file yields an empty history.
    pub fn load_or_default(path: &Path, capacity: usize) -> Result<Self, ProjectError> {
        if path.exists() {
            Self::load(path, capacity)
        } else {
            Ok(Self::new(capacity))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use reframe_project_model::project::TrimRange;

    fn snap(end: f64) -> EditorSnapshot {
        EditorSnapshot {
            trim: TrimRange::new(0.0, end),
            ..EditorSnapshot::default()
        }
    }

    fn trim_end(s: Option<&EditorSnapshot>) -> Option<f64> {
        s.map(|s| s.trim.end_secs)
    }

    #[test]
    fn test_undo_redo_walks_entries() {
        let mut history = History::default();
        history.push_snapshot(snap(1.0));
        history.push_snapshot(snap(2.0));
        history.push_snapshot(snap(3.0));

        assert_eq!(trim_end(history.undo()), Some(2.0));
        assert_eq!(trim_end(history.undo()), Some(1.0));
        assert_eq!(trim_end(history.undo()), None);
        assert_eq!(history.current_index(), Some(0));

        assert_eq!(trim_end(history.redo()), Some(2.0));
        assert_eq!(trim_end(history.redo()), Some(3.0));
        assert_eq!(trim_end(history.redo()), None);
    }

    #[test]
    fn test_empty_history_has_nothing_to_undo() {
        let mut history = History::default();
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert_eq!(history.current_index(), None);
    }

    #[test]
    fn test_push_after_undo_drops_redo_branch() {
        let mut history = History::default();
        history.push_snapshot(snap(1.0));
        history.push_snapshot(snap(2.0));
        history.push_snapshot(snap(3.0));
        history.undo();
        history.undo();

        let index = history.push_snapshot(snap(9.0));
        assert_eq!(index, 1);
        assert_eq!(history.len(), 2);
        assert!(history.redo().is_none());
        assert_eq!(trim_end(history.undo()), Some(1.0));
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = History::new(3);
        for i in 1..=5 {
            history.push_snapshot(snap(i as f64));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.current_index(), Some(2));
        assert_eq!(trim_end(history.current()), Some(5.0));
        assert_eq!(trim_end(history.jump_to(0)), Some(3.0));
    }

    #[test]
    fn test_jump_to_is_bounds_checked() {
        let mut history = History::default();
        history.push_snapshot(snap(1.0));
        history.push_snapshot(snap(2.0));

        assert!(history.jump_to(5).is_none());
        assert_eq!(history.current_index(), Some(1));
        assert_eq!(trim_end(history.jump_to(0)), Some(1.0));
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("reframe_history_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("history.json");

        let mut history = History::default();
        history.push_snapshot(snap(1.0));
        history.push_snapshot(snap(2.0));
        history.undo();
        history.save(&path).unwrap();

        let loaded = History::load(&path, 50).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.current_index(), Some(0));
        assert_eq!(loaded.entries(), history.entries());

        let shrunk = History::load(&path, 1).unwrap();
        assert_eq!(shrunk.len(), 1);
        assert_eq!(shrunk.current_index(), Some(0));
        assert_eq!(trim_end(shrunk.current()), Some(2.0));

        assert!(History::load_or_default(&dir.join("absent.json"), 50)
            .unwrap()
            .is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    proptest! {
        #[test]
        fn undo_returns_previous_push(ends in prop::collection::vec(1.0f64..100.0, 1..20)) {
            let mut history = History::default();
            for end in &ends {
                history.push_snapshot(snap(*end));
            }
            let expected = if ends.len() >= 2 { Some(ends[ends.len() - 2]) } else { None };
            prop_assert_eq!(trim_end(history.undo()), expected);
        }
    }
}
