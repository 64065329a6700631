use std::fmt;
use std::str::FromStr;

use crate::model::{ProgressSnapshot, QuestId, SuitLogEntry};

/// Orderings offered by the Suit Log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Recent,
    Oldest,
    /// Most earned SGXP first.
    SgxpHigh,
    /// Least earned SGXP first.
    SgxpLow,
}

impl SortMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::Recent => "recent",
            SortMode::Oldest => "oldest",
            SortMode::SgxpHigh => "quest-sgxp-high",
            SortMode::SgxpLow => "quest-sgxp-low",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSortModeError(String);

impl fmt::Display for ParseSortModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown sort mode `{}` (expected recent, oldest, quest-sgxp-high or quest-sgxp-low)",
            self.0
        )
    }
}

impl std::error::Error for ParseSortModeError {}

impl FromStr for SortMode {
    type Err = ParseSortModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "recent" => Ok(SortMode::Recent),
            "oldest" => Ok(SortMode::Oldest),
            "quest-sgxp-high" => Ok(SortMode::SgxpHigh),
            "quest-sgxp-low" => Ok(SortMode::SgxpLow),
            other => Err(ParseSortModeError(other.to_string())),
        }
    }
}

/// History of generated quests, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuitLog {
    entries: Vec<SuitLogEntry>,
}

impl SuitLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `entry`, or replace the entry for the same quest in place.
    pub fn upsert(&mut self, entry: SuitLogEntry) {
        match self.entries.iter_mut().find(|e| e.same_quest(&entry)) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Remove the entry with the given id. Returns whether one was removed.
    pub fn remove(&mut self, id: QuestId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.quest_id != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn get(&self, id: QuestId) -> Option<&SuitLogEntry> {
        self.entries.iter().find(|e| e.quest_id == id)
    }

    /// Refresh the progress figures of a persisted quest's entry.
    pub fn update_progress(&mut self, id: QuestId, progress: &ProgressSnapshot) -> bool {
        match self.entries.iter_mut().find(|e| e.quest_id == id) {
            Some(entry) => {
                entry.apply_progress(progress);
                true
            }
            None => false,
        }
    }

    /// Replace everything with the backend's current list.
    pub fn hydrate_from_backend(&mut self, entries: impl IntoIterator<Item = SuitLogEntry>) {
        self.entries.clear();
        for entry in entries {
            self.upsert(entry);
        }
    }

    /// Entries ordered by `mode`; ties keep insertion order.
    #[must_use]
    pub fn sorted_view(&self, mode: SortMode) -> Vec<&SuitLogEntry> {
        let mut view: Vec<&SuitLogEntry> = self.entries.iter().collect();
        match mode {
            SortMode::Recent => view.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortMode::Oldest => view.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            SortMode::SgxpHigh => view.sort_by(|a, b| b.earned_sgxp.cmp(&a.earned_sgxp)),
            SortMode::SgxpLow => view.sort_by(|a, b| a.earned_sgxp.cmp(&b.earned_sgxp)),
        }
        view
    }

    pub fn iter(&self) -> impl Iterator<Item = &SuitLogEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
