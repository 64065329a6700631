use chrono::{DateTime, Utc};

use crate::model::ids::QuestId;
use crate::model::progress::ProgressSnapshot;
use crate::model::quest::{HelpMode, Quest};

/// Summary of a quest as listed in the Suit Log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuitLogEntry {
    pub quest_id: QuestId,
    pub quest_name: String,
    pub mission_summary: String,
    pub difficulty: String,
    pub help_mode: HelpMode,
    pub created_at: DateTime<Utc>,
    pub earned_sgxp: u64,
    pub total_sgxp: u64,
    pub completion_percent: u8,
}

impl SuitLogEntry {
    #[must_use]
    pub fn from_quest(quest: &Quest, progress: &ProgressSnapshot) -> Self {
        Self {
            quest_id: quest.id(),
            quest_name: quest.quest_name().to_string(),
            mission_summary: quest.mission_summary().to_string(),
            difficulty: quest.difficulty().to_string(),
            help_mode: quest.help_mode().clone(),
            created_at: quest.created_at(),
            earned_sgxp: progress.earned,
            total_sgxp: progress.total,
            completion_percent: progress.percent,
        }
    }

    /// Whether `other` describes the same quest.
    ///
    /// Persisted quests match on id. Local-only quests (id 0) have no
    /// identity yet and match on name plus creation time.
    #[must_use]
    pub fn same_quest(&self, other: &SuitLogEntry) -> bool {
        if self.quest_id.is_persisted() || other.quest_id.is_persisted() {
            return self.quest_id == other.quest_id;
        }
        self.quest_name == other.quest_name && self.created_at == other.created_at
    }

    pub fn apply_progress(&mut self, progress: &ProgressSnapshot) {
        self.earned_sgxp = progress.earned;
        self.total_sgxp = progress.total;
        self.completion_percent = progress.percent;
    }
}
