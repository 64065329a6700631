use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{QuestId, StepId};

/// How the player wants to help with a mission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HelpMode {
    #[default]
    Supplies,
    Awareness,
    Helpers,
    Other(String),
}

impl HelpMode {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            HelpMode::Supplies => "supplies",
            HelpMode::Awareness => "awareness",
            HelpMode::Helpers => "helpers",
            HelpMode::Other(raw) => raw,
        }
    }
}

impl From<&str> for HelpMode {
    fn from(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "supplies" => HelpMode::Supplies,
            "awareness" => HelpMode::Awareness,
            "helpers" => HelpMode::Helpers,
            _ => HelpMode::Other(raw.trim().to_string()),
        }
    }
}

impl From<String> for HelpMode {
    fn from(raw: String) -> Self {
        HelpMode::from(raw.as_str())
    }
}

impl From<HelpMode> for String {
    fn from(mode: HelpMode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for HelpMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One actionable step of a quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestStep {
    pub id: StepId,
    pub title: String,
    pub description: String,
    pub sgxp_reward: u64,
}

/// Unchecked quest fields, as assembled by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestDraft {
    pub id: QuestId,
    pub created_at: DateTime<Utc>,
    pub quest_name: String,
    pub mission_summary: String,
    pub difficulty: String,
    pub estimated_duration_days: u32,
    pub help_mode: HelpMode,
    pub steps: Vec<QuestStep>,
    pub reflection_prompts: Vec<String>,
    pub safety_notes: Vec<String>,
    pub completed_step_ids: BTreeSet<StepId>,
}

/// Canonical in-memory quest.
///
/// `total_sgxp` is derived from the steps when the quest is built and is never
/// taken from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quest {
    id: QuestId,
    created_at: DateTime<Utc>,
    quest_name: String,
    mission_summary: String,
    difficulty: String,
    estimated_duration_days: u32,
    help_mode: HelpMode,
    steps: Vec<QuestStep>,
    reflection_prompts: Vec<String>,
    safety_notes: Vec<String>,
    completed_step_ids: BTreeSet<StepId>,
    total_sgxp: u64,
}

impl Quest {
    /// Build a quest from a draft, enforcing a duration of at least one day.
    #[must_use]
    pub fn from_draft(draft: QuestDraft) -> Self {
        let total_sgxp = draft
            .steps
            .iter()
            .fold(0_u64, |acc, step| acc.saturating_add(step.sgxp_reward));
        Self {
            id: draft.id,
            created_at: draft.created_at,
            quest_name: draft.quest_name,
            mission_summary: draft.mission_summary,
            difficulty: draft.difficulty,
            estimated_duration_days: draft.estimated_duration_days.max(1),
            help_mode: draft.help_mode,
            steps: draft.steps,
            reflection_prompts: draft.reflection_prompts,
            safety_notes: draft.safety_notes,
            completed_step_ids: draft.completed_step_ids,
            total_sgxp,
        }
    }

    #[must_use]
    pub fn id(&self) -> QuestId {
        self.id
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn quest_name(&self) -> &str {
        &self.quest_name
    }

    #[must_use]
    pub fn mission_summary(&self) -> &str {
        &self.mission_summary
    }

    #[must_use]
    pub fn difficulty(&self) -> &str {
        &self.difficulty
    }

    #[must_use]
    pub fn estimated_duration_days(&self) -> u32 {
        self.estimated_duration_days
    }

    #[must_use]
    pub fn help_mode(&self) -> &HelpMode {
        &self.help_mode
    }

    #[must_use]
    pub fn steps(&self) -> &[QuestStep] {
        &self.steps
    }

    #[must_use]
    pub fn step(&self, id: StepId) -> Option<&QuestStep> {
        self.steps.iter().rev().find(|step| step.id == id)
    }

    #[must_use]
    pub fn reflection_prompts(&self) -> &[String] {
        &self.reflection_prompts
    }

    #[must_use]
    pub fn safety_notes(&self) -> &[String] {
        &self.safety_notes
    }

    /// Step ids the payload already reported as done; seeds fresh progress.
    #[must_use]
    pub fn completed_step_ids(&self) -> &BTreeSet<StepId> {
        &self.completed_step_ids
    }

    #[must_use]
    pub fn total_sgxp(&self) -> u64 {
        self.total_sgxp
    }

    /// Flat JSON in the shape the backend sends.
    #[must_use]
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "created_at": self.created_at.to_rfc3339(),
            "quest_name": self.quest_name,
            "mission_summary": self.mission_summary,
            "difficulty": self.difficulty,
            "estimated_duration_days": self.estimated_duration_days,
            "help_mode": self.help_mode,
            "steps": self.steps,
            "reflection_prompts": self.reflection_prompts,
            "safety_notes": self.safety_notes,
            "completed_step_ids": self.completed_step_ids,
            "total_sgxp": self.total_sgxp,
        })
    }
}
