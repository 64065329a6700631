mod ids;
mod progress;
mod quest;
mod suit_log;

pub use ids::{ParseIdError, QuestId, StepId};
pub use progress::{ProgressRecord, ProgressSnapshot};
pub use quest::{HelpMode, Quest, QuestDraft, QuestStep};
pub use suit_log::SuitLogEntry;
