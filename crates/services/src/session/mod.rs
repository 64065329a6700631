mod controller;
pub mod state;

pub use controller::{FALLBACK_CLARIFYING_QUESTIONS, QuestSessionController, RemoteSync};
pub use state::{ActiveQuest, LogStatus, ProgressEffect, QuestSession};
