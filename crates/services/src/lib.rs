#![forbid(unsafe_code)]

pub mod api;
pub mod app_services;
pub mod error;
pub mod identity;
pub mod progress_store;
pub mod session;
pub mod view;

pub use quest_core::Clock;

pub use api::{ClarifyingAnswer, HttpQuestApi, MissionDraft, QuestApi, QuestApiConfig};
pub use app_services::AppServices;
pub use error::{AppServicesError, QuestApiError, SessionError};
pub use identity::ClientIdentity;
pub use progress_store::LocalProgressStore;
pub use session::{ActiveQuest, LogStatus, QuestSessionController, RemoteSync};
