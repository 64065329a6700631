//! Shared error types for the services crate.

use thiserror::Error;

use quest_core::MalformedQuestError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the quest backend client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestApiError {
    #[error("quest request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("quest request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("quest backend sent a malformed response: {0}")]
    MalformedResponse(String),
}

/// Errors surfaced to the player by the quest session.
///
/// Display strings are written for the player; the source carries detail
/// for logs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("Error generating quest. Please try again.")]
    Generate(#[source] QuestApiError),
    #[error("Failed to load the quest. Please try again.")]
    Load(#[source] QuestApiError),
    #[error("The quest could not be read. Please try again.")]
    Malformed(#[from] MalformedQuestError),
    #[error("no quest is open")]
    NoActiveQuest,
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Api(#[from] QuestApiError),
}
