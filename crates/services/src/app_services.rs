use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::api::{HttpQuestApi, QuestApi, QuestApiConfig};
use crate::error::AppServicesError;
use crate::identity::ClientIdentity;
use crate::progress_store::LocalProgressStore;
use crate::session::QuestSessionController;

/// Wires storage, identity and the backend client for front ends.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    api: Arc<dyn QuestApi>,
    progress: LocalProgressStore,
    identity: ClientIdentity,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the HTTP backend.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails or the HTTP
    /// client cannot be built.
    pub async fn connect(
        db_url: &str,
        api_config: QuestApiConfig,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let api = Arc::new(HttpQuestApi::new(api_config)?);
        Ok(Self::from_parts(clock, storage, api))
    }

    /// Assemble from already-built parts.
    #[must_use]
    pub fn from_parts(clock: Clock, storage: Storage, api: Arc<dyn QuestApi>) -> Self {
        Self {
            clock,
            api,
            progress: LocalProgressStore::new(Arc::clone(&storage.kv)),
            identity: ClientIdentity::new(storage.kv),
        }
    }

    /// A fresh session with no quest open and the log not yet loaded.
    #[must_use]
    pub fn session(&self) -> QuestSessionController {
        QuestSessionController::new(
            self.clock,
            Arc::clone(&self.api),
            self.progress.clone(),
            self.identity.clone(),
        )
    }

    #[must_use]
    pub fn progress(&self) -> &LocalProgressStore {
        &self.progress
    }
}
