use std::collections::BTreeSet;
use std::sync::Arc;

use quest_core::model::{ProgressSnapshot, Quest, QuestId, StepId, SuitLogEntry};
use quest_core::progress::compute_progress;
use quest_core::{Clock, SortMode, normalize};

use crate::api::{ClarifyingAnswer, MissionDraft, QuestApi};
use crate::error::SessionError;
use crate::identity::ClientIdentity;
use crate::progress_store::LocalProgressStore;
use crate::session::state::{
    self, ActiveQuest, LogStatus, ProgressEffect, QuestSession,
};

/// Asked when the backend cannot supply clarifying questions.
pub const FALLBACK_CLARIFYING_QUESTIONS: [&str; 2] = [
    "Who is the specific beneficiary of this mission?",
    "What is your timeline for completing this?",
];

/// How a best-effort backend removal went. Local state is already updated
/// regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteSync {
    Confirmed,
    Failed,
    /// Nothing to tell the backend (the quest was local-only).
    Skipped,
}

/// Drives the clarify, generate, toggle and delete flow over a `QuestSession`.
///
/// The controller owns the session state and applies the effects that the
/// pure transitions in [`state`] ask for.
pub struct QuestSessionController {
    clock: Clock,
    api: Arc<dyn QuestApi>,
    progress: LocalProgressStore,
    identity: ClientIdentity,
    client_id: Option<String>,
    state: QuestSession,
}

impl QuestSessionController {
    #[must_use]
    pub fn new(
        clock: Clock,
        api: Arc<dyn QuestApi>,
        progress: LocalProgressStore,
        identity: ClientIdentity,
    ) -> Self {
        Self {
            clock,
            api,
            progress,
            identity,
            client_id: None,
            state: QuestSession::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &QuestSession {
        &self.state
    }

    #[must_use]
    pub fn current(&self) -> Option<&ActiveQuest> {
        self.state.current.as_ref()
    }

    #[must_use]
    pub fn suit_log(&self, mode: SortMode) -> Vec<&SuitLogEntry> {
        self.state.suit_log.sorted_view(mode)
    }

    /// The id scoping this player's quests on the backend.
    pub async fn client_id(&mut self) -> String {
        if let Some(id) = &self.client_id {
            return id.clone();
        }
        let id = self.identity.get_or_create().await;
        self.client_id = Some(id.clone());
        id
    }

    /// Rebuild the Suit Log from the backend list merged with local progress.
    ///
    /// Local progress for quests the backend no longer lists is dropped. A
    /// failed fetch leaves the log and the store as they were and marks the
    /// log unavailable.
    pub async fn hydrate(&mut self) -> LogStatus {
        let client_id = self.client_id().await;
        let raw_quests = match self.api.list_quests(&client_id).await {
            Ok(list) => list,
            Err(error) => {
                tracing::warn!(%error, "failed to fetch the quest log");
                self.apply(state::on_log_unavailable);
                return LogStatus::Unavailable;
            }
        };

        let now = self.clock.now();
        let quests: Vec<Quest> = raw_quests
            .iter()
            .filter_map(|raw| match normalize(raw, now) {
                Ok(quest) => Some(quest),
                Err(error) => {
                    tracing::warn!(%error, "skipping unreadable quest in log");
                    None
                }
            })
            .collect();

        let known: BTreeSet<QuestId> = quests.iter().map(Quest::id).collect();
        self.progress.retain(&known).await;

        let stored = self.progress.load_all().await;
        let entries: Vec<SuitLogEntry> = quests
            .iter()
            .map(|quest| {
                let progress = compute_progress(quest, stored.get(&quest.id()));
                SuitLogEntry::from_quest(quest, &progress)
            })
            .collect();

        self.apply(|s| state::on_hydrated(s, entries));
        LogStatus::Ready
    }

    /// Ask the backend for clarifying questions, falling back to a fixed set.
    pub async fn clarify(&mut self, mission: &MissionDraft) -> Vec<String> {
        let client_id = self.client_id().await;
        match self.api.clarify_mission(&client_id, mission).await {
            Ok(questions) => questions,
            Err(error) => {
                tracing::warn!(%error, "clarify-mission failed; using fallback questions");
                FALLBACK_CLARIFYING_QUESTIONS
                    .iter()
                    .map(ToString::to_string)
                    .collect()
            }
        }
    }

    /// Generate a quest and make it current.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Generate` if the backend call fails, or
    /// `SessionError::Malformed` if the reply is not a quest. The Suit Log is
    /// unchanged in both cases.
    pub async fn generate(
        &mut self,
        mission: &MissionDraft,
        answers: &[ClarifyingAnswer],
    ) -> Result<&ActiveQuest, SessionError> {
        let client_id = self.client_id().await;
        let raw = self
            .api
            .generate_quest(&client_id, mission, answers)
            .await
            .map_err(SessionError::Generate)?;
        self.show_quest(&raw).await
    }

    /// Fetch a quest from the backend and make it current.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Load` if the backend call fails, or
    /// `SessionError::Malformed` if the reply is not a quest.
    pub async fn open_quest(&mut self, id: QuestId) -> Result<&ActiveQuest, SessionError> {
        let client_id = self.client_id().await;
        let raw = self
            .api
            .get_quest(&client_id, id)
            .await
            .map_err(SessionError::Load)?;
        self.show_quest(&raw).await
    }

    /// Flip a step of the current quest and persist the new progress before
    /// returning it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoActiveQuest` if no quest is open.
    pub async fn toggle_step(&mut self, step: StepId) -> Result<&ProgressSnapshot, SessionError> {
        if self.state.current.is_none() {
            return Err(SessionError::NoActiveQuest);
        }
        let effect = self.apply_with_effect(|s| state::on_toggle_step(s, step));
        self.persist(effect).await;
        self.state
            .current
            .as_ref()
            .map(|active| &active.progress)
            .ok_or(SessionError::NoActiveQuest)
    }

    /// Remove a quest locally, then ask the backend to delete it.
    ///
    /// The local removal stands whatever the backend answers.
    pub async fn delete_quest(&mut self, id: QuestId) -> RemoteSync {
        let effect = self.apply_with_effect(|s| state::on_deleted(s, id));
        self.persist(effect).await;

        if !id.is_persisted() {
            return RemoteSync::Skipped;
        }
        let client_id = self.client_id().await;
        match self.api.delete_quest(&client_id, id).await {
            Ok(()) => RemoteSync::Confirmed,
            Err(error) => {
                tracing::warn!(%error, quest_id = %id, "backend delete failed; keeping local removal");
                RemoteSync::Failed
            }
        }
    }

    /// Empty the Suit Log and all local progress, then ask the backend to do
    /// the same.
    pub async fn clear_all(&mut self) -> RemoteSync {
        let effect = self.apply_with_effect(state::on_cleared);
        self.persist(effect).await;

        let client_id = self.client_id().await;
        match self.api.clear_quests(&client_id).await {
            Ok(()) => RemoteSync::Confirmed,
            Err(error) => {
                tracing::warn!(%error, "backend clear failed; keeping local removal");
                RemoteSync::Failed
            }
        }
    }

    /// Close the current quest and go back to the mission form.
    pub fn new_quest(&mut self) {
        self.apply(state::on_new_quest);
    }

    async fn show_quest(&mut self, raw: &serde_json::Value) -> Result<&ActiveQuest, SessionError> {
        let quest = normalize(raw, self.clock.now())?;
        let stored = if quest.id().is_persisted() {
            self.progress.load(quest.id()).await
        } else {
            None
        };
        self.apply(|s| state::on_quest_loaded(s, quest, stored.as_ref()));
        self.state.current.as_ref().ok_or(SessionError::NoActiveQuest)
    }

    async fn persist(&self, effect: ProgressEffect) {
        match effect {
            ProgressEffect::None => {}
            ProgressEffect::Save(id, record) => self.progress.save(id, &record).await,
            ProgressEffect::Remove(id) => self.progress.remove(id).await,
            ProgressEffect::Clear => self.progress.clear().await,
        }
    }

    fn apply(&mut self, transition: impl FnOnce(QuestSession) -> QuestSession) {
        let current = std::mem::take(&mut self.state);
        self.state = transition(current);
    }

    fn apply_with_effect(
        &mut self,
        transition: impl FnOnce(QuestSession) -> (QuestSession, ProgressEffect),
    ) -> ProgressEffect {
        let current = std::mem::take(&mut self.state);
        let (next, effect) = transition(current);
        self.state = next;
        effect
    }
}
