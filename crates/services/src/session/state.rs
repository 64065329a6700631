//! Session state and the pure transitions applied to it.
//!
//! Each transition takes the current state by value and returns the next
//! one, plus the progress write the caller has to apply when there is one.

use quest_core::model::{ProgressRecord, ProgressSnapshot, Quest, QuestId, StepId, SuitLogEntry};
use quest_core::progress::{compute_progress, toggle_step};
use quest_core::SuitLog;

/// The quest currently on screen together with its progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveQuest {
    pub quest: Quest,
    pub progress: ProgressSnapshot,
}

/// Whether the Suit Log reflects the backend's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogStatus {
    #[default]
    NotLoaded,
    Ready,
    /// The backend list could not be fetched.
    Unavailable,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestSession {
    pub current: Option<ActiveQuest>,
    pub suit_log: SuitLog,
    pub log_status: LogStatus,
}

/// Local progress write requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEffect {
    None,
    Save(QuestId, ProgressRecord),
    Remove(QuestId),
    Clear,
}

/// A quest arrived (generated or opened): show it and record it in the log.
#[must_use]
pub fn on_quest_loaded(
    mut state: QuestSession,
    quest: Quest,
    stored: Option<&ProgressRecord>,
) -> QuestSession {
    let progress = compute_progress(&quest, stored);
    state
        .suit_log
        .upsert(SuitLogEntry::from_quest(&quest, &progress));
    state.current = Some(ActiveQuest { quest, progress });
    state
}

/// Flip one step of the current quest.
///
/// Progress of local-only quests (id 0) stays in memory: several of them
/// can exist at once and they have no key of their own.
#[must_use]
pub fn on_toggle_step(mut state: QuestSession, step: StepId) -> (QuestSession, ProgressEffect) {
    let Some(active) = state.current.as_mut() else {
        return (state, ProgressEffect::None);
    };
    if active.quest.step(step).is_none() {
        return (state, ProgressEffect::None);
    }

    let record = toggle_step(&active.quest, Some(&active.progress.to_record()), step);
    active.progress = compute_progress(&active.quest, Some(&record));

    let entry = SuitLogEntry::from_quest(&active.quest, &active.progress);
    let id = active.quest.id();
    state.suit_log.upsert(entry);

    let effect = if id.is_persisted() {
        ProgressEffect::Save(id, record)
    } else {
        ProgressEffect::None
    };
    (state, effect)
}

/// Optimistically forget a quest.
#[must_use]
pub fn on_deleted(mut state: QuestSession, id: QuestId) -> (QuestSession, ProgressEffect) {
    state.suit_log.remove(id);
    if state
        .current
        .as_ref()
        .is_some_and(|active| active.quest.id() == id)
    {
        state.current = None;
    }
    (state, ProgressEffect::Remove(id))
}

/// Optimistically forget every quest.
#[must_use]
pub fn on_cleared(mut state: QuestSession) -> (QuestSession, ProgressEffect) {
    state.suit_log.clear();
    state.current = None;
    (state, ProgressEffect::Clear)
}

/// Adopt the backend's list as the Suit Log.
///
/// The backend decides which persisted quests exist; only a local-only
/// current quest is carried over.
#[must_use]
pub fn on_hydrated(mut state: QuestSession, entries: Vec<SuitLogEntry>) -> QuestSession {
    state.suit_log.hydrate_from_backend(entries);
    if let Some(active) = state
        .current
        .as_ref()
        .filter(|active| !active.quest.id().is_persisted())
    {
        state
            .suit_log
            .upsert(SuitLogEntry::from_quest(&active.quest, &active.progress));
    }
    state.log_status = LogStatus::Ready;
    state
}

#[must_use]
pub fn on_log_unavailable(mut state: QuestSession) -> QuestSession {
    state.log_status = LogStatus::Unavailable;
    state
}

/// Back to the mission form; the log is untouched.
#[must_use]
pub fn on_new_quest(mut state: QuestSession) -> QuestSession {
    state.current = None;
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_core::normalize;
    use quest_core::time::fixed_now;
    use serde_json::json;

    fn quest(id: u64) -> Quest {
        normalize(
            &json!({
                "id": id,
                "quest_name": format!("Quest {id}"),
                "steps": [
                    {"id": 1, "sgxp_reward": 10},
                    {"id": 2, "sgxp_reward": 20},
                    {"id": 3, "sgxp_reward": 30}
                ]
            }),
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn loading_a_quest_makes_it_current_and_logs_it() {
        let state = on_quest_loaded(QuestSession::default(), quest(5), None);
        let active = state.current.as_ref().unwrap();
        assert_eq!(active.quest.id(), QuestId::new(5));
        assert_eq!(active.progress.total, 60);
        assert_eq!(state.suit_log.len(), 1);
    }

    #[test]
    fn toggle_updates_current_log_and_requests_save() {
        let state = on_quest_loaded(QuestSession::default(), quest(5), None);
        let (state, effect) = on_toggle_step(state, StepId::new(2));

        let active = state.current.as_ref().unwrap();
        assert_eq!(active.progress.earned, 20);
        assert_eq!(active.progress.percent, 33);

        let entry = state.suit_log.get(QuestId::new(5)).unwrap();
        assert_eq!(entry.earned_sgxp, 20);
        assert_eq!(entry.completion_percent, 33);

        match effect {
            ProgressEffect::Save(id, record) => {
                assert_eq!(id, QuestId::new(5));
                assert_eq!(record.earned, 20);
            }
            other => panic!("unexpected effect: {other:?}"),
        }
    }

    #[test]
    fn toggle_without_current_quest_is_a_no_op() {
        let (state, effect) = on_toggle_step(QuestSession::default(), StepId::new(1));
        assert_eq!(state, QuestSession::default());
        assert_eq!(effect, ProgressEffect::None);
    }

    #[test]
    fn toggle_of_unknown_step_requests_nothing() {
        let state = on_quest_loaded(QuestSession::default(), quest(5), None);
        let (state, effect) = on_toggle_step(state, StepId::new(99));
        assert_eq!(effect, ProgressEffect::None);
        assert_eq!(state.current.unwrap().progress.earned, 0);
    }

    #[test]
    fn local_only_quest_progress_is_not_persisted() {
        let state = on_quest_loaded(QuestSession::default(), quest(0), None);
        let (state, effect) = on_toggle_step(state, StepId::new(3));
        assert_eq!(effect, ProgressEffect::None);
        assert_eq!(state.current.unwrap().progress.earned, 30);
    }

    #[test]
    fn delete_drops_entry_and_current_quest() {
        let state = on_quest_loaded(QuestSession::default(), quest(1), None);
        let state = on_quest_loaded(state, quest(2), None);

        let (state, effect) = on_deleted(state, QuestId::new(2));
        assert_eq!(effect, ProgressEffect::Remove(QuestId::new(2)));
        assert!(state.current.is_none());
        assert!(state.suit_log.get(QuestId::new(2)).is_none());
        assert!(state.suit_log.get(QuestId::new(1)).is_some());
    }

    #[test]
    fn hydrate_drops_persisted_quests_missing_from_backend() {
        let state = on_quest_loaded(QuestSession::default(), quest(9), None);
        let backend = vec![SuitLogEntry::from_quest(
            &quest(3),
            &compute_progress(&quest(3), None),
        )];
        let state = on_hydrated(state, backend);

        assert_eq!(state.log_status, LogStatus::Ready);
        let ids: Vec<QuestId> = state.suit_log.iter().map(|e| e.quest_id).collect();
        assert_eq!(ids, vec![QuestId::new(3)]);
    }

    #[test]
    fn hydrate_keeps_local_only_current_quest() {
        let state = on_quest_loaded(QuestSession::default(), quest(0), None);
        let (state, _) = on_toggle_step(state, StepId::new(1));

        let backend = vec![SuitLogEntry::from_quest(
            &quest(3),
            &compute_progress(&quest(3), None),
        )];
        let state = on_hydrated(state, backend);

        assert_eq!(state.suit_log.len(), 2);
        assert_eq!(state.suit_log.get(QuestId::LOCAL).unwrap().earned_sgxp, 10);
    }

    #[test]
    fn clear_and_new_quest() {
        let state = on_quest_loaded(QuestSession::default(), quest(1), None);
        let state = on_new_quest(state);
        assert!(state.current.is_none());
        assert_eq!(state.suit_log.len(), 1);

        let (state, effect) = on_cleared(state);
        assert!(state.suit_log.is_empty());
        assert_eq!(effect, ProgressEffect::Clear);
    }
}
