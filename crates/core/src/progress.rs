//! Pure progress aggregation over a quest and its stored completion record.

use std::collections::BTreeMap;

use crate::model::{ProgressRecord, ProgressSnapshot, Quest, StepId};

/// Merge a quest with its stored record into display figures.
///
/// Without a stored record the quest's own `completed_step_ids` seed the
/// completion state. Status entries for ids the quest does not have are
/// dropped, and `earned` is always recomputed from the statuses.
#[must_use]
pub fn compute_progress(quest: &Quest, stored: Option<&ProgressRecord>) -> ProgressSnapshot {
    let step_status: BTreeMap<StepId, bool> = quest
        .steps()
        .iter()
        .map(|step| {
            let done = match stored {
                Some(record) => record.is_complete(step.id),
                None => quest.completed_step_ids().contains(&step.id),
            };
            (step.id, done)
        })
        .collect();
    snapshot(quest, step_status)
}

/// Flip the completion flag of `step` and return the record to persist.
///
/// A step id the quest does not contain leaves the flags unchanged. Duplicate
/// step ids share a single flag, so the last toggle applied to that id wins.
#[must_use]
pub fn toggle_step(quest: &Quest, current: Option<&ProgressRecord>, step: StepId) -> ProgressRecord {
    let mut step_status = compute_progress(quest, current).step_status;
    if let Some(done) = step_status.get_mut(&step) {
        *done = !*done;
    }
    snapshot(quest, step_status).to_record()
}

/// `round(100 * earned / total)` with halves rounded up, clamped to 100.
#[must_use]
pub fn completion_percent(earned: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let earned = u128::from(earned.min(total));
    let total = u128::from(total);
    let percent = (earned * 200 + total) / (total * 2);
    u8::try_from(percent.min(100)).unwrap_or(100)
}

fn snapshot(quest: &Quest, step_status: BTreeMap<StepId, bool>) -> ProgressSnapshot {
    let earned = quest
        .steps()
        .iter()
        .filter(|step| step_status.get(&step.id).copied().unwrap_or(false))
        .fold(0_u64, |acc, step| acc.saturating_add(step.sgxp_reward));
    let total = quest.total_sgxp();
    ProgressSnapshot {
        earned,
        total,
        percent: completion_percent(earned, total),
        step_status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize;
    use crate::time::fixed_now;
    use serde_json::json;

    fn quest_with_rewards(rewards: &[u64]) -> Quest {
        let steps: Vec<_> = rewards
            .iter()
            .enumerate()
            .map(|(i, r)| json!({"id": i + 1, "title": format!("Step {}", i + 1), "sgxp_reward": r}))
            .collect();
        normalize(&json!({"id": 1, "quest_name": "Q", "steps": steps}), fixed_now()).unwrap()
    }

    fn earned_from_flags(quest: &Quest, record: &ProgressRecord) -> u64 {
        quest
            .steps()
            .iter()
            .filter(|s| record.is_complete(s.id))
            .map(|s| s.sgxp_reward)
            .sum()
    }

    #[test]
    fn fresh_quest_starts_incomplete() {
        let quest = quest_with_rewards(&[10, 20, 30]);
        let progress = compute_progress(&quest, None);
        assert_eq!(progress.earned, 0);
        assert_eq!(progress.total, 60);
        assert_eq!(progress.percent, 0);
        assert!(progress.step_status.values().all(|done| !done));
    }

    #[test]
    fn toggling_steps_updates_earned_and_percent() {
        let quest = quest_with_rewards(&[10, 20, 30]);

        let record = toggle_step(&quest, None, StepId::new(2));
        let progress = compute_progress(&quest, Some(&record));
        assert_eq!(record.earned, 20);
        assert_eq!(progress.percent, 33);

        let record = toggle_step(&quest, Some(&record), StepId::new(1));
        let progress = compute_progress(&quest, Some(&record));
        assert_eq!(record.earned, 30);
        assert_eq!(progress.percent, 50);
    }

    #[test]
    fn earned_matches_flags_for_any_toggle_sequence() {
        let quest = quest_with_rewards(&[5, 10, 15, 20]);
        let sequence = [1, 1, 3, 2, 3, 4, 4, 4, 99, 2, 1];
        let mut record: Option<ProgressRecord> = None;
        for step in sequence {
            let next = toggle_step(&quest, record.as_ref(), StepId::new(step));
            assert_eq!(next.earned, earned_from_flags(&quest, &next));
            record = Some(next);
        }
        let record = record.unwrap();
        assert_eq!(record.earned, 5 + 20);
    }

    #[test]
    fn empty_quest_never_gains_progress() {
        let quest = quest_with_rewards(&[]);
        let record = toggle_step(&quest, None, StepId::new(1));
        let progress = compute_progress(&quest, Some(&record));
        assert_eq!(quest.total_sgxp(), 0);
        assert_eq!(progress.earned, 0);
        assert_eq!(progress.percent, 0);
        assert!(record.step_status.is_empty());
    }

    #[test]
    fn zero_reward_quest_reports_zero_percent_when_done() {
        let quest = quest_with_rewards(&[0, 0]);
        let record = toggle_step(&quest, None, StepId::new(1));
        let record = toggle_step(&quest, Some(&record), StepId::new(2));
        let progress = compute_progress(&quest, Some(&record));
        assert!(progress.step_status.values().all(|done| *done));
        assert_eq!(progress.percent, 0);
    }

    #[test]
    fn stale_stored_earned_is_recomputed() {
        let quest = quest_with_rewards(&[10, 20, 30]);
        let mut stored = ProgressRecord {
            earned: 999,
            ..ProgressRecord::default()
        };
        stored.step_status.insert(StepId::new(3), true);
        stored.step_status.insert(StepId::new(42), true);

        let progress = compute_progress(&quest, Some(&stored));
        assert_eq!(progress.earned, 30);
        assert_eq!(progress.percent, 50);
        assert!(!progress.step_status.contains_key(&StepId::new(42)));
    }

    #[test]
    fn seeds_from_payload_only_without_stored_record() {
        let raw = json!({
            "steps": [{"id": 1, "sgxp_reward": 10}, {"id": 2, "sgxp_reward": 30}],
            "completed_step_ids": [2]
        });
        let quest = normalize(&raw, fixed_now()).unwrap();

        assert_eq!(compute_progress(&quest, None).earned, 30);
        let stored = ProgressRecord::default();
        assert_eq!(compute_progress(&quest, Some(&stored)).earned, 0);
    }

    #[test]
    fn duplicate_step_ids_share_one_flag() {
        let raw = json!({
            "steps": [{"id": 4, "sgxp_reward": 10}, {"id": 4, "sgxp_reward": 5}]
        });
        let quest = normalize(&raw, fixed_now()).unwrap();
        let record = toggle_step(&quest, None, StepId::new(4));
        assert_eq!(record.step_status.len(), 1);
        assert_eq!(record.earned, 15);
        let record = toggle_step(&quest, Some(&record), StepId::new(4));
        assert_eq!(record.earned, 0);
    }

    #[test]
    fn percent_rounds_half_up_and_clamps() {
        assert_eq!(completion_percent(1, 8), 13); // 12.5
        assert_eq!(completion_percent(1, 3), 33);
        assert_eq!(completion_percent(2, 3), 67);
        assert_eq!(completion_percent(5, 0), 0);
        assert_eq!(completion_percent(50, 10), 100);
        assert_eq!(completion_percent(u64::MAX, u64::MAX), 100);
    }
}
