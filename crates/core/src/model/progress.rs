use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::ids::StepId;

/// Locally persisted completion state of one quest.
///
/// `earned` must equal the reward sum of the steps marked `true`. Records
/// read back from storage are not trusted on that point; the aggregator
/// recomputes `earned` from `step_status`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(default)]
    pub earned: u64,
    #[serde(default)]
    pub step_status: BTreeMap<StepId, bool>,
}

impl ProgressRecord {
    #[must_use]
    pub fn is_complete(&self, step: StepId) -> bool {
        self.step_status.get(&step).copied().unwrap_or(false)
    }
}

/// Aggregated progress figures for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub earned: u64,
    pub total: u64,
    /// Rounded completion in `0..=100`.
    pub percent: u8,
    pub step_status: BTreeMap<StepId, bool>,
}

impl ProgressSnapshot {
    #[must_use]
    pub fn is_complete(&self, step: StepId) -> bool {
        self.step_status.get(&step).copied().unwrap_or(false)
    }

    /// The record to persist for this snapshot.
    #[must_use]
    pub fn to_record(&self) -> ProgressRecord {
        ProgressRecord {
            earned: self.earned,
            step_status: self.step_status.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_reads_with_missing_fields() {
        let record: ProgressRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(record, ProgressRecord::default());
    }

    #[test]
    fn step_status_keys_round_trip_through_json_objects() {
        let mut record = ProgressRecord::default();
        record.step_status.insert(StepId::new(2), true);
        record.earned = 20;

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"earned":20,"step_status":{"2":true}}"#);

        let back: ProgressRecord = serde_json::from_str(&json).unwrap();
        assert!(back.is_complete(StepId::new(2)));
        assert!(!back.is_complete(StepId::new(1)));
    }
}
