//! Turns loosely-typed quest payloads into canonical [`Quest`] values.
//!
//! The backend (and older cached payloads) may omit fields or send them with
//! the wrong JSON type. Every field has a fallback so a quest can always be
//! shown; the only hard failure is a payload that is not an object at all.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::{HelpMode, Quest, QuestDraft, QuestId, QuestStep, StepId};

pub const DEFAULT_QUEST_NAME: &str = "Untitled Quest";
pub const DEFAULT_DIFFICULTY: &str = "Medium";
pub const DEFAULT_DURATION_DAYS: u32 = 14;
pub const DEFAULT_STEP_REWARD: u64 = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MalformedQuestError {
    #[error("quest payload must be a JSON object, got {kind}")]
    NotAnObject { kind: &'static str },
}

/// Normalize a raw quest payload.
///
/// `now` becomes `created_at` when the payload carries no usable timestamp.
///
/// # Errors
///
/// Returns `MalformedQuestError::NotAnObject` if `raw` is not a JSON object.
pub fn normalize(raw: &Value, now: DateTime<Utc>) -> Result<Quest, MalformedQuestError> {
    let Value::Object(obj) = raw else {
        return Err(MalformedQuestError::NotAnObject {
            kind: json_kind(raw),
        });
    };

    let id = obj
        .get("id")
        .and_then(coerce_id)
        .map_or(QuestId::LOCAL, QuestId::new);

    let steps = match obj.get("steps") {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(idx, item)| normalize_step(idx + 1, item))
            .collect(),
        _ => Vec::new(),
    };

    let completed_step_ids = match obj.get("completed_step_ids") {
        Some(Value::Array(items)) => items.iter().filter_map(coerce_id).map(StepId::new).collect(),
        _ => BTreeSet::new(),
    };

    let estimated_duration_days = obj
        .get("estimated_duration_days")
        .and_then(coerce_count)
        .map_or(DEFAULT_DURATION_DAYS, |days| {
            u32::try_from(days).unwrap_or(u32::MAX)
        });

    Ok(Quest::from_draft(QuestDraft {
        id,
        created_at: obj
            .get("created_at")
            .and_then(parse_timestamp)
            .unwrap_or(now),
        quest_name: non_blank(obj, "quest_name").unwrap_or_else(|| DEFAULT_QUEST_NAME.to_string()),
        mission_summary: string_field(obj, "mission_summary"),
        difficulty: non_blank(obj, "difficulty").unwrap_or_else(|| DEFAULT_DIFFICULTY.to_string()),
        estimated_duration_days,
        help_mode: obj
            .get("help_mode")
            .and_then(Value::as_str)
            .map(HelpMode::from)
            .unwrap_or_default(),
        steps,
        reflection_prompts: string_list(obj, "reflection_prompts"),
        safety_notes: string_list(obj, "safety_notes"),
        completed_step_ids,
    }))
}

fn normalize_step(position: usize, raw: &Value) -> QuestStep {
    let empty = Map::new();
    let obj = raw.as_object().unwrap_or(&empty);
    let fallback_id = u64::try_from(position).unwrap_or(u64::MAX);

    QuestStep {
        id: StepId::new(obj.get("id").and_then(coerce_id).unwrap_or(fallback_id)),
        title: non_blank(obj, "title").unwrap_or_else(|| format!("Step {position}")),
        description: string_field(obj, "description"),
        sgxp_reward: obj
            .get("sgxp_reward")
            .and_then(coerce_count)
            .unwrap_or(DEFAULT_STEP_REWARD),
    }
}

/// Ids must be non-negative integers (or their decimal text).
fn coerce_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

/// Counts accept any number or numeric text; fractions truncate and
/// negatives clamp to zero.
fn coerce_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                Some(v)
            } else if n.as_i64().is_some() {
                Some(0)
            } else {
                n.as_f64().and_then(truncate_float)
            }
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(v) = s.parse::<i64>() {
                Some(u64::try_from(v).unwrap_or(0))
            } else {
                s.parse::<f64>().ok().and_then(truncate_float)
            }
        }
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn truncate_float(v: f64) -> Option<u64> {
    if !v.is_finite() {
        return None;
    }
    // `as` saturates at the u64 bounds.
    Some(v.trunc().max(0.0) as u64)
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let raw = value.as_str()?.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn non_blank(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

fn string_field(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn string_list(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    match obj.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(ToString::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
