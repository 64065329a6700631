//! Plain-text projection of session state.
//!
//! Everything here is a pure function of its inputs; front ends print the
//! result as-is.

use std::fmt::Write as _;

use quest_core::model::SuitLogEntry;

use crate::session::{ActiveQuest, LogStatus};

pub const EMPTY_LOG_MESSAGE: &str = "No quests found.";
pub const LOG_UNAVAILABLE_MESSAGE: &str = "Failed to load your quest log. Please try again.";

const BAR_WIDTH: usize = 20;

/// `[#####---------------]` for the given percent.
#[must_use]
pub fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

#[must_use]
pub fn render_quest(active: &ActiveQuest) -> String {
    let quest = &active.quest;
    let progress = &active.progress;
    let mut out = String::new();

    let _ = writeln!(out, "{} (#{})", quest.quest_name(), quest.id());
    let _ = writeln!(
        out,
        "{} {}% ({}/{} SGXP)",
        progress_bar(progress.percent),
        progress.percent,
        progress.earned,
        progress.total
    );
    if !quest.mission_summary().is_empty() {
        let _ = writeln!(out, "{}", quest.mission_summary());
    }
    let _ = writeln!(
        out,
        "Difficulty: {} | Duration: {} days | Help: {}",
        quest.difficulty(),
        quest.estimated_duration_days(),
        quest.help_mode()
    );

    let _ = writeln!(out, "\nSteps:");
    for (index, step) in quest.steps().iter().enumerate() {
        let mark = if progress.is_complete(step.id) { 'x' } else { ' ' };
        let _ = write!(out, "  {}. [{mark}] {}", index + 1, step.title);
        if !step.description.is_empty() {
            let _ = write!(out, ": {}", step.description);
        }
        let _ = writeln!(out, " ({} SGXP) [step {}]", step.sgxp_reward, step.id);
    }

    write_section(&mut out, "Reflection prompts:", quest.reflection_prompts());
    write_section(&mut out, "Safety notes:", quest.safety_notes());

    let _ = write!(out, "\nTotal SGXP: {}", quest.total_sgxp());
    out
}

/// One line per entry, in the order given.
#[must_use]
pub fn render_log(entries: &[&SuitLogEntry], status: LogStatus) -> String {
    if status == LogStatus::Unavailable {
        return LOG_UNAVAILABLE_MESSAGE.to_string();
    }
    if entries.is_empty() {
        return EMPTY_LOG_MESSAGE.to_string();
    }
    entries
        .iter()
        .map(|entry| render_log_entry(entry))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_log_entry(entry: &SuitLogEntry) -> String {
    let mut line = format!(
        "#{} {} | {} | {}/{} SGXP ({}%) | {}",
        entry.quest_id,
        entry.quest_name,
        entry.difficulty,
        entry.earned_sgxp,
        entry.total_sgxp,
        entry.completion_percent,
        entry.created_at.format("%Y-%m-%d"),
    );
    if !entry.mission_summary.is_empty() {
        line.push_str("\n    ");
        line.push_str(&entry.mission_summary);
    }
    line
}

fn write_section(out: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{heading}");
    for item in items {
        let _ = writeln!(out, "  - {item}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_core::model::{QuestId, StepId};
    use quest_core::normalize;
    use quest_core::progress::compute_progress;
    use quest_core::time::fixed_now;
    use serde_json::json;

    fn active(done: &[u64]) -> ActiveQuest {
        let quest = normalize(
            &json!({
                "id": 3,
                "quest_name": "Coat Drive",
                "mission_summary": "Collect coats.",
                "difficulty": "Easy",
                "estimated_duration_days": 7,
                "help_mode": "supplies",
                "steps": [
                    {"id": 1, "title": "Plan", "description": "Pick a spot", "sgxp_reward": 10},
                    {"id": 2, "title": "Collect", "sgxp_reward": 20},
                    {"id": 3, "title": "Deliver", "sgxp_reward": 30}
                ],
                "reflection_prompts": ["Who did you meet?"],
                "safety_notes": []
            }),
            fixed_now(),
        )
        .unwrap();
        let mut record = quest_core::model::ProgressRecord::default();
        for id in done {
            record.step_status.insert(StepId::new(*id), true);
        }
        let progress = compute_progress(&quest, Some(&record));
        ActiveQuest { quest, progress }
    }

    #[test]
    fn progress_bar_scales_to_width() {
        assert_eq!(progress_bar(0), format!("[{}]", "-".repeat(20)));
        assert_eq!(progress_bar(50), format!("[{}{}]", "#".repeat(10), "-".repeat(10)));
        assert_eq!(progress_bar(100), format!("[{}]", "#".repeat(20)));
    }

    #[test]
    fn quest_shows_steps_and_totals() {
        let text = render_quest(&active(&[2]));
        assert!(text.starts_with("Coat Drive (#3)\n"));
        assert!(text.contains("33% (20/60 SGXP)"));
        assert!(text.contains("  1. [ ] Plan: Pick a spot (10 SGXP) [step 1]"));
        assert!(text.contains("  2. [x] Collect (20 SGXP) [step 2]"));
        assert!(text.contains("Reflection prompts:\n  - Who did you meet?"));
        assert!(!text.contains("Safety notes:"));
        assert!(text.ends_with("Total SGXP: 60"));
    }

    #[test]
    fn log_messages_for_empty_and_unavailable() {
        assert_eq!(render_log(&[], LogStatus::Ready), EMPTY_LOG_MESSAGE);
        assert_eq!(render_log(&[], LogStatus::Unavailable), LOG_UNAVAILABLE_MESSAGE);
    }

    #[test]
    fn log_line_summarizes_entry() {
        let active = active(&[1, 3]);
        let entry = SuitLogEntry::from_quest(&active.quest, &active.progress);
        assert_eq!(entry.quest_id, QuestId::new(3));
        let text = render_log(&[&entry], LogStatus::Ready);
        assert_eq!(
            text,
            "#3 Coat Drive | Easy | 40/60 SGXP (67%) | 2023-11-14\n    Collect coats."
        );
    }
}
