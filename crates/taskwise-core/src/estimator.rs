//! Rule-based priority and due-time estimation.
//!
//! Priority and timing are decided independently from the lower-cased
//! task text:
//!
//! - Priority: high keywords, then low keywords, else medium.
//! - Timing: an explicit "in N hours" wins; otherwise urgency wording
//!   schedules the task for the next full hour (and forces high
//!   priority); otherwise the task is due today at noon.
//!
//! All times are local wall-clock times and always fall on the hour.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::task::{hhmm, Priority};

/// Due time used when nothing in the text suggests one (noon).
pub fn default_due_time() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN)
}

const HIGH_PRIORITY_KEYWORDS: &[&str] = &["urgent", "asap", "emergency", "important", "critical"];
const LOW_PRIORITY_KEYWORDS: &[&str] = &["whenever", "someday", "if possible", "maybe"];
const URGENCY_KEYWORDS: &[&str] = &["urgent", "asap", "emergency", "immediately"];

static IN_HOURS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bin\s+(\d+)\s+hours?\b").expect("valid in-hours regex"));

static NOW_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bnow\b").expect("valid now regex"));

/// Suggested priority and due date/time for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSuggestion {
    pub priority: Priority,
    #[serde(rename = "suggestedDate")]
    pub date: NaiveDate,
    #[serde(rename = "suggestedTime", with = "hhmm")]
    pub time: NaiveTime,
}

/// Estimate priority and due date/time for `text` relative to `now`.
pub fn estimate(text: &str, now: NaiveDateTime) -> ScheduleSuggestion {
    let lower = text.to_lowercase();
    let mut priority = estimate_priority(&lower);

    let due = if let Some(due) = hours_from_now(&lower, now) {
        due
    } else if is_urgent(&lower) {
        priority = Priority::High;
        top_of_hour(now + TimeDelta::hours(1))
    } else {
        now.date().and_time(default_due_time())
    };

    ScheduleSuggestion {
        priority,
        date: due.date(),
        time: due.time(),
    }
}

/// Priority from keywords alone.
pub fn estimate_priority(lower: &str) -> Priority {
    if HIGH_PRIORITY_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Priority::High
    } else if LOW_PRIORITY_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Priority::Low
    } else {
        Priority::Medium
    }
}

fn is_urgent(lower: &str) -> bool {
    URGENCY_KEYWORDS.iter().any(|k| lower.contains(k)) || NOW_WORD.is_match(lower)
}

/// `now + N hours` (on the hour) for the first "in N hour(s)" with N > 0.
fn hours_from_now(lower: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let hours = IN_HOURS
        .captures_iter(lower)
        .filter_map(|caps| caps[1].parse::<i64>().ok())
        .find(|n| *n > 0)?;
    let due = now.checked_add_signed(TimeDelta::try_hours(hours)?)?;
    Some(top_of_hour(due))
}

fn top_of_hour(at: NaiveDateTime) -> NaiveDateTime {
    at.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at)
}
