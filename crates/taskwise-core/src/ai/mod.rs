//! External AI analysis of task text.
//!
//! The [`TaskAnalyzer`] trait is the seam between the classification
//! service and a language model. Every operation is fallible; callers are
//! expected to replace any failure with the local heuristics.

pub mod groq;
mod prompt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::category::CategorySet;
use crate::estimator::ScheduleSuggestion;
use crate::task::{hhmm, Task};

pub use groq::GroqClient;
pub use prompt::{category_prompt, clean_prompt, schedule_prompt};

#[derive(Debug, Error)]
pub enum AiError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Model returned an empty completion")]
    EmptyCompletion,

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("No API key configured")]
    NoApiKey,
}

pub type AiResult<T> = Result<T, AiError>;

/// What the model needs to know to pick a category.
#[derive(Debug, Clone, Copy)]
pub struct CategoryContext<'a> {
    pub categories: &'a CategorySet,
    /// Recently created tasks, used as labelled examples.
    pub recent_tasks: &'a [Task],
}

/// A language-model backend able to analyze task text.
pub trait TaskAnalyzer: Send + Sync {
    /// Remove scheduling phrases from the task text.
    fn clean_text(&self, text: &str) -> impl Future<Output = AiResult<String>> + Send;

    /// Free-text category guess. The caller validates it against the
    /// known category set.
    fn categorize(
        &self,
        text: &str,
        context: CategoryContext<'_>,
    ) -> impl Future<Output = AiResult<String>> + Send;

    /// Priority and due date/time relative to the local time `now`.
    fn suggest_schedule(
        &self,
        text: &str,
        now: NaiveDateTime,
    ) -> impl Future<Output = AiResult<ScheduleSuggestion>> + Send;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleReply {
    priority: String,
    suggested_date: NaiveDate,
    #[serde(with = "hhmm")]
    suggested_time: NaiveTime,
}

/// Strip a surrounding markdown code fence (```json ... ```), if any.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let start = trimmed.find('\n').map(|i| i + 1).unwrap_or(trimmed.len());
    let end = trimmed[start..]
        .rfind("```")
        .map(|i| i + start)
        .unwrap_or(trimmed.len());
    trimmed[start..end].trim()
}

/// Parse the model's `{priority, suggestedDate, suggestedTime}` reply.
pub fn parse_schedule_reply(text: &str) -> AiResult<ScheduleSuggestion> {
    let json = strip_code_fence(text);
    let reply: ScheduleReply =
        serde_json::from_str(json).map_err(|e| AiError::Parse(format!("schedule JSON: {e}")))?;
    let priority = reply.priority.parse().map_err(AiError::Parse)?;
    Ok(ScheduleSuggestion {
        priority,
        date: reply.suggested_date,
        time: reply.suggested_time,
    })
}

/// Reduce a free-text category reply to a bare label: first line, without
/// quotes or a trailing period.
pub fn normalize_category_reply(reply: &str) -> String {
    reply
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
        .trim_end_matches('.')
        .trim_matches(|c| c == '"' || c == '\'' || c == '`' || c == '*')
        .trim_end_matches('.')
        .trim()
        .to_string()
}
