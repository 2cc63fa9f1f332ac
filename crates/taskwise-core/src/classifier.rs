//! Keyword-based task categorization.
//!
//! Used whenever the AI analyzer is unavailable or fails. Rules are
//! evaluated in order and the first match wins:
//!
//! 1. Custom categories (substring of the task text, insertion order)
//! 2. School keywords, only for school profiles
//! 3. Work keywords, only for work profiles
//! 4. Health keywords
//! 5. Shopping keywords
//! 6. `personal`

use regex::Regex;
use std::sync::LazyLock;

use crate::category::{OccupationType, HEALTH, PERSONAL, SCHOOL, SHOPPING, WORK};

const SCHOOL_KEYWORDS: &[&str] = &[
    "homework",
    "study",
    "assignment",
    "class",
    "exam",
    "test",
    "math",
    "science",
    "essay",
];

const WORK_KEYWORDS: &[&str] = &["meeting", "presentation", "email", "client", "project"];

const HEALTH_KEYWORDS: &[&str] = &[
    "exercise", "gym", "health", "workout", "swim", "fitness", "training",
];

const SHOPPING_KEYWORDS: &[&str] = &["buy", "shop", "purchase", "store", "groceries"];

/// "work" must start a word: "working" and "workday" count, "homework"
/// does not.
static WORK_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bwork").expect("valid work regex"));

/// Short activity verbs only count as whole words ("run" but not "running"
/// or "brunch").
static HEALTH_VERBS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(run|walk|jog)\b").expect("valid health verb regex"));

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// Pick a category for `text`.
///
/// Only ever returns a custom category from `custom_categories` (in its
/// stored casing) or one of the built-ins; never invents a label.
pub fn classify(text: &str, occupation: OccupationType, custom_categories: &[String]) -> String {
    let lower = text.to_lowercase();

    if let Some(custom) = custom_categories.iter().find(|c| {
        let name = c.trim().to_lowercase();
        !name.is_empty() && lower.contains(&name)
    }) {
        return custom.clone();
    }

    match occupation {
        OccupationType::School if contains_any(&lower, SCHOOL_KEYWORDS) => {
            return SCHOOL.to_string();
        }
        OccupationType::Work
            if contains_any(&lower, WORK_KEYWORDS) || WORK_WORD.is_match(&lower) =>
        {
            return WORK.to_string();
        }
        _ => {}
    }

    if contains_any(&lower, HEALTH_KEYWORDS) || HEALTH_VERBS.is_match(&lower) {
        return HEALTH.to_string();
    }

    if contains_any(&lower, SHOPPING_KEYWORDS) {
        return SHOPPING.to_string();
    }

    PERSONAL.to_string()
}
