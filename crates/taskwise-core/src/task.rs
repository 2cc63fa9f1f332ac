//! Task record and priority.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task priority.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// `HH:MM` (de)serialization for due times.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(raw.trim(), FORMAT).map_err(serde::de::Error::custom)
    }
}

/// A stored task.
///
/// Field names serialize in camelCase (`dueDate`, `dueTime`) so existing
/// todo lists load unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Creation-ordered identifier (millisecond timestamp).
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    pub category: String,
    pub due_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub due_time: NaiveTime,
    /// Older records predate priorities.
    #[serde(default)]
    pub priority: Priority,
}

impl Task {
    /// Due time as `HH:MM`.
    pub fn due_time_label(&self) -> String {
        self.due_time.format(hhmm::FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_serializes_with_camel_case_and_hhmm() {
        let task = Task {
            id: "1704103200000".to_string(),
            text: "Submit report".to_string(),
            completed: false,
            category: "work".to_string(),
            due_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            due_time: NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
            priority: Priority::High,
        };

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["dueDate"], "2024-01-01");
        assert_eq!(json["dueTime"], "13:00");
        assert_eq!(json["priority"], "high");

        let decoded: Task = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, task);
    }

    #[test]
    fn legacy_record_without_priority_loads_as_medium() {
        let json = r#"{"id":"1","text":"Call mom","completed":true,"category":"personal","dueDate":"2024-03-05","dueTime":"09:30"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert!(task.completed);
        assert_eq!(task.due_time_label(), "09:30");
    }

    #[test]
    fn priority_parses_loosely() {
        assert_eq!(" HIGH ".parse::<Priority>(), Ok(Priority::High));
        assert!("urgent".parse::<Priority>().is_err());
    }
}
