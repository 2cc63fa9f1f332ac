//! Category set: built-in categories plus user-defined custom categories.
//!
//! Custom names keep the casing they were created with; every lookup and
//! uniqueness check is case-insensitive.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CategoryError;

/// Virtual category that selects every task. Never stored on a task.
pub const ALL: &str = "all";
pub const WORK: &str = "work";
pub const SCHOOL: &str = "school";
pub const PERSONAL: &str = "personal";
pub const HEALTH: &str = "health";
pub const SHOPPING: &str = "shopping";

/// Whether the user works or studies. Selects the work/school built-in
/// category and the keyword set the classifier applies to it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OccupationType {
    #[default]
    Work,
    School,
}

impl OccupationType {
    /// The built-in category this occupation contributes, also the
    /// substitute for unrecognized AI categories.
    pub fn default_category(&self) -> &'static str {
        match self {
            OccupationType::Work => WORK,
            OccupationType::School => SCHOOL,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.default_category()
    }
}

impl fmt::Display for OccupationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OccupationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "work" => Ok(OccupationType::Work),
            "school" => Ok(OccupationType::School),
            other => Err(format!("unknown occupation type: {other} (expected work or school)")),
        }
    }
}

/// Stored built-in categories for an occupation, in display order.
pub fn builtin_categories(occupation: OccupationType) -> [&'static str; 4] {
    [occupation.default_category(), PERSONAL, HEALTH, SHOPPING]
}

/// Case-insensitive category comparison.
pub fn same_category(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn is_reserved(name: &str) -> bool {
    [ALL, WORK, SCHOOL, PERSONAL, HEALTH, SHOPPING]
        .iter()
        .any(|reserved| same_category(reserved, name))
}

/// The categories known at a point in time: built-ins for the active
/// occupation followed by custom categories in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySet {
    occupation: OccupationType,
    custom: Vec<String>,
}

impl CategorySet {
    pub fn new(occupation: OccupationType, custom: Vec<String>) -> Self {
        Self { occupation, custom }
    }

    pub fn occupation(&self) -> OccupationType {
        self.occupation
    }

    pub fn set_occupation(&mut self, occupation: OccupationType) {
        self.occupation = occupation;
    }

    pub fn custom(&self) -> &[String] {
        &self.custom
    }

    /// Every selectable category for display, starting with the virtual `all`.
    pub fn display_list(&self) -> Vec<String> {
        std::iter::once(ALL)
            .chain(builtin_categories(self.occupation))
            .map(str::to_string)
            .chain(self.custom.iter().cloned())
            .collect()
    }

    /// Match `label` against the known set and return it in canonical
    /// casing: built-ins lower-case, custom categories as stored.
    /// The virtual `all` is not a known category.
    pub fn resolve(&self, label: &str) -> Option<String> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }
        if let Some(custom) = self.custom.iter().find(|c| same_category(c, label)) {
            return Some(custom.clone());
        }
        builtin_categories(self.occupation)
            .iter()
            .find(|b| same_category(b, label))
            .map(|b| b.to_string())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.resolve(label).is_some()
    }

    /// Add a custom category. Returns the trimmed name as stored.
    pub fn add(&mut self, name: &str) -> Result<String, CategoryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CategoryError::EmptyName);
        }
        if is_reserved(name) || self.custom.iter().any(|c| same_category(c, name)) {
            return Err(CategoryError::Duplicate(name.to_string()));
        }
        self.custom.push(name.to_string());
        Ok(name.to_string())
    }

    /// Remove a custom category, returning its stored name.
    ///
    /// Built-in categories cannot be removed.
    pub fn remove(&mut self, name: &str) -> Result<String, CategoryError> {
        let name = name.trim();
        if is_reserved(name) {
            return Err(CategoryError::Protected(name.to_lowercase()));
        }
        let index = self
            .custom
            .iter()
            .position(|c| same_category(c, name))
            .ok_or_else(|| CategoryError::NotFound(name.to_string()))?;
        Ok(self.custom.remove(index))
    }
}
