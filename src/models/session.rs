use serde::{Deserialize, Serialize};
use std::fmt;

use super::Category;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SessionMode {
    Single,
    Balanced,
    Validation,
    Debug,
}

impl Default for SessionMode {
    fn default() -> Self {
        SessionMode::Balanced
    }
}

impl SessionMode {
    /// Tag written into the `session_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Single => "single",
            SessionMode::Balanced => "balanced",
            SessionMode::Validation => "validation",
            SessionMode::Debug => "debug",
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A planned acquisition task: collect `target` accepted samples of `category`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub category: Category,
    pub target: u32,
}

impl WorkItem {
    pub fn new(category: Category, target: u32) -> Self {
        Self { category, target }
    }
}
