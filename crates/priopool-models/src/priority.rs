//! Task priority levels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Priority of a submitted task.
///
/// Lower numeric value means the task is offered to workers sooner, so
/// `Priority::High < Priority::Low` under `Ord`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Runs before everything else.
    High = 1,
    /// Default priority.
    #[default]
    Medium = 2,
    /// Runs when nothing more urgent is pending.
    Low = 3,
}

impl Priority {
    /// All priorities, highest first.
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Numeric rank of this priority (1 = highest).
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Looks up a priority by its numeric rank.
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(Priority::High),
            2 => Some(Priority::Medium),
            3 => Some(Priority::Low),
            _ => None,
        }
    }

    /// Upper-case name used in logs and displays.
    pub fn name(self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a string is not a known priority.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown priority: {0} (expected high, medium, low or 1-3)")]
pub struct ParsePriorityError(pub String);

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(value) = trimmed.parse::<u8>() {
            return Priority::from_value(value).ok_or_else(|| ParsePriorityError(s.to_string()));
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "high" | "h" => Ok(Priority::High),
            "medium" | "med" | "m" => Ok(Priority::Medium),
            "low" | "l" => Ok(Priority::Low),
            _ => Err(ParsePriorityError(s.to_string())),
        }
    }
}
