//! Confidence grading shared by every estimation step.

use serde::{Deserialize, Serialize};

/// Confidence in an estimate or one of its parts.
///
/// Ordered so callers can gate on `confidence >= Confidence::Medium`. Any
/// validated-but-out-of-range model field or parse fallback forces `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Combine: a chain is only as confident as its weakest step.
    pub fn min_with(self, other: Confidence) -> Confidence {
        self.min(other)
    }

    /// Cap at `ceiling` (e.g. a clamped price caps at Medium).
    pub fn capped_at(self, ceiling: Confidence) -> Confidence {
        self.min(ceiling)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }

    /// Parse the snake_case label as emitted by models.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "low" => Some(Confidence::Low),
            "medium" => Some(Confidence::Medium),
            "high" => Some(Confidence::High),
            _ => None,
        }
    }
}
