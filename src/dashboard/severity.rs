//! Event-type severity classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse severity tier used for marker colors and status filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    Warning,
    #[default]
    Normal,
}

/// Event types that map to a non-normal tier. Anything else is `Normal`.
const SEVERITY_TABLE: &[(&str, Severity)] = &[
    ("Speeding Detected", Severity::Critical),
    ("Micro-sleep", Severity::Critical),
    ("Sleep", Severity::Critical),
    ("Yawning duration", Severity::Warning),
    ("Distraction", Severity::Warning),
];

/// Classify a raw event-type string.
///
/// Total over all inputs: unknown strings (including "Start Device") are `Normal`.
/// If the table ever carries a duplicate key, the last entry wins.
pub fn classify(event_type: &str) -> Severity {
    SEVERITY_TABLE
        .iter()
        .rev()
        .find(|(name, _)| *name == event_type)
        .map(|(_, severity)| *severity)
        .unwrap_or(Severity::Normal)
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::Warning => "Warning",
            Severity::Normal => "Normal",
        }
    }

    /// Parse a driver status tag. Unrecognized tags are treated as `Normal`.
    pub fn from_status(status: &str) -> Self {
        match status {
            "Critical" => Severity::Critical,
            "Warning" => Severity::Warning,
            _ => Severity::Normal,
        }
    }

    /// Marker color used by the map client.
    pub fn color(&self) -> &'static str {
        match self {
            Severity::Critical => "#f87171",
            Severity::Warning => "#facc15",
            Severity::Normal => "#34d399",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_table() {
        assert_eq!(classify("Speeding Detected"), Severity::Critical);
        assert_eq!(classify("Micro-sleep"), Severity::Critical);
        assert_eq!(classify("Sleep"), Severity::Critical);
        assert_eq!(classify("Yawning duration"), Severity::Warning);
        assert_eq!(classify("Distraction"), Severity::Warning);
    }

    #[test]
    fn test_classify_unknown_is_normal() {
        assert_eq!(classify("Start Device"), Severity::Normal);
        assert_eq!(classify("unknown-garbage"), Severity::Normal);
        assert_eq!(classify(""), Severity::Normal);
        // Matching is exact, not case-insensitive
        assert_eq!(classify("sleep"), Severity::Normal);
    }

    #[test]
    fn test_from_status() {
        assert_eq!(Severity::from_status("Critical"), Severity::Critical);
        assert_eq!(Severity::from_status("Warning"), Severity::Warning);
        assert_eq!(Severity::from_status("Sleep"), Severity::Normal);
    }
}
