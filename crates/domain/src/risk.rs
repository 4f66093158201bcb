//! Risk classification for orders.

use serde::{Deserialize, Serialize};

/// Risk classification assigned by the risk-analysis service.
///
/// Starts at `Pending` and moves to `Low` or `High` through the risk
/// use case; it never reverts to `Pending` once classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// Order considered safe; automated processing may continue.
    Low,

    /// Possible fraud indicators; requires manual review.
    High,

    /// Analysis not yet performed or not yet concluded.
    #[default]
    Pending,
}

impl RiskLevel {
    /// Returns the classification name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::High => "HIGH",
            RiskLevel::Pending => "PENDING",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_pending() {
        assert_eq!(RiskLevel::default(), RiskLevel::Pending);
    }

    #[test]
    fn test_serialization() {
        assert_eq!(serde_json::to_string(&RiskLevel::Low).unwrap(), "\"LOW\"");
        assert_eq!(serde_json::to_string(&RiskLevel::High).unwrap(), "\"HIGH\"");
        assert_eq!(
            serde_json::to_string(&RiskLevel::Pending).unwrap(),
            "\"PENDING\""
        );
    }
}
