//! Human-facing order numbers.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

const PREFIX: &str = "ORD-";

/// Human-facing order number in the `ORD-<digits>` format.
///
/// Immutable once generated; the numeric suffix comes from a
/// monotonic-enough source (timestamp in milliseconds).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Validates and wraps an existing order number string.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let suffix = value
            .strip_prefix(PREFIX)
            .ok_or_else(|| DomainError::InvalidOrderNumber(value.to_string()))?;
        if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::InvalidOrderNumber(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    /// Generates a new order number from the current timestamp.
    pub fn generate() -> Self {
        Self(format!("{PREFIX}{}", Utc::now().timestamp_millis()))
    }

    /// Generates an order number with an explicit numeric suffix.
    pub fn from_suffix(suffix: u64) -> Self {
        Self(format!("{PREFIX}{suffix}"))
    }

    /// Returns the order number string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the numeric suffix.
    pub fn numeric_suffix(&self) -> u64 {
        // Valid by construction.
        self.0[PREFIX.len()..].parse().unwrap_or(0)
    }
}

impl std::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        OrderNumber::parse(&value)
    }
}

impl From<OrderNumber> for String {
    fn from(number: OrderNumber) -> Self {
        number.0
    }
}
