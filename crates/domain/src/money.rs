//! Monetary value objects.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// ISO-style three-letter currency code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency([u8; 3]);

impl Currency {
    /// Default currency for order amounts.
    pub const BRL: Currency = Currency(*b"BRL");
    pub const USD: Currency = Currency(*b"USD");

    /// Parses a three-letter uppercase ASCII currency code.
    pub fn parse(code: &str) -> Result<Self, DomainError> {
        let bytes = code.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(|b| b.is_ascii_uppercase()) {
            return Err(DomainError::InvalidCurrency(code.to_string()));
        }
        Ok(Currency([bytes[0], bytes[1], bytes[2]]))
    }

    /// Returns the currency code as a string slice.
    pub fn as_str(&self) -> &str {
        // Construction guarantees ASCII uppercase.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::BRL
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for Currency {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Currency::parse(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.as_str().to_string()
    }
}

/// A non-negative monetary amount with two-decimal precision.
///
/// Stored in minor units (cents) to avoid floating point issues.
/// Arithmetic requires matching currencies and forbids negative results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    cents: i64,
    currency: Currency,
}

impl Money {
    /// Creates an amount from minor units (cents).
    pub fn from_cents(cents: i64, currency: Currency) -> Result<Self, DomainError> {
        if cents < 0 {
            return Err(DomainError::NegativeAmount);
        }
        Ok(Self { cents, currency })
    }

    /// Returns zero in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self { cents: 0, currency }
    }

    /// Parses a decimal string such as `"10.50"`, rounding half-up
    /// to two decimal places.
    pub fn parse(amount: &str, currency: Currency) -> Result<Self, DomainError> {
        let invalid = || DomainError::InvalidAmount(amount.to_string());

        let (int_part, frac_part) = match amount.split_once('.') {
            Some((i, f)) => (i, f),
            None => (amount, ""),
        };
        if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if !frac_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let units: i64 = int_part.parse().map_err(|_| invalid())?;
        let mut digits = frac_part.bytes().map(|b| i64::from(b - b'0'));
        let tenths = digits.next().unwrap_or(0);
        let hundredths = digits.next().unwrap_or(0);
        // Half-up rounding on the third decimal digit.
        let round_up = digits.next().is_some_and(|d| d >= 5);

        let cents = units * 100 + tenths * 10 + hundredths + i64::from(round_up);
        Money::from_cents(cents, currency)
    }

    /// Returns the amount in minor units (cents).
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the currency of this amount.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Adds another amount of the same currency.
    pub fn add(&self, other: Money) -> Result<Money, DomainError> {
        self.check_currency(other)?;
        Money::from_cents(self.cents + other.cents, self.currency)
    }

    /// Subtracts another amount of the same currency; the result may not
    /// be negative.
    pub fn subtract(&self, other: Money) -> Result<Money, DomainError> {
        self.check_currency(other)?;
        Money::from_cents(self.cents - other.cents, self.currency)
    }

    /// Multiplies the amount by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            cents: self.cents * i64::from(quantity),
            currency: self.currency,
        }
    }

    /// Returns true if this amount is greater than the other.
    pub fn is_greater_than(&self, other: Money) -> Result<bool, DomainError> {
        self.check_currency(other)?;
        Ok(self.cents > other.cents)
    }

    fn check_currency(&self, other: Money) -> Result<(), DomainError> {
        if self.currency != other.currency {
            return Err(DomainError::CurrencyMismatch {
                left: self.currency,
                right: other.currency,
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}.{:02}",
            self.currency,
            self.cents / 100,
            self.cents % 100
        )
    }
}
