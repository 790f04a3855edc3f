//! Validated shareholding percentages.

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{ser, Deserialize, Serialize, Serializer};

use crate::domain::error::{DomainError, DomainResult};

/// A shareholding percentage in the closed range `[0, 100]`.
///
/// Parsing is plain base-10 decimal; anything else is rejected rather than
/// coerced. Aggregation happens on the inner [`Decimal`] so sums stay exact.
/// On the wire it is a plain JSON/TOML number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "Decimal")]
pub struct Percentage(Decimal);

impl Percentage {
    pub fn new(value: Decimal) -> DomainResult<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(invalid(value.to_string(), "must not be negative"));
        }
        if value > Decimal::ONE_HUNDRED {
            return Err(invalid(value.to_string(), "must not exceed 100"));
        }
        Ok(Self(value.normalize()))
    }

    /// Parse user input. Blank input is an error here; see [`Percentage::parse_optional`].
    pub fn parse(input: &str) -> DomainResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid(input, "a value is required"));
        }
        let value = Decimal::from_str(trimmed).map_err(|e| invalid(input, &e.to_string()))?;
        Self::new(value).map_err(|_| invalid(input, "must be between 0 and 100"))
    }

    /// Parse user input where leaving the field empty means "no percentage".
    pub fn parse_optional(input: &str) -> DomainResult<Option<Self>> {
        if input.trim().is_empty() {
            Ok(None)
        } else {
            Self::parse(input).map(Some)
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Share of `self` applied to `of`, e.g. 50% of 40% = 20%.
    pub fn of(&self, of: Decimal) -> Decimal {
        (of * self.0 / Decimal::ONE_HUNDRED).normalize()
    }
}

fn invalid(input: impl Into<String>, reason: &str) -> DomainError {
    DomainError::InvalidPercentage {
        input: input.into(),
        reason: reason.to_string(),
    }
}

impl TryFrom<Decimal> for Percentage {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.fract().is_zero() {
            if let Some(whole) = self.0.to_u64() {
                return serializer.serialize_u64(whole);
            }
        }
        match self.0.to_f64() {
            Some(value) => serializer.serialize_f64(value),
            None => Err(<S::Error as ser::Error>::custom(format!(
                "percentage {} not representable",
                self.0
            ))),
        }
    }
}

impl FromStr for Percentage {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.0)
    }
}
