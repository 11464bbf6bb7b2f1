//! Fixed-point decimal types for prices and quantities
//!
//! Uses rust_decimal for deterministic arithmetic (no floating-point errors).
//! Every value that takes part in an equality or conservation check
//! (price-level bucketing, `original = filled + remaining`) goes through
//! these types, never through `f64`.

use std::fmt;
use std::ops::Add;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::NumericError;

/// Upper bound, in whole units, for admitted prices and quantities
const MAX_ADMISSIBLE: u64 = 1_000_000_000_000;

fn parse_decimal(s: &str) -> Result<Decimal, NumericError> {
    Decimal::from_str(s).map_err(|_| NumericError::Parse(s.to_string()))
}

/// Limit price of an order. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Create a price, rejecting zero and negative values
    pub fn try_new(value: Decimal) -> Result<Self, NumericError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(NumericError::NonPositivePrice(value.to_string()))
        }
    }

    /// Create a whole-unit price
    ///
    /// # Panics
    /// Panics on zero
    pub fn from_u64(value: u64) -> Self {
        assert!(value > 0, "Price must be positive");
        Self(Decimal::from(value))
    }

    /// Largest price an order may be admitted with
    ///
    /// Together with `Quantity::max_admissible` this keeps every notional
    /// and every per-level aggregate far inside `Decimal`'s range.
    pub fn max_admissible() -> Decimal {
        Decimal::from(MAX_ADMISSIBLE)
    }

    pub fn is_admissible(&self) -> bool {
        self.0 <= Self::max_admissible()
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

/// Parses a decimal string such as `"3000.50"`
impl FromStr for Price {
    type Err = NumericError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_new(parse_decimal(s)?)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = NumericError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// Order or fill quantity. Never negative; zero only for exhausted orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Quantity(Decimal);

impl Quantity {
    /// Create a quantity, rejecting negative values
    pub fn try_new(value: Decimal) -> Result<Self, NumericError> {
        if value >= Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(NumericError::NegativeQuantity(value.to_string()))
        }
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    /// Largest quantity an order may be admitted with
    pub fn max_admissible() -> Decimal {
        Decimal::from(MAX_ADMISSIBLE)
    }

    pub fn is_admissible(&self) -> bool {
        self.0 <= Self::max_admissible()
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Subtract, returning `None` if the result would be negative
    pub fn checked_sub(self, rhs: Quantity) -> Option<Quantity> {
        let value = self.0.checked_sub(rhs.0)?;
        Self::try_new(value).ok()
    }

    /// Add, returning `None` on decimal overflow
    pub fn checked_add(self, rhs: Quantity) -> Option<Quantity> {
        self.0.checked_add(rhs.0).map(Quantity)
    }
}

// Overflow panics; sums of admissible quantities never get there.
impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Quantity {
        match self.checked_add(rhs) {
            Some(sum) => sum,
            None => panic!("Quantity overflow: {} + {}", self, rhs),
        }
    }
}

impl std::iter::Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Quantity {
        iter.fold(Quantity::zero(), |acc, q| acc + q)
    }
}

impl FromStr for Quantity {
    type Err = NumericError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_new(parse_decimal(s)?)
    }
}

impl TryFrom<Decimal> for Quantity {
    type Error = NumericError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<Quantity> for Decimal {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}
