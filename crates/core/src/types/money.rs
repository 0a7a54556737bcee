//! Fixed-point monetary amounts.
//!
//! All prices and order totals in Bramble are represented as [`Money`], a
//! non-negative `rust_decimal::Decimal` amount in the store currency. Decimal
//! arithmetic keeps line totals exact: summing integer-cent prices never
//! accumulates binary floating-point drift.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Money`] value.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is negative.
    #[error("amount cannot be negative: {0}")]
    Negative(Decimal),
    /// A multiplication overflowed the decimal range.
    #[error("amount overflow")]
    Overflow,
}

/// A non-negative monetary amount in the store currency.
///
/// ## Examples
///
/// ```
/// use bramble_core::Money;
/// use rust_decimal::Decimal;
///
/// let unit = Money::from_cents(1000)?; // 10.00
/// let line = unit.times(2)?;           // 20.00
/// assert_eq!(line.amount(), Decimal::new(2000, 2));
/// # Ok::<(), bramble_core::MoneyError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero in the store currency.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a `Money` value from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create a `Money` value from an amount in minor units (cents).
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] if `cents` is below zero.
    pub fn from_cents(cents: i64) -> Result<Self, MoneyError> {
        Self::new(Decimal::new(cents, 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Multiply a unit price by a quantity, producing a line total.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] if the product exceeds the decimal range.
    pub fn times(self, quantity: u32) -> Result<Self, MoneyError> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .map(Self)
            .ok_or(MoneyError::Overflow)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// SQLx support (with postgres feature): stored as NUMERIC.
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are constrained non-negative by schema checks
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_negative() {
        let result = Money::new(Decimal::new(-1, 2));
        assert!(matches!(result, Err(MoneyError::Negative(_))));
    }

    #[test]
    fn test_new_accepts_zero_and_positive() {
        assert!(Money::new(Decimal::ZERO).is_ok());
        assert!(Money::new(Decimal::new(999, 2)).is_ok());
    }

    #[test]
    fn test_times_exact() {
        // 10.00 * 2 = 20.00, no drift
        let unit = Money::from_cents(1000).unwrap();
        let line = unit.times(2).unwrap();
        assert_eq!(line.amount(), Decimal::new(2000, 2));
    }

    #[test]
    fn test_sum_exact_for_cent_inputs() {
        // 2 x 10.00 + 1 x 5.00 = 25.00 exactly
        let total: Money = [
            Money::from_cents(1000).unwrap().times(2).unwrap(),
            Money::from_cents(500).unwrap(),
        ]
        .into_iter()
        .sum();
        assert_eq!(total.amount(), Decimal::new(2500, 2));
    }

    #[test]
    fn test_sum_of_empty_is_zero() {
        let total: Money = core::iter::empty().sum();
        assert_eq!(total, Money::ZERO);
        assert!(total.is_zero());
    }

    #[test]
    fn test_serde_transparent() {
        let money = Money::from_cents(2500).unwrap();
        let json = serde_json::to_string(&money).unwrap();
        // rust_decimal serializes as a string to preserve exactness
        assert_eq!(json, "\"25.00\"");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, money);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1999).unwrap().to_string(), "19.99");
    }
}
