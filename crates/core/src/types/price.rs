//! Non-negative decimal prices.
//!
//! Book prices and order totals are stored as `NUMERIC(12, 2)` and carried as
//! [`rust_decimal::Decimal`] so that no float rounding ever touches money.
//! On the wire a price is a plain JSON number (`"price": 19.99`).

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Digits kept after the decimal point by the `NUMERIC(12, 2)` columns.
const PRICE_SCALE: u32 = 2;

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative: {0}")]
    Negative(Decimal),

    /// The amount has more than two fractional digits.
    #[error("price cannot have more than 2 decimal places: {0}")]
    TooPrecise(Decimal),

    /// The amount does not fit in `NUMERIC(12, 2)`.
    #[error("price must be less than 10000000000: {0}")]
    TooLarge(Decimal),
}

/// A monetary amount in `[0, 10^10)` with at most two decimal places.
///
/// ```
/// use bookstore_core::Price;
/// use rust_decimal::Decimal;
///
/// let a = Price::new(Decimal::new(1000, 2)).unwrap();
/// let b = Price::new(Decimal::new(1500, 2)).unwrap();
/// assert_eq!(a.checked_add(b).unwrap().amount(), Decimal::new(2500, 2));
///
/// assert!(Price::new(Decimal::NEGATIVE_ONE).is_err());
/// assert!(Price::new(Decimal::new(9999, 3)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Price(Decimal);

impl Price {
    /// Exclusive upper bound of any price or total.
    pub const LIMIT: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

    /// Create a price from a decimal amount.
    ///
    /// Trailing zeros don't count towards the scale, so `2.500` is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero,
    /// [`PriceError::TooPrecise`] if it has sub-cent digits and
    /// [`PriceError::TooLarge`] if it is `10^10` or more.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        if amount.normalize().scale() > PRICE_SCALE {
            return Err(PriceError::TooPrecise(amount));
        }
        if amount >= Self::LIMIT {
            return Err(PriceError::TooLarge(amount));
        }
        Ok(Self(amount))
    }

    /// The zero price.
    #[must_use]
    pub const fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Build a price from minor units (cents).
    ///
    /// # Errors
    ///
    /// Same as [`Price::new`].
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        Self::new(Decimal::new(cents, PRICE_SCALE))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Add two prices, failing when the result leaves the storable range.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::TooLarge`] if the sum is `10^10` or more.
    pub fn checked_add(self, rhs: Self) -> Result<Self, PriceError> {
        Self::new(self.0 + rhs.0)
    }

    /// Sum a sequence of prices with [`Price::checked_add`].
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::TooLarge`] as soon as the running total overflows.
    pub fn try_sum<I: IntoIterator<Item = Self>>(prices: I) -> Result<Self, PriceError> {
        prices.into_iter().try_fold(Self::zero(), Self::checked_add)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = rust_decimal::serde::float::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
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
    fn test_rejects_negative() {
        assert_eq!(
            Price::new(Decimal::new(-1, 2)),
            Err(PriceError::Negative(Decimal::new(-1, 2)))
        );
    }

    #[test]
    fn test_accepts_zero() {
        assert_eq!(Price::new(Decimal::ZERO).unwrap(), Price::zero());
        assert_eq!(Price::new(Decimal::new(-0, 2)).unwrap(), Price::zero());
    }

    #[test]
    fn test_rejects_sub_cent_digits() {
        assert_eq!(
            Price::new(Decimal::new(9_999, 3)),
            Err(PriceError::TooPrecise(Decimal::new(9_999, 3)))
        );
        assert_eq!(Price::new(Decimal::new(2_500, 3)).unwrap(), Price::from_cents(250).unwrap());
    }

    #[test]
    fn test_upper_bound() {
        assert_eq!(Price::LIMIT, Decimal::from(10_000_000_000_i64));

        let max = Price::new(Decimal::new(999_999_999_999, 2)).unwrap();
        assert_eq!(max.to_string(), "9999999999.99");

        assert_eq!(
            Price::new(Price::LIMIT),
            Err(PriceError::TooLarge(Price::LIMIT))
        );
        assert!(max.checked_add(Price::from_cents(1).unwrap()).is_err());
    }

    #[test]
    fn test_try_sum() {
        let total = Price::try_sum(
            [1000, 1500, 250]
                .into_iter()
                .map(|c| Price::from_cents(c).unwrap()),
        )
        .unwrap();
        assert_eq!(total, Price::from_cents(2750).unwrap());

        assert_eq!(Price::try_sum(std::iter::empty()).unwrap(), Price::zero());
    }

    #[test]
    fn test_display_two_places() {
        assert_eq!(Price::from_cents(1999).unwrap().to_string(), "19.99");
        assert_eq!(Price::new(Decimal::from(199)).unwrap().to_string(), "199.00");
    }

    #[test]
    fn test_json_number() {
        let price = Price::from_cents(1999).unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "19.99");

        let parsed: Price = serde_json::from_str("25").unwrap();
        assert_eq!(parsed.amount(), Decimal::from(25));

        assert!(serde_json::from_str::<Price>("-5").is_err());
        assert!(serde_json::from_str::<Price>("9.999").is_err());
        assert!(serde_json::from_str::<Price>("100000000000.0").is_err());
    }
}
