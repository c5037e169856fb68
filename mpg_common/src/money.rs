use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const MXN_CURRENCY_CODE: &str = "MXN";
pub const MXN_CURRENCY_CODE_LOWER: &str = "mxn";

//--------------------------------------       Money         ---------------------------------------------------------
/// A monetary amount in the settlement currency, stored as integer centavos.
///
/// The payment provider reports amounts as floating-point pesos; [`Money::try_from`] converts them with
/// round-to-nearest-centavo semantics, and [`Money::within_one_peso`] provides the one-unit tolerance used when
/// validating paid amounts against quoted totals.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as centavos: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Money {}

impl TryFrom<f64> for Money {
    type Error = MoneyConversionError;

    fn try_from(pesos: f64) -> Result<Self, Self::Error> {
        if !pesos.is_finite() {
            return Err(MoneyConversionError(format!("{pesos} is not a finite amount")));
        }
        let centavos = (pesos * 100.0).round();
        if centavos.abs() > i64::MAX as f64 {
            return Err(MoneyConversionError(format!("{pesos} is too large to convert to centavos")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(centavos as i64))
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.abs();
        write!(f, "{sign}${}.{:02}", cents / 100, cents % 100)
    }
}

impl Money {
    /// One peso, the fixed tolerance for amount validation.
    pub const ONE_PESO: Money = Money(100);

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_pesos(pesos: i64) -> Self {
        Self(pesos * 100)
    }

    pub fn to_pesos(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// True if the two amounts differ by at most one peso. Absorbs provider-side rounding without accepting
    /// genuinely different amounts.
    pub fn within_one_peso(&self, other: Money) -> bool {
        (self.0 - other.0).abs() <= Self::ONE_PESO.0
    }
}

/// Serialize/deserialize a [`Money`] field as floating-point pesos, the representation used on the wire by the
/// payment provider and the storefront UI.
pub mod serde_pesos {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use super::Money;

    pub fn serialize<S: Serializer>(money: &Money, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_f64(money.to_pesos())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Money, D::Error> {
        let pesos = f64::deserialize(de)?;
        Money::try_from(pesos).map_err(D::Error::custom)
    }

    /// As [`serde_pesos`](self), for `Option<Money>` fields. Combine with `#[serde(default)]` so absent fields
    /// deserialize to `None`.
    pub mod option {
        use serde::{de::Error, Deserialize, Deserializer, Serializer};

        use super::super::Money;

        pub fn serialize<S: Serializer>(money: &Option<Money>, ser: S) -> Result<S::Ok, S::Error> {
            match money {
                Some(m) => ser.serialize_some(&m.to_pesos()),
                None => ser.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Money>, D::Error> {
            Option::<f64>::deserialize(de)?.map(Money::try_from).transpose().map_err(D::Error::custom)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pesos_to_centavos() {
        assert_eq!(Money::from_pesos(1000).value(), 100_000);
        assert_eq!(Money::try_from(1499.99).unwrap().value(), 149_999);
        assert_eq!(Money::try_from(0.015).unwrap().value(), 2);
        assert!(Money::try_from(f64::NAN).is_err());
    }

    #[test]
    fn tolerance_is_one_peso() {
        let quoted = Money::from_pesos(1000);
        assert!(quoted.within_one_peso(Money::from_pesos(1000)));
        assert!(quoted.within_one_peso(Money::from_pesos(1000) + Money::from(100)));
        assert!(quoted.within_one_peso(Money::from_pesos(1000) - Money::from(100)));
        assert!(!quoted.within_one_peso(Money::from_pesos(1000) + Money::from(101)));
        assert!(!quoted.within_one_peso(Money::from_pesos(500)));
    }

    #[test]
    fn display_formats_centavos() {
        assert_eq!(Money::from(123_456).to_string(), "$1234.56");
        assert_eq!(Money::from(-50).to_string(), "-$0.50");
    }
}
