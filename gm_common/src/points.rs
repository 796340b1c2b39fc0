use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// Number of fixed-point units in one whole loyalty point.
pub const POINTS_SCALE: i64 = 100;

// More trailing zeros than this cannot fit in an i64 anyway.
const MAX_PADDING: usize = 20;

//--------------------------------------       Points        ---------------------------------------------------------
/// A quantity of loyalty points, stored as hundredths of a point so that balance arithmetic is exact.
///
/// Decimal values only exist at the edges of the system (the accrual service's JSON and operator output). Everything
/// in between, and in particular everything that touches the ledger, works on the scaled integer.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Points(i64);

op!(binary Points, Add, add);
op!(binary Points, Sub, sub);
op!(inplace Points, AddAssign, add_assign);
op!(inplace Points, SubAssign, sub_assign);
op!(unary Points, Neg, neg);

impl Sum for Points {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Value cannot be represented as loyalty points: {0}")]
pub struct PointsConversionError(String);

impl From<i64> for Points {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for Points {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = POINTS_SCALE.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / scale, abs % scale)
    }
}

impl FromStr for Points {
    type Err = PointsConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_decimal_str(s)
    }
}

impl Points {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Parses a plain decimal literal (`"500"`, `"500.5"`, `"-0.29"`). Digits beyond the second decimal place are
    /// truncated toward zero. Exponent notation is accepted, since that is how `f64` renders very small or very large
    /// values.
    pub fn from_decimal_str(s: &str) -> Result<Self, PointsConversionError> {
        let s = s.trim();
        let err = || PointsConversionError(s.to_string());
        let (negative, unsigned) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
            Some((m, e)) => (m, e.parse::<i32>().map_err(|_| err())?),
            None => (unsigned, 0),
        };
        let (whole, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(err());
        }
        if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        // Shift the decimal point so that exactly two fractional digits remain, then drop the rest.
        let digits = format!("{whole}{frac}");
        let point = i64::try_from(whole.len()).map_err(|_| err())? + i64::from(exponent) + 2;
        let scaled = match usize::try_from(point) {
            Err(_) | Ok(0) => String::new(),
            Ok(p) if p <= digits.len() => digits[..p].to_string(),
            Ok(p) if p - digits.len() <= MAX_PADDING => format!("{digits}{}", "0".repeat(p - digits.len())),
            Ok(_) => return Err(err()),
        };
        let scaled = scaled.trim_start_matches('0');
        let value = if scaled.is_empty() { 0 } else { scaled.parse::<i64>().map_err(|_| err())? };
        Ok(Self(if negative { -value } else { value }))
    }

    /// Converts a floating point amount (as found on the wire) into fixed-point points.
    ///
    /// The float is rendered using its shortest round-trip representation first, so `0.29` becomes 29 hundredths
    /// rather than the 28 that a naive `(x * 100.0) as i64` would produce.
    pub fn try_from_f64(value: f64) -> Result<Self, PointsConversionError> {
        if !value.is_finite() {
            return Err(PointsConversionError(value.to_string()));
        }
        Self::from_decimal_str(&value.to_string())
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / POINTS_SCALE as f64
    }
}
