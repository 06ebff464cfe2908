//! Exact decimal numbers within the store's numeric range.
//!
//! A [`Number`] keeps its significant digits and a base-10 exponent, so two
//! numbers compare equal exactly when they denote the same value. The
//! canonical text never uses scientific notation: `1.5E3` renders as `1500`
//! and `-0.000` as `0`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{MapperError, MapperResult};

/// Maximum number of significant digits in a stored number.
pub const MAX_SIGNIFICANT_DIGITS: usize = 38;

/// Largest allowed base-10 magnitude (`9.99..E+125`).
pub const MAX_MAGNITUDE: i64 = 125;

/// Smallest allowed base-10 magnitude (`1E-130`).
pub const MIN_MAGNITUDE: i64 = -130;

/// An exact decimal number.
///
/// Equality, hashing and ordering follow the numeric value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Number {
    negative: bool,
    /// Significant digits without leading or trailing zeros. Empty for zero.
    digits: String,
    /// The value is `digits * 10^exponent`.
    exponent: i64,
}

impl Number {
    /// The number zero.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            negative: false,
            digits: String::new(),
            exponent: 0,
        }
    }

    /// Returns `true` if this number is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.digits.is_empty()
    }

    /// Returns `true` if this number is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Returns `true` if this number has no fractional part.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        self.exponent >= 0
    }

    /// Parse decimal or scientific text.
    ///
    /// Malformed text fails with [`MapperError::TypeMismatch`]; text outside
    /// the digit or magnitude limits fails with [`MapperError::PrecisionLoss`].
    pub fn parse(text: &str) -> MapperResult<Self> {
        let malformed = || MapperError::type_mismatch("number", format!("'{text}'"));

        if text.is_empty() || text != text.trim() {
            return Err(malformed());
        }
        let (negative, rest) = match text.as_bytes()[0] {
            b'-' => (true, &text[1..]),
            b'+' => (false, &text[1..]),
            _ => (false, text),
        };

        // A well-formed exponent too large for `i64` is out of range, not
        // malformed, unless the mantissa is zero.
        let (mantissa, explicit_exp) = match rest.find(['e', 'E']) {
            Some(pos) => {
                let exp_text = &rest[pos + 1..];
                let exp_digits = exp_text.strip_prefix(['+', '-']).unwrap_or(exp_text);
                if exp_digits.is_empty() || !exp_digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(malformed());
                }
                (&rest[..pos], exp_text.parse::<i64>().ok())
            }
            None => (rest, Some(0)),
        };

        let (int_part, frac_part) = match mantissa.split_once('.') {
            Some((i, f)) => (i, f),
            None => (mantissa, ""),
        };
        let all_digits = || int_part.bytes().chain(frac_part.bytes());
        if int_part.len() + frac_part.len() == 0 || !all_digits().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }

        let joined: String = all_digits().map(char::from).collect();
        let trimmed_leading = joined.trim_start_matches('0');
        let significant = trimmed_leading.trim_end_matches('0');
        if significant.is_empty() {
            return Ok(Self::zero());
        }
        if significant.len() > MAX_SIGNIFICANT_DIGITS {
            return Err(MapperError::precision_loss(
                text,
                format!("a number with at most {MAX_SIGNIFICANT_DIGITS} significant digits"),
            ));
        }

        let explicit_exp = explicit_exp.ok_or_else(|| out_of_range(text))?;
        let trailing_zeros = trimmed_leading.len() - significant.len();
        #[allow(clippy::cast_possible_wrap)]
        let exponent = explicit_exp
            .checked_sub(frac_part.len() as i64)
            .and_then(|e| e.checked_add(trailing_zeros as i64))
            .ok_or_else(|| out_of_range(text))?;

        let number = Self {
            negative,
            digits: significant.to_owned(),
            exponent,
        };
        let magnitude = number.magnitude();
        if !(MIN_MAGNITUDE..=MAX_MAGNITUDE).contains(&magnitude) {
            return Err(out_of_range(text));
        }
        Ok(number)
    }

    /// Convert to `i64`, failing with [`MapperError::PrecisionLoss`] when the
    /// number has a fraction or does not fit.
    pub fn to_i64(&self) -> MapperResult<i64> {
        let lossy = || MapperError::precision_loss(self.to_string(), "Integer");
        if self.is_zero() {
            return Ok(0);
        }
        if !self.is_integer() || self.magnitude() > 18 {
            return Err(lossy());
        }
        self.to_string().parse().map_err(|_| lossy())
    }

    /// Convert to `f64`, failing with [`MapperError::PrecisionLoss`] unless the
    /// conversion is exact in both directions.
    pub fn to_f64(&self) -> MapperResult<f64> {
        let lossy = || MapperError::precision_loss(self.to_string(), "Float");
        let float: f64 = self.to_string().parse().map_err(|_| lossy())?;
        match Self::try_from(float) {
            Ok(back) if back == *self => Ok(float),
            _ => Err(lossy()),
        }
    }

    /// Base-10 exponent of the leading digit (`123` has magnitude 2).
    #[allow(clippy::cast_possible_wrap)]
    fn magnitude(&self) -> i64 {
        self.exponent + self.digits.len() as i64 - 1
    }

    fn from_unsigned(negative: bool, mut abs: u128) -> Self {
        if abs == 0 {
            return Self::zero();
        }
        let mut exponent = 0;
        while abs % 10 == 0 {
            abs /= 10;
            exponent += 1;
        }
        Self {
            negative,
            digits: abs.to_string(),
            exponent,
        }
    }

    fn cmp_magnitude(&self, other: &Self) -> Ordering {
        self.magnitude()
            .cmp(&other.magnitude())
            // Same leading position: digit strings compare lexicographically.
            .then_with(|| self.digits.cmp(&other.digits))
    }
}

fn out_of_range(text: &str) -> MapperError {
    MapperError::precision_loss(
        text,
        format!("a number with magnitude between 1E{MIN_MAGNITUDE} and 1E{MAX_MAGNITUDE}"),
    )
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }
        if self.negative {
            f.write_str("-")?;
        }
        if self.exponent >= 0 {
            f.write_str(&self.digits)?;
            for _ in 0..self.exponent {
                f.write_str("0")?;
            }
            return Ok(());
        }
        #[allow(clippy::cast_possible_wrap)]
        let point = self.digits.len() as i64 + self.exponent;
        if point > 0 {
            #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            let (int, frac) = self.digits.split_at(point as usize);
            write!(f, "{int}.{frac}")
        } else {
            f.write_str("0.")?;
            for _ in 0..-point {
                f.write_str("0")?;
            }
            f.write_str(&self.digits)
        }
    }
}

impl FromStr for Number {
    type Err = MapperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        let sign = |n: &Self| match (n.is_zero(), n.negative) {
            (true, _) => 0,
            (false, true) => -1,
            (false, false) => 1,
        };
        match sign(self).cmp(&sign(other)) {
            Ordering::Equal if self.is_zero() => Ordering::Equal,
            Ordering::Equal if self.negative => other.cmp_magnitude(self),
            Ordering::Equal => self.cmp_magnitude(other),
            unequal => unequal,
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {$(
        impl From<$t> for Number {
            fn from(v: $t) -> Self {
                Self::from_unsigned(v < 0, u128::from(v.unsigned_abs()))
            }
        }
    )*};
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {$(
        impl From<$t> for Number {
            fn from(v: $t) -> Self {
                Self::from_unsigned(false, u128::from(v))
            }
        }
    )*};
}

impl_from_signed!(i8, i16, i32, i64);
impl_from_unsigned!(u8, u16, u32, u64);

impl From<isize> for Number {
    #[allow(clippy::cast_possible_truncation)]
    fn from(v: isize) -> Self {
        Self::from(v as i64)
    }
}

impl From<usize> for Number {
    #[allow(clippy::cast_possible_truncation)]
    fn from(v: usize) -> Self {
        Self::from(v as u64)
    }
}

impl TryFrom<i128> for Number {
    type Error = MapperError;

    fn try_from(v: i128) -> Result<Self, Self::Error> {
        Self::parse(&v.to_string())
    }
}

impl TryFrom<u128> for Number {
    type Error = MapperError;

    fn try_from(v: u128) -> Result<Self, Self::Error> {
        Self::parse(&v.to_string())
    }
}

impl TryFrom<f64> for Number {
    type Error = MapperError;

    /// Uses the shortest text that round-trips to the same `f64`.
    fn try_from(v: f64) -> Result<Self, Self::Error> {
        if !v.is_finite() {
            return Err(MapperError::type_mismatch("finite number", v.to_string()));
        }
        Self::parse(&v.to_string())
    }
}

impl TryFrom<f32> for Number {
    type Error = MapperError;

    fn try_from(v: f32) -> Result<Self, Self::Error> {
        if !v.is_finite() {
            return Err(MapperError::type_mismatch("finite number", v.to_string()));
        }
        Self::parse(&v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use proptest::proptest;

    use super::*;

    #[test]
    fn test_should_render_canonical_text() {
        let cases = [
            ("42", "42"),
            ("+42", "42"),
            ("-0.000", "0"),
            ("1.50", "1.5"),
            ("1.5E3", "1500"),
            ("12e-4", "0.0012"),
            ("000123.4500", "123.45"),
            ("-7.25e1", "-72.5"),
        ];
        for (input, expected) in cases {
            assert_eq!(Number::parse(input).unwrap().to_string(), expected, "{input}");
        }
    }

    #[test]
    fn test_should_reject_malformed_text() {
        for input in ["", " 1", "1 ", "abc", "1.2.3", "--1", "1e", "e5", ".", "NaN", "Infinity"] {
            let err = Number::parse(input).unwrap_err();
            assert!(matches!(err, MapperError::TypeMismatch { .. }), "{input}");
        }
    }

    #[test]
    fn test_should_enforce_digit_and_magnitude_limits() {
        let thirty_nine = "1".repeat(39);
        assert!(matches!(
            Number::parse(&thirty_nine),
            Err(MapperError::PrecisionLoss { .. })
        ));
        assert!(Number::parse(&"1".repeat(38)).is_ok());
        assert!(Number::parse("9.9999999999999999999999999999999999999E+125").is_ok());
        assert!(matches!(
            Number::parse("1E126"),
            Err(MapperError::PrecisionLoss { .. })
        ));
        assert!(Number::parse("1E-130").is_ok());
        assert!(matches!(
            Number::parse("1E-131"),
            Err(MapperError::PrecisionLoss { .. })
        ));
        assert!(Number::parse("0E999").is_ok());
    }

    #[test]
    fn test_should_treat_exponent_overflow_as_out_of_range() {
        for input in ["1e99999999999999999999", "-2.5E-99999999999999999999", "1e400"] {
            let err = Number::parse(input).unwrap_err();
            assert!(matches!(err, MapperError::PrecisionLoss { .. }), "{input}");
        }
        assert!(Number::parse("0e99999999999999999999").unwrap().is_zero());
        assert!(matches!(
            Number::parse("1e+-5"),
            Err(MapperError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_should_compare_numerically() {
        let n = |s: &str| Number::parse(s).unwrap();
        assert!(n("-10") < n("-2"));
        assert!(n("-2") < n("0"));
        assert!(n("0") < n("0.001"));
        assert!(n("9") < n("10"));
        assert!(n("1.2") < n("1.23"));
        assert_eq!(n("1.0"), n("1"));
        assert_eq!(n("100"), Number::from(100_u8));
    }

    #[test]
    fn test_should_convert_integers_exactly() {
        assert_eq!(Number::from(i64::MIN).to_string(), i64::MIN.to_string());
        assert_eq!(Number::from(u64::MAX).to_string(), u64::MAX.to_string());
        assert_eq!(Number::from(-1200_i32).to_string(), "-1200");
        assert!(Number::try_from(u128::MAX).is_err());
        assert_eq!(Number::from(i64::MAX).to_i64().unwrap(), i64::MAX);
    }

    #[test]
    fn test_should_detect_integer_precision_loss() {
        let n = |s: &str| Number::parse(s).unwrap();
        assert!(matches!(n("1.5").to_i64(), Err(MapperError::PrecisionLoss { .. })));
        assert!(matches!(
            n("9223372036854775808").to_i64(),
            Err(MapperError::PrecisionLoss { .. })
        ));
        assert_eq!(n("-3E2").to_i64().unwrap(), -300);
    }

    #[test]
    fn test_should_detect_float_precision_loss() {
        assert!((Number::parse("0.1").unwrap().to_f64().unwrap() - 0.1).abs() < f64::EPSILON);
        assert!(matches!(
            Number::parse("0.10000000000000000000001").unwrap().to_f64(),
            Err(MapperError::PrecisionLoss { .. })
        ));
    }

    #[test]
    fn test_should_reject_non_finite_floats() {
        assert!(matches!(
            Number::try_from(f64::NAN),
            Err(MapperError::TypeMismatch { .. })
        ));
        assert!(Number::try_from(f64::INFINITY).is_err());
        assert_eq!(Number::try_from(-0.0_f64).unwrap(), Number::zero());
    }

    proptest! {
        #[test]
        fn test_should_roundtrip_canonical_text(v in proptest::num::i64::ANY, scale in 0u32..20) {
            let text = if scale == 0 {
                v.to_string()
            } else {
                format!("{v}e-{scale}")
            };
            let parsed = Number::parse(&text).unwrap();
            let reparsed = Number::parse(&parsed.to_string()).unwrap();
            assert_eq!(parsed, reparsed);
        }

        #[test]
        fn test_should_roundtrip_finite_floats(v in proptest::num::f64::NORMAL) {
            if let Ok(n) = Number::try_from(v) {
                assert_eq!(n.to_f64().unwrap().to_bits(), (v + 0.0).to_bits());
            }
        }
    }
}
