//! Exact fractions as stored by camera firmware

use serde::{Deserialize, Serialize};
use std::fmt;

/// A numerator/denominator pair.
///
/// A zero denominator is allowed and means "no value": it converts to `0.0`
/// instead of dividing by zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rational {
    numerator: i64,
    denominator: i64,
}

impl Rational {
    /// Create a fraction from a numerator and denominator
    pub const fn new(numerator: i64, denominator: i64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Create a whole number (denominator 1)
    pub const fn from_integer(numerator: i64) -> Self {
        Self::new(numerator, 1)
    }

    /// Create a fraction from the unsigned pair found in TIFF `RATIONAL` fields
    pub fn from_unsigned(numerator: u32, denominator: u32) -> Self {
        Self::new(i64::from(numerator), i64::from(denominator))
    }

    /// Floating point value, `0.0` when the denominator is zero
    pub fn to_f64(&self) -> f64 {
        if self.denominator == 0 {
            0.0
        } else {
            self.numerator as f64 / self.denominator as f64
        }
    }

    /// Fraction in lowest terms, e.g. `5/15` becomes `1/3`.
    ///
    /// Improper fractions collapse to their integer quotient (`15/4` becomes
    /// `3`).
    pub fn simplify_fraction(&self) -> String {
        if self.numerator > self.denominator {
            return match self.numerator.checked_div(self.denominator) {
                Some(quotient) => quotient.to_string(),
                None => "0".to_string(),
            };
        }

        let gcd = gcd(self.numerator, self.denominator);
        if gcd == 0 {
            return format!("{}/{}", self.numerator, self.denominator);
        }
        format!("{}/{}", self.numerator / gcd, self.denominator / gcd)
    }

    /// Aperture notation: `f/2` for whole values, `f/2.8` otherwise
    pub fn to_f_number(&self) -> String {
        let value = self.to_f64();
        if value % 1.0 > 0.0 {
            format!("f/{:.1}", value)
        } else {
            format!("f/{}", value)
        }
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

impl From<Rational> for f64 {
    fn from(value: Rational) -> Self {
        value.to_f64()
    }
}

/// Iterative Euclid on magnitudes; the result is whichever operand is left
/// non-zero
fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while a != 0 && b != 0 {
        if a > b {
            a %= b;
        } else {
            b %= a;
        }
    }

    i64::try_from(if a == 0 { b } else { a }).unwrap_or(1)
}
