//! Rating type
//!
//! Domain primitive for testimonial ratings with business rule validation.
//! All ratings are validated at construction time, ensuring invalid values
//! cannot exist in the system.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Highest rating a client can give
const MAX_RATING: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Maximum decimal places (1)
const MAX_SCALE: u32 = 1;

/// Rating represents a validated testimonial score.
///
/// # Invariants
/// - Value is within [0, 5]
/// - At most 1 decimal place
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use agency_site::domain::Rating;
///
/// let rating = Rating::new(Decimal::new(45, 1)).unwrap();
/// assert_eq!(rating.to_string(), "4.5");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Rating(Decimal);

/// Errors that can occur when creating a Rating
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RatingError {
    #[error("Rating must be between 0 and 5 (got {0})")]
    OutOfRange(Decimal),

    #[error("Rating has too many decimal places (max {MAX_SCALE}, got {0})")]
    TooManyDecimals(u32),

    #[error("Invalid rating format: {0}")]
    ParseError(String),
}

impl Rating {
    /// Create a new Rating with validation.
    ///
    /// # Errors
    /// - `RatingError::OutOfRange` if value < 0 or value > 5
    /// - `RatingError::TooManyDecimals` if more than 1 decimal place
    pub fn new(value: Decimal) -> Result<Self, RatingError> {
        if value < Decimal::ZERO || value > MAX_RATING {
            return Err(RatingError::OutOfRange(value));
        }

        // Trailing zeros ("4.50") are not extra precision
        let value = value.normalize();
        if value.scale() > MAX_SCALE {
            return Err(RatingError::TooManyDecimals(value.scale()));
        }

        Ok(Self(value))
    }

    /// Get the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Histogram bucket for this rating: 0 for `<= 1`, then one bucket per
    /// half-open interval `(n, n + 1]` up to 4 for `(4, 5]`.
    pub fn bucket(&self) -> usize {
        let mut bucket = 0;
        for upper in 1..5u8 {
            if self.0 > Decimal::from(upper) {
                bucket = upper as usize;
            }
        }
        bucket
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

impl FromStr for Rating {
    type Err = RatingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal =
            Decimal::from_str(s).map_err(|e| RatingError::ParseError(e.to_string()))?;
        Rating::new(decimal)
    }
}

impl TryFrom<Decimal> for Rating {
    type Error = RatingError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Rating::new(value)
    }
}

impl From<Rating> for Decimal {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds_accepted() {
        assert!(Rating::new(Decimal::ZERO).is_ok());
        assert!(Rating::new(Decimal::new(5, 0)).is_ok());
        assert!(Rating::new(Decimal::new(25, 1)).is_ok());
    }

    #[test]
    fn test_rating_negative_rejected() {
        let rating = Rating::new(Decimal::new(-1, 1));
        assert!(matches!(rating, Err(RatingError::OutOfRange(_))));
    }

    #[test]
    fn test_rating_above_five_rejected() {
        let rating = Rating::new(Decimal::new(51, 1));
        assert!(matches!(rating, Err(RatingError::OutOfRange(_))));
    }

    #[test]
    fn test_rating_too_many_decimals() {
        let rating = Rating::new(Decimal::new(425, 2));
        assert!(matches!(rating, Err(RatingError::TooManyDecimals(2))));
    }

    #[test]
    fn test_rating_trailing_zero_ok() {
        let rating = Rating::new(Decimal::new(450, 2)).unwrap();
        assert_eq!(rating.value(), Decimal::new(45, 1));
    }

    #[test]
    fn test_rating_buckets() {
        let bucket = |s: &str| s.parse::<Rating>().unwrap().bucket();
        assert_eq!(bucket("0"), 0);
        assert_eq!(bucket("1"), 0);
        assert_eq!(bucket("1.1"), 1);
        assert_eq!(bucket("2"), 1);
        assert_eq!(bucket("2.5"), 2);
        assert_eq!(bucket("3"), 2);
        assert_eq!(bucket("4"), 3);
        assert_eq!(bucket("4.1"), 4);
        assert_eq!(bucket("5"), 4);
    }

    #[test]
    fn test_rating_display() {
        assert_eq!("4".parse::<Rating>().unwrap().to_string(), "4.0");
        assert_eq!("2.5".parse::<Rating>().unwrap().to_string(), "2.5");
    }
}
