use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_STORED_RATING: u8 = 0;
pub const MIN_PLAY_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RatingError {
    #[error("Rating {value} is outside {min}..={max}")]
    OutOfRange { value: i64, min: u8, max: u8 },
}

/// A single play score. Ledger files may hold `0`, new plays start at `1`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Debug)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub fn value(self) -> u8 {
        self.0
    }

    /// Validates a rating submitted with a new play.
    pub fn for_play(value: i64) -> Result<Rating, RatingError> {
        if (MIN_PLAY_RATING as i64..=MAX_RATING as i64).contains(&value) {
            Ok(Rating(value as u8))
        } else {
            Err(RatingError::OutOfRange {
                value,
                min: MIN_PLAY_RATING,
                max: MAX_RATING,
            })
        }
    }
}

impl TryFrom<u8> for Rating {
    type Error = RatingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (MIN_STORED_RATING..=MAX_RATING).contains(&value) {
            Ok(Rating(value))
        } else {
            Err(RatingError::OutOfRange {
                value: value as i64,
                min: MIN_STORED_RATING,
                max: MAX_RATING,
            })
        }
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Play {
    pub timestamp: i64,
    pub rating: Rating,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct PlayedTrack {
    #[serde(rename = "path")]
    pub relative_path: String,
    pub plays: Vec<Play>,
}

impl PlayedTrack {
    /// Mean of every play's rating, `0` included.
    pub fn rating(&self) -> Option<f64> {
        if self.plays.is_empty() {
            return None;
        }
        let total: u64 = self.plays.iter().map(|p| p.rating.value() as u64).sum();
        Some(total as f64 / self.plays.len() as f64)
    }
}
