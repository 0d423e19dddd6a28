use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, FromRepr};

use crate::error::{InvalidGradeSnafu, ReviewError};

/// The memory state of one card, owned by the caller. Every review consumes one
/// and produces a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryState {
    /// Days until recall decays to 0.9.
    pub stability: f64,
    pub difficulty: f64,
    /// Days since the last review.
    pub elapsed_days: f64,
    /// Planned interval of the last scheduling decision, if any.
    pub scheduled_days: Option<f64>,
}

impl MemoryState {
    pub fn new(stability: f64, difficulty: f64, elapsed_days: f64) -> Self {
        Self {
            stability,
            difficulty,
            elapsed_days,
            scheduled_days: None,
        }
    }

    pub fn with_scheduled_days(self, scheduled_days: f64) -> Self {
        Self {
            scheduled_days: Some(scheduled_days),
            ..self
        }
    }

    /// The planned interval, ignoring non-positive ones.
    pub(crate) fn schedule(&self) -> Option<f64> {
        self.scheduled_days.filter(|&days| days > 0.0)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumIter,
    FromRepr,
    Serialize,
    Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Grade {
    Again = 1,
    Hard = 2,
    Good = 3,
    Easy = 4,
}

impl Grade {
    pub fn as_f64(self) -> f64 {
        self as u8 as f64
    }
}

impl TryFrom<u8> for Grade {
    type Error = ReviewError;

    fn try_from(grade: u8) -> Result<Self, ReviewError> {
        Grade::from_repr(grade).ok_or_else(|| InvalidGradeSnafu { grade }.build())
    }
}

impl From<Grade> for u8 {
    fn from(grade: Grade) -> Self {
        grade as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_grade_conversion() {
        let grades = (1..=4)
            .map(|g| Grade::try_from(g).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(grades, Grade::iter().collect::<Vec<_>>());
        assert_eq!(
            Grade::try_from(0),
            Err(ReviewError::InvalidGrade { grade: 0 })
        );
        assert_eq!(
            Grade::try_from(5),
            Err(ReviewError::InvalidGrade { grade: 5 })
        );
        assert_eq!(Grade::Hard.to_string(), "Hard");
        assert!(Grade::Again < Grade::Easy);
    }

    #[test]
    fn test_grade_serde() {
        assert_eq!(serde_json::to_string(&Grade::Good).unwrap(), "3");
        assert_eq!(serde_json::from_str::<Grade>("4").unwrap(), Grade::Easy);
        assert!(serde_json::from_str::<Grade>("7").is_err());
    }

    #[test]
    fn test_schedule_ignores_non_positive() {
        let state = MemoryState::new(10.0, 5.0, 3.0);
        assert_eq!(state.schedule(), None);
        assert_eq!(state.with_scheduled_days(0.0).schedule(), None);
        assert_eq!(state.with_scheduled_days(5.0).schedule(), Some(5.0));
    }
}
