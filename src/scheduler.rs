use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use snafu::ensure;

use crate::error::{InvalidParametersSnafu, Result};
use crate::forgetting_curve::ForgettingCurve;
use crate::memory::Grade;
use crate::stability::S_MAX;

pub const DEFAULT_DESIRED_RETENTION: f64 = 0.9;

/// Everything a scheduler may look at. Produced once the stability and recall
/// of a review are final.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleInput {
    pub stability: f64,
    pub elapsed_days: f64,
    pub retrievability: f64,
    pub grade: Grade,
    pub difficulty: f64,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Days until the next review, positive.
    pub interval: f64,
    pub due: DateTime<Utc>,
}

/// Turns a finished review into a due date.
///
/// Implementations must be pure and reentrant: the pipeline calls them once per
/// review, possibly from many threads, and their output never feeds back into
/// stability or recall.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, input: &ScheduleInput) -> Schedule;
}

impl<F> Scheduler for F
where
    F: Fn(&ScheduleInput) -> Schedule + Send + Sync,
{
    fn schedule(&self, input: &ScheduleInput) -> Schedule {
        self(input)
    }
}

/// Schedules the next review for when recall is expected to fall to the
/// desired retention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetentionScheduler {
    curve: ForgettingCurve,
    desired_retention: f64,
    maximum_interval: f64,
}

impl RetentionScheduler {
    pub fn new(curve: ForgettingCurve, desired_retention: f64) -> Result<Self> {
        ensure!(
            desired_retention > 0.0 && desired_retention < 1.0,
            InvalidParametersSnafu {
                reason: format!("desired retention {desired_retention} outside (0, 1)"),
            }
        );
        Ok(Self {
            curve,
            desired_retention,
            maximum_interval: S_MAX,
        })
    }

    /// Targets [`DEFAULT_DESIRED_RETENTION`].
    pub fn from_curve(curve: ForgettingCurve) -> Self {
        Self {
            curve,
            desired_retention: DEFAULT_DESIRED_RETENTION,
            maximum_interval: S_MAX,
        }
    }

    /// Caps intervals at `maximum_interval` days, which must lie in `[1, 36500]`.
    pub fn with_maximum_interval(self, maximum_interval: f64) -> Result<Self> {
        ensure!(
            (1.0..=S_MAX).contains(&maximum_interval),
            InvalidParametersSnafu {
                reason: format!("maximum interval {maximum_interval} outside [1, {S_MAX}]"),
            }
        );
        Ok(Self {
            maximum_interval,
            ..self
        })
    }
}

impl Scheduler for RetentionScheduler {
    fn schedule(&self, input: &ScheduleInput) -> Schedule {
        let interval = self
            .curve
            .next_interval(input.stability, self.desired_retention)
            .round()
            .clamp(1.0, self.maximum_interval);
        Schedule {
            interval,
            due: input.now + Duration::days(interval as i64),
        }
    }
}
