use snafu::ensure;

use crate::error::{InvalidInputSnafu, Result, ensure_finite, ensure_unit};
use crate::memory::Grade;
use crate::parameters::ParameterVector;
use crate::stability::{S_MAX, S_MIN, recall_stability};

const DELAY_PENALTY_EXPONENT: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilityUpdateInput {
    pub stability: f64,
    pub retrievability: f64,
    pub grade: Grade,
    pub difficulty: f64,
    pub scheduled_days: Option<f64>,
    pub actual_days: Option<f64>,
    pub context_multiplier: f64,
    pub session_momentum: f64,
}

impl StabilityUpdateInput {
    pub fn new(stability: f64, retrievability: f64, grade: Grade, difficulty: f64) -> Self {
        Self {
            stability,
            retrievability,
            grade,
            difficulty,
            scheduled_days: None,
            actual_days: None,
            context_multiplier: 1.0,
            session_momentum: 1.0,
        }
    }

    pub fn with_delay(self, scheduled_days: f64, actual_days: f64) -> Self {
        Self {
            scheduled_days: Some(scheduled_days),
            actual_days: Some(actual_days),
            ..self
        }
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.stability.is_finite() && self.stability > 0.0,
            InvalidInputSnafu {
                field: "stability",
                value: self.stability,
            }
        );
        ensure_unit("retrievability", self.retrievability)?;
        ensure_finite("difficulty", self.difficulty)?;
        for (field, value) in [
            ("context_multiplier", self.context_multiplier),
            ("session_momentum", self.session_momentum),
        ] {
            ensure!(
                value.is_finite() && value > 0.0,
                InvalidInputSnafu { field, value }
            );
        }
        if let Some(days) = self.scheduled_days {
            ensure_finite("scheduled_days", days)?;
        }
        if let Some(days) = self.actual_days {
            ensure_finite("actual_days", days)?;
        }
        Ok(())
    }

    /// `(actual / scheduled)^0.8` for overdue reviews, otherwise 1.
    fn delay_penalty(&self) -> f64 {
        match (self.scheduled_days, self.actual_days) {
            (Some(scheduled), Some(actual)) if scheduled > 0.0 && actual > scheduled => {
                (actual / scheduled).powf(DELAY_PENALTY_EXPONENT)
            }
            _ => 1.0,
        }
    }
}

/// Post-review stability, penalised for overdue reviews and bounded to
/// `[0.1, 36500]` days.
///
/// Every grade, `Again` included, goes through the recall branch.
pub fn update_stability_tensor(w: &ParameterVector, input: &StabilityUpdateInput) -> Result<f64> {
    input.validate()?;
    let base = recall_stability(
        w,
        input.difficulty,
        input.stability,
        input.retrievability,
        input.grade,
    );
    let new_s = base * input.context_multiplier * input.session_momentum / input.delay_penalty();
    Ok(new_s.clamp(S_MIN, S_MAX))
}
