use serde::{Deserialize, Serialize};
use snafu::ensure;

use crate::error::{InvalidInputSnafu, Result, ensure_finite};
use crate::forgetting_curve::ForgettingCurve;

pub(crate) const R_MIN: f64 = 0.01;
pub(crate) const R_MAX: f64 = 0.99;

/// The scheduled part of an overdue interval is charged at this rate.
const OVERDUE_SCHEDULED_WEIGHT: f64 = 1.5;
const EARLY_FACTOR: f64 = 0.85;
const POSTPONED_FACTOR: f64 = 1.15;

/// How the review was timed relative to its schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReviewTiming {
    pub early: bool,
    pub postponed: bool,
}

/// Recall probability and elapsed time after timing adjustments. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectiveState {
    pub retrievability: f64,
    pub elapsed_days: f64,
}

/// Effective elapsed days for a review `elapsed_days` after the last one.
///
/// Overdue reviews are charged the full excess delay plus 1.5x the scheduled
/// interval. Early reviews are discounted. The postponement surcharge only
/// applies when there is no schedule to charge against.
pub fn effective_elapsed_days(
    elapsed_days: f64,
    scheduled_days: Option<f64>,
    timing: ReviewTiming,
) -> f64 {
    let scheduled_days = scheduled_days.filter(|&days| days > 0.0);
    let mut t_eff = match scheduled_days {
        Some(scheduled) if elapsed_days > scheduled => {
            (elapsed_days - scheduled) + OVERDUE_SCHEDULED_WEIGHT * scheduled
        }
        _ => elapsed_days,
    };
    if timing.early {
        t_eff = (t_eff * EARLY_FACTOR).max(0.0);
    }
    if timing.postponed && scheduled_days.is_none() {
        t_eff *= POSTPONED_FACTOR;
    }
    t_eff
}

pub fn compute_effective_state(
    curve: &ForgettingCurve,
    stability: f64,
    elapsed_days: f64,
    scheduled_days: Option<f64>,
    timing: ReviewTiming,
    context_multiplier: f64,
) -> Result<EffectiveState> {
    ensure!(
        stability.is_finite() && stability > 0.0,
        InvalidInputSnafu {
            field: "stability",
            value: stability,
        }
    );
    ensure!(
        elapsed_days.is_finite() && elapsed_days >= 0.0,
        InvalidInputSnafu {
            field: "elapsed_days",
            value: elapsed_days,
        }
    );
    if let Some(scheduled) = scheduled_days {
        ensure_finite("scheduled_days", scheduled)?;
    }
    ensure!(
        context_multiplier.is_finite() && context_multiplier > 0.0,
        InvalidInputSnafu {
            field: "context_multiplier",
            value: context_multiplier,
        }
    );

    let t_eff = effective_elapsed_days(elapsed_days, scheduled_days, timing);
    let retrievability =
        (curve.recall(t_eff, stability) * context_multiplier).clamp(R_MIN, R_MAX);
    Ok(EffectiveState {
        retrievability,
        elapsed_days: t_eff,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReviewError;
    use crate::parameters::ParameterVector;
    use crate::test_helpers::TestHelper;

    const ON_TIME: ReviewTiming = ReviewTiming {
        early: false,
        postponed: false,
    };
    const EARLY: ReviewTiming = ReviewTiming {
        early: true,
        postponed: false,
    };
    const POSTPONED: ReviewTiming = ReviewTiming {
        early: false,
        postponed: true,
    };

    fn curve() -> ForgettingCurve {
        ForgettingCurve::new(&ParameterVector::default()).unwrap()
    }

    fn state(t: f64, scheduled: Option<f64>, timing: ReviewTiming) -> EffectiveState {
        compute_effective_state(&curve(), 10.0, t, scheduled, timing, 1.0).unwrap()
    }

    #[test]
    fn anti_hoarding_monotonic_penalty() {
        let on_time = state(5.0, Some(5.0), ON_TIME);
        let late = state(8.0, Some(5.0), ON_TIME);
        let very_late = state(15.0, Some(5.0), ON_TIME);
        assert_eq!(on_time.elapsed_days, 5.0);
        assert_eq!(late.elapsed_days, 10.5);
        assert_eq!(very_late.elapsed_days, 17.5);
        assert!(late.elapsed_days < very_late.elapsed_days);
        assert!(on_time.retrievability > late.retrievability);
        assert!(late.retrievability > very_late.retrievability);
    }

    #[test]
    fn elapsed_days_non_decreasing_for_fixed_schedule() {
        let t_eff = (0..=60)
            .map(|i| effective_elapsed_days(i as f64 * 0.5, Some(7.0), ON_TIME))
            .collect::<Vec<_>>();
        assert!(t_eff.windows(2).all(|w| w[0] <= w[1]), "{t_eff:?}");
        for (i, &t) in t_eff.iter().enumerate() {
            assert!(t >= i as f64 * 0.5);
        }
    }

    #[test]
    fn early_discount() {
        effective_elapsed_days(10.0, None, EARLY).assert_approx_eq([8.5]);
        // Applied after the overdue charge.
        effective_elapsed_days(8.0, Some(5.0), EARLY).assert_approx_eq([10.5 * 0.85]);
        for t in [0.0, 1.0, 3.0, 12.0] {
            for scheduled in [None, Some(4.0)] {
                assert!(
                    effective_elapsed_days(t, scheduled, EARLY)
                        <= effective_elapsed_days(t, scheduled, ON_TIME)
                );
            }
        }
    }

    #[test]
    fn postponement_surcharge_without_schedule() {
        effective_elapsed_days(10.0, None, POSTPONED).assert_approx_eq([11.5]);
        // With a schedule the overdue charge takes over; no double penalty.
        assert_eq!(effective_elapsed_days(8.0, Some(5.0), POSTPONED), 10.5);
        assert_eq!(effective_elapsed_days(3.0, Some(5.0), POSTPONED), 3.0);
        // A zero-day schedule counts as no schedule.
        effective_elapsed_days(10.0, Some(0.0), POSTPONED).assert_approx_eq([11.5]);
        for t in [0.0, 2.0, 9.0] {
            assert!(
                effective_elapsed_days(t, None, POSTPONED)
                    >= effective_elapsed_days(t, None, ON_TIME)
            );
        }
    }

    #[test]
    fn retrievability_is_clamped() {
        let fresh = state(0.0, None, ON_TIME);
        assert_eq!(fresh.retrievability, R_MAX);
        let ancient = compute_effective_state(&curve(), 0.1, 1e15, None, ON_TIME, 1.0).unwrap();
        assert_eq!(ancient.retrievability, R_MIN);
        let dampened = compute_effective_state(&curve(), 10.0, 10.0, None, ON_TIME, 0.5).unwrap();
        dampened.retrievability.assert_approx_eq([0.45]);
    }

    #[test]
    fn rejects_invalid_input() {
        let curve = curve();
        for (s, t, scheduled, multiplier) in [
            (0.0, 1.0, None, 1.0),
            (-1.0, 1.0, None, 1.0),
            (f64::NAN, 1.0, None, 1.0),
            (1.0, -1.0, None, 1.0),
            (1.0, f64::INFINITY, None, 1.0),
            (1.0, 1.0, Some(f64::NAN), 1.0),
            (1.0, 1.0, None, f64::NAN),
        ] {
            assert!(matches!(
                compute_effective_state(&curve, s, t, scheduled, ON_TIME, multiplier),
                Err(ReviewError::InvalidInput { .. })
            ));
        }
    }
}
