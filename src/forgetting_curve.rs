use snafu::ensure;

use crate::error::{InvalidParametersSnafu, Result};
use crate::memory::MemoryState;
use crate::parameters::ParameterVector;

pub(crate) trait Round {
    fn to_8_decimal(self) -> f64;
}

impl Round for f64 {
    fn to_8_decimal(self) -> f64 {
        (self * 1e8).round() / 1e8
    }
}

/// Returns `(decay, factor)` for the power forgetting curve.
///
/// `decay = -w20` and `factor = 0.9^(1 / decay) - 1`, so that recall is
/// exactly 0.9 when the elapsed time equals the stability.
pub fn decay_factor(parameters: &ParameterVector) -> Result<(f64, f64)> {
    let decay = -parameters[20];
    ensure!(
        decay.is_finite() && decay != 0.0,
        InvalidParametersSnafu {
            reason: format!("degenerate decay {decay}"),
        }
    );
    let factor = ((0.9f64.ln() / decay).exp() - 1.0).to_8_decimal();
    Ok((decay, factor))
}

/// Probability of recall after `t` days for a memory of stability `s`.
///
/// `s` must be positive; no floor is substituted here.
pub fn recall(decay: f64, factor: f64, t: f64, s: f64) -> f64 {
    debug_assert!(s > 0.0, "stability must be positive, got {s}");
    debug_assert!(t >= 0.0, "elapsed days must be non-negative, got {t}");
    (1.0 + factor * t / s).powf(decay).to_8_decimal()
}

/// Days until recall drops to `desired_retention`. Inverse of [`recall`].
pub fn next_interval(
    decay: f64,
    factor: f64,
    stability: f64,
    desired_retention: f64,
) -> f64 {
    stability / factor * (desired_retention.powf(1.0 / decay) - 1.0)
}

/// A resolved forgetting curve, computed once per parameter vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForgettingCurve {
    decay: f64,
    factor: f64,
}

impl ForgettingCurve {
    pub fn new(parameters: &ParameterVector) -> Result<Self> {
        let (decay, factor) = decay_factor(parameters)?;
        // A non-positive factor would make recall grow with time.
        ensure!(
            factor > 0.0,
            InvalidParametersSnafu {
                reason: format!("decay {decay} yields non-decreasing recall"),
            }
        );
        Ok(Self { decay, factor })
    }

    pub fn decay(&self) -> f64 {
        self.decay
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn recall(&self, t: f64, s: f64) -> f64 {
        recall(self.decay, self.factor, t, s)
    }

    pub fn next_interval(&self, stability: f64, desired_retention: f64) -> f64 {
        next_interval(self.decay, self.factor, stability, desired_retention)
    }

    pub fn current_retrievability(&self, state: &MemoryState) -> f64 {
        self.recall(state.elapsed_days.max(0.0), state.stability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_PARAMETERS;
    use crate::test_helpers::TestHelper;

    fn with_decay(w20: f64) -> ParameterVector {
        let mut parameters = DEFAULT_PARAMETERS;
        parameters[20] = w20;
        ParameterVector::new(&parameters).unwrap()
    }

    #[test]
    fn test_power_forgetting_curve() {
        let curve = ForgettingCurve::new(&ParameterVector::default()).unwrap();
        let retrievability = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0]
            .into_iter()
            .zip([1.0, 2.0, 3.0, 4.0, 4.0, 2.0])
            .map(|(t, s)| curve.recall(t, s))
            .collect::<Vec<_>>();
        retrievability.assert_approx_eq([1.0, 0.9403443, 0.9253786, 0.9185229, 0.9, 0.8261359]);
    }

    #[test]
    fn test_decay_factor() {
        let (decay, factor) = decay_factor(&with_decay(0.5)).unwrap();
        assert_eq!(decay, -0.5);
        // 0.9^-2 - 1 = 19/81
        factor.assert_approx_eq([19.0 / 81.0]);
        assert_eq!(factor, factor.to_8_decimal());

        assert!(decay_factor(&with_decay(0.0)).is_err());
        assert!(ForgettingCurve::new(&with_decay(-0.2)).is_err());
    }

    #[test]
    fn test_recall_is_one_at_zero_elapsed() {
        for w20 in [0.1, 0.1542, 0.5, 1.0] {
            let (decay, factor) = decay_factor(&with_decay(w20)).unwrap();
            for s in [0.001, 0.1, 1.0, 10.0, 36500.0] {
                assert_eq!(recall(decay, factor, 0.0, s), 1.0);
            }
        }
    }

    #[test]
    fn test_recall_monotonicity() {
        let curve = ForgettingCurve::new(&ParameterVector::default()).unwrap();
        let by_time = [1.0, 2.0, 5.0, 10.0, 30.0, 100.0].map(|t| curve.recall(t, 10.0));
        assert!(by_time.windows(2).all(|w| w[1] < w[0]), "{by_time:?}");

        let by_stability = [0.5, 1.0, 5.0, 10.0, 50.0].map(|s| curve.recall(3.0, s));
        assert!(
            by_stability.windows(2).all(|w| w[1] > w[0]),
            "{by_stability:?}"
        );
    }

    #[test]
    fn test_next_interval_inverts_recall() {
        let curve = ForgettingCurve::new(&ParameterVector::default()).unwrap();
        let interval = curve.next_interval(10.0, 0.9);
        interval.assert_approx_eq([10.0]);
        let interval = curve.next_interval(7.0, 0.8);
        curve.recall(interval, 7.0).assert_approx_eq([0.8]);
    }

    #[test]
    fn test_current_retrievability() {
        let curve = ForgettingCurve::new(&ParameterVector::default()).unwrap();
        let state = MemoryState {
            stability: 4.0,
            difficulty: 5.0,
            elapsed_days: 4.0,
            scheduled_days: None,
        };
        curve.current_retrievability(&state).assert_approx_eq([0.9]);
    }
}
