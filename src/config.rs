use serde::{Deserialize, Serialize};
use snafu::ensure;

use crate::error::{InvalidParametersSnafu, Result};

/// Policy constants of the review pipeline.
///
/// Built once and passed by reference; `Default` reproduces the reference
/// constants exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Retention target before performance and intent are added.
    pub base_retention: f64,
    /// Weight of the recent success rate in the target.
    pub success_weight: f64,
    /// Weight of the user's intent in the target.
    pub intent_weight: f64,
    /// Target reduction at twice the daily capacity or more.
    pub overload_penalty: f64,
    pub retention_floor: f64,
    pub retention_ceiling: f64,
    /// Target used when neither an override nor retention signals are given.
    pub default_retention: f64,
    /// Pull toward the target before load pressure scales it.
    pub pull_strength: f64,
    /// Fatigue rate per review in the current session.
    pub momentum_rate: f64,
    /// Difficulty is clamped into this range before stability updates.
    pub difficulty_range: (f64, f64),
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            base_retention: 0.85,
            success_weight: 0.1,
            intent_weight: 0.02,
            overload_penalty: 0.05,
            retention_floor: 0.75,
            retention_ceiling: 0.97,
            default_retention: 0.9,
            pull_strength: 0.5,
            momentum_rate: 0.02,
            difficulty_range: (0.0, 10.0),
        }
    }
}

impl ReviewConfig {
    pub fn validate(&self) -> Result<()> {
        let values = [
            ("base_retention", self.base_retention),
            ("success_weight", self.success_weight),
            ("intent_weight", self.intent_weight),
            ("overload_penalty", self.overload_penalty),
            ("retention_floor", self.retention_floor),
            ("retention_ceiling", self.retention_ceiling),
            ("default_retention", self.default_retention),
            ("pull_strength", self.pull_strength),
            ("momentum_rate", self.momentum_rate),
            ("difficulty_range.0", self.difficulty_range.0),
            ("difficulty_range.1", self.difficulty_range.1),
        ];
        for (name, value) in values {
            ensure!(
                value.is_finite(),
                InvalidParametersSnafu {
                    reason: format!("{name} is not finite"),
                }
            );
        }
        ensure!(
            0.0 < self.retention_floor
                && self.retention_floor <= self.retention_ceiling
                && self.retention_ceiling < 1.0,
            InvalidParametersSnafu {
                reason: "retention bounds must satisfy 0 < floor <= ceiling < 1",
            }
        );
        ensure!(
            0.0 < self.default_retention && self.default_retention < 1.0,
            InvalidParametersSnafu {
                reason: "default_retention must lie in (0, 1)",
            }
        );
        ensure!(
            (0.0..=1.0).contains(&self.pull_strength),
            InvalidParametersSnafu {
                reason: "pull_strength must lie in [0, 1]",
            }
        );
        ensure!(
            self.momentum_rate >= 0.0,
            InvalidParametersSnafu {
                reason: "momentum_rate must be non-negative",
            }
        );
        ensure!(
            self.difficulty_range.0 <= self.difficulty_range.1,
            InvalidParametersSnafu {
                reason: "difficulty_range is inverted",
            }
        );
        Ok(())
    }

    pub(crate) fn clamp_difficulty(&self, difficulty: f64) -> f64 {
        difficulty.clamp(self.difficulty_range.0, self.difficulty_range.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReviewError;

    #[test]
    fn default_config_is_valid() {
        assert!(ReviewConfig::default().validate().is_ok());
    }

    #[test]
    fn deserialize_partial_config() {
        let config: ReviewConfig =
            serde_json::from_str(r#"{ "pull_strength": 0.3, "difficulty_range": [1.0, 10.0] }"#)
                .unwrap();
        assert_eq!(
            config,
            ReviewConfig {
                pull_strength: 0.3,
                difficulty_range: (1.0, 10.0),
                ..Default::default()
            }
        );
        assert_eq!(config.clamp_difficulty(0.2), 1.0);
    }

    #[test]
    fn rejects_bad_config() {
        for config in [
            ReviewConfig {
                retention_floor: 0.98,
                ..Default::default()
            },
            ReviewConfig {
                pull_strength: 1.5,
                ..Default::default()
            },
            ReviewConfig {
                momentum_rate: f64::NAN,
                ..Default::default()
            },
            ReviewConfig {
                difficulty_range: (10.0, 1.0),
                ..Default::default()
            },
        ] {
            assert!(matches!(
                config.validate(),
                Err(ReviewError::InvalidParameters { .. })
            ));
        }
    }
}
