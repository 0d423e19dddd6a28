//! Bounded, monotonic adjustments applied on top of the memory model.
//!
//! Each policy only ever dampens: load pressure and session momentum lie in
//! `[0.85, 1]` and `[0.9, 1]`, and the retention pull weakens as load grows.

use serde::{Deserialize, Serialize};

use crate::config::ReviewConfig;
use crate::effective_state::{R_MAX, R_MIN};
use crate::error::{InvalidInputSnafu, Result, ensure_finite, ensure_unit};

const MIN_LOAD_PRESSURE: f64 = 0.85;
const MIN_SESSION_MOMENTUM: f64 = 0.9;
const CONTEXT_RANGE: (f64, f64) = (0.85, 1.05);
/// Backlog size at which the derived intent reaches zero.
const BACKLOG_SCALE: f64 = 100.0;
/// Session minutes at which the derived intent reaches zero.
const SESSION_SCALE: f64 = 120.0;

/// Workload signals describing the learner's current situation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionSignals {
    pub backlog_size: u32,
    /// Share of recent reviews that failed, in `[0, 1]`.
    pub recent_failure_rate: f64,
    /// Minutes spent in the current session.
    pub session_length: f64,
    pub daily_capacity: u32,
    pub due_today: u32,
    /// Derived as `1 - recent_failure_rate` when absent.
    pub recent_success_rate: Option<f64>,
    /// Derived from backlog and session length when absent.
    pub user_intent: Option<f64>,
}

impl RetentionSignals {
    pub fn validate(&self) -> Result<()> {
        ensure_unit("recent_failure_rate", self.recent_failure_rate)?;
        ensure_finite("session_length", self.session_length)?;
        snafu::ensure!(
            self.session_length >= 0.0,
            InvalidInputSnafu {
                field: "session_length",
                value: self.session_length,
            }
        );
        if let Some(rate) = self.recent_success_rate {
            ensure_unit("recent_success_rate", rate)?;
        }
        if let Some(intent) = self.user_intent {
            ensure_unit("user_intent", intent)?;
        }
        Ok(())
    }

    pub fn success_rate(&self) -> f64 {
        self.recent_success_rate
            .unwrap_or(1.0 - self.recent_failure_rate)
    }

    pub fn intent(&self) -> f64 {
        self.user_intent.unwrap_or_else(|| {
            (1.0 - self.backlog_size as f64 / BACKLOG_SCALE - self.session_length / SESSION_SCALE)
                .clamp(0.0, 1.0)
        })
    }

    /// Due reviews per unit of capacity. Zero capacity with anything due is
    /// unbounded overload.
    pub fn load_ratio(&self) -> f64 {
        match (self.due_today, self.daily_capacity) {
            (0, _) => 0.0,
            (_, 0) => f64::INFINITY,
            (due, capacity) => due as f64 / capacity as f64,
        }
    }
}

/// Environmental signals, each in `[0, 1]`. Absent fields are neutral.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextSignals {
    pub environment_quality: Option<f64>,
    pub difficulty: Option<f64>,
    pub time_of_day: Option<f64>,
}

impl ContextSignals {
    pub fn validate(&self) -> Result<()> {
        if let Some(quality) = self.environment_quality {
            ensure_unit("environment_quality", quality)?;
        }
        if let Some(difficulty) = self.difficulty {
            ensure_unit("context_difficulty", difficulty)?;
        }
        if let Some(time) = self.time_of_day {
            ensure_unit("time_of_day", time)?;
        }
        Ok(())
    }
}

/// Dampening factor in `[0.85, 1]`, non-increasing in `due_today`.
pub fn load_pressure(due_today: u32, daily_capacity: u32) -> f64 {
    if due_today == 0 {
        return 1.0;
    }
    if daily_capacity == 0 {
        return MIN_LOAD_PRESSURE;
    }
    (daily_capacity as f64 / due_today as f64).clamp(MIN_LOAD_PRESSURE, 1.0)
}

/// Desired steady-state recall from recent performance, intent and load.
pub fn target_retention(signals: &RetentionSignals, config: &ReviewConfig) -> f64 {
    let mut target = config.base_retention
        + config.success_weight * signals.success_rate()
        + config.intent_weight * signals.intent();
    let load_ratio = signals.load_ratio();
    if load_ratio > 1.0 {
        target -= config.overload_penalty * (load_ratio - 1.0).min(1.0);
    }
    target.clamp(config.retention_floor, config.retention_ceiling)
}

/// Moves `retrievability` toward `target` by `strength`.
///
/// Callers scale `strength` by load pressure beforehand, so higher load only
/// weakens the pull.
pub fn apply_retention_pull(retrievability: f64, target: f64, strength: f64) -> f64 {
    (retrievability + strength * (target - retrievability)).clamp(R_MIN, R_MAX)
}

/// Fatigue multiplier in `[0.9, 1]`. Applies to stability, never to recall.
pub fn session_momentum(reviews_so_far: u32, rate: f64) -> f64 {
    (-rate * reviews_so_far as f64)
        .exp()
        .clamp(MIN_SESSION_MOMENTUM, 1.0)
}

pub fn context_multiplier(signals: Option<&ContextSignals>) -> f64 {
    let Some(signals) = signals else {
        return 1.0;
    };
    let mut multiplier = 1.0;
    if let Some(quality) = signals.environment_quality {
        multiplier += 0.1 * (quality - 0.5);
    }
    if let Some(difficulty) = signals.difficulty {
        multiplier += 0.05 * (1.0 - difficulty);
    }
    if let Some(time) = signals.time_of_day {
        multiplier += 0.05 * (time - 0.5);
    }
    multiplier.clamp(CONTEXT_RANGE.0, CONTEXT_RANGE.1)
}
