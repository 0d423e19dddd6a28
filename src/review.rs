use chrono::{DateTime, Utc};
use log::{debug, info};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use snafu::ensure;

use crate::config::ReviewConfig;
use crate::effective_state::{EffectiveState, ReviewTiming, compute_effective_state};
use crate::error::{InvalidInputSnafu, Result, ensure_finite};
use crate::forgetting_curve::ForgettingCurve;
use crate::memory::{Grade, MemoryState};
use crate::parameters::ParameterVector;
use crate::policy::{
    ContextSignals, RetentionSignals, apply_retention_pull, context_multiplier, load_pressure,
    session_momentum, target_retention,
};
use crate::scheduler::{ScheduleInput, Scheduler};
use crate::stability::{S_MAX, S_MIN};
use crate::stability_tensor::{StabilityUpdateInput, update_stability_tensor};

/// One review of one card, with the signals surrounding it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReviewStepInput {
    pub state: MemoryState,
    pub grade: Grade,
    pub timing: ReviewTiming,
    pub retention_signals: Option<RetentionSignals>,
    pub context_signals: Option<ContextSignals>,
    pub reviews_in_session: u32,
    /// Overrides the adaptive retention target.
    pub target_retention: Option<f64>,
    pub now: DateTime<Utc>,
}

impl ReviewStepInput {
    pub fn new(state: MemoryState, grade: Grade, now: DateTime<Utc>) -> Self {
        Self {
            state,
            grade,
            timing: ReviewTiming::default(),
            retention_signals: None,
            context_signals: None,
            reviews_in_session: 0,
            target_retention: None,
            now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReviewStepResult {
    pub stability: f64,
    /// Effective recall after the retention pull.
    pub retrievability: f64,
    /// Effective elapsed days.
    pub elapsed_days: f64,
    pub interval: f64,
    pub due: DateTime<Utc>,
}

impl ReviewStepResult {
    /// The state to persist for the card until its next review.
    pub fn memory_state(&self, difficulty: f64) -> MemoryState {
        MemoryState {
            stability: self.stability,
            difficulty,
            elapsed_days: 0.0,
            scheduled_days: Some(self.interval),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NextStates {
    pub again: ReviewStepResult,
    pub hard: ReviewStepResult,
    pub good: ReviewStepResult,
    pub easy: ReviewStepResult,
}

/// Output of pipeline stages 1-6, before the load clamp and scheduling.
#[derive(Debug, Clone, Copy)]
struct Stages {
    effective: EffectiveState,
    pressure: f64,
    retrievability: f64,
    stability: f64,
}

/// The review transition pipeline.
///
/// Holds only immutable configuration, so one engine can serve any number of
/// threads.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewEngine {
    parameters: ParameterVector,
    config: ReviewConfig,
    curve: ForgettingCurve,
}

impl Default for ReviewEngine {
    fn default() -> Self {
        let parameters = ParameterVector::default();
        Self {
            curve: ForgettingCurve::new(&parameters)
                .expect("default parameters have a valid decay"),
            parameters,
            config: ReviewConfig::default(),
        }
    }
}

impl ReviewEngine {
    pub fn new(parameters: ParameterVector, config: ReviewConfig) -> Result<Self> {
        config.validate()?;
        let curve = ForgettingCurve::new(&parameters)?;
        Ok(Self {
            parameters,
            config,
            curve,
        })
    }

    pub fn parameters(&self) -> &ParameterVector {
        &self.parameters
    }

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    pub fn forgetting_curve(&self) -> &ForgettingCurve {
        &self.curve
    }

    pub fn compute_effective_state(
        &self,
        state: &MemoryState,
        timing: ReviewTiming,
        context_multiplier: f64,
    ) -> Result<EffectiveState> {
        compute_effective_state(
            &self.curve,
            state.stability,
            state.elapsed_days,
            state.scheduled_days,
            timing,
            context_multiplier,
        )
    }

    pub fn update_stability_tensor(&self, input: &StabilityUpdateInput) -> Result<f64> {
        ensure_finite("difficulty", input.difficulty)?;
        let input = StabilityUpdateInput {
            difficulty: self.config.clamp_difficulty(input.difficulty),
            ..*input
        };
        update_stability_tensor(&self.parameters, &input)
    }

    /// Runs one review through the pipeline and hands the result to `scheduler`.
    ///
    /// Either the whole result is produced or an error is returned; the
    /// scheduler is not called on failure.
    pub fn review_step<S>(
        &self,
        input: &ReviewStepInput,
        scheduler: &S,
    ) -> Result<ReviewStepResult>
    where
        S: Scheduler + ?Sized,
    {
        self.validate(input)?;
        let difficulty = self.config.clamp_difficulty(input.state.difficulty);
        let signals = input.retention_signals.as_ref();

        let mut stages = self.run_stages(input, difficulty, signals)?;
        // Higher load must never increase stability, whatever the signals did
        // to the retention target.
        if signals.is_some() && stages.pressure < 1.0 {
            let baseline = self.run_stages(input, difficulty, None)?;
            if baseline.stability < stages.stability {
                info!(
                    "load clamp lowered stability from {} to {} (pressure {})",
                    stages.stability, baseline.stability, stages.pressure
                );
            }
            stages.stability = stages.stability.min(baseline.stability);
        }

        let schedule = scheduler.schedule(&ScheduleInput {
            stability: stages.stability,
            elapsed_days: stages.effective.elapsed_days,
            retrievability: stages.retrievability,
            grade: input.grade,
            difficulty,
            now: input.now,
        });
        debug_assert!(schedule.interval > 0.0, "scheduler returned {schedule:?}");

        Ok(ReviewStepResult {
            stability: stages.stability,
            retrievability: stages.retrievability,
            elapsed_days: stages.effective.elapsed_days,
            interval: schedule.interval,
            due: schedule.due,
        })
    }

    /// Outcomes for all four grades, for previewing the answer buttons.
    pub fn next_states<S>(&self, input: &ReviewStepInput, scheduler: &S) -> Result<NextStates>
    where
        S: Scheduler + ?Sized,
    {
        let [again, hard, good, easy] = [Grade::Again, Grade::Hard, Grade::Good, Grade::Easy]
            .map(|grade| self.review_step(&ReviewStepInput { grade, ..*input }, scheduler));
        Ok(NextStates {
            again: again?,
            hard: hard?,
            good: good?,
            easy: easy?,
        })
    }

    /// Reviews independent cards in parallel. Results are in input order.
    pub fn review_batch<S>(
        &self,
        inputs: &[ReviewStepInput],
        scheduler: &S,
    ) -> Vec<Result<ReviewStepResult>>
    where
        S: Scheduler + ?Sized,
    {
        inputs
            .par_iter()
            .map(|input| self.review_step(input, scheduler))
            .collect()
    }

    fn validate(&self, input: &ReviewStepInput) -> Result<()> {
        ensure_finite("difficulty", input.state.difficulty)?;
        if let Some(target) = input.target_retention {
            ensure!(
                target > 0.0 && target < 1.0,
                InvalidInputSnafu {
                    field: "target_retention",
                    value: target,
                }
            );
        }
        if let Some(signals) = &input.retention_signals {
            signals.validate()?;
        }
        if let Some(context) = &input.context_signals {
            context.validate()?;
        }
        Ok(())
    }

    fn run_stages(
        &self,
        input: &ReviewStepInput,
        difficulty: f64,
        signals: Option<&RetentionSignals>,
    ) -> Result<Stages> {
        let state = &input.state;
        let effective = self.compute_effective_state(state, input.timing, 1.0)?;

        let pressure = signals.map_or(1.0, |s| load_pressure(s.due_today, s.daily_capacity));
        let target = input
            .target_retention
            .or_else(|| signals.map(|s| target_retention(s, &self.config)))
            .unwrap_or(self.config.default_retention);
        let retrievability = apply_retention_pull(
            effective.retrievability,
            target,
            self.config.pull_strength * pressure,
        );

        let mut stability = update_stability_tensor(
            &self.parameters,
            &StabilityUpdateInput {
                scheduled_days: state.schedule(),
                actual_days: Some(state.elapsed_days),
                ..StabilityUpdateInput::new(
                    state.stability,
                    retrievability,
                    input.grade,
                    difficulty,
                )
            },
        )?;
        stability *= session_momentum(input.reviews_in_session, self.config.momentum_rate)
            * pressure
            * context_multiplier(input.context_signals.as_ref());
        let stability = stability.clamp(S_MIN, S_MAX);

        debug!(
            "t_eff={} r_eff={} pressure={} target={} r_adj={} s_new={}",
            effective.elapsed_days,
            effective.retrievability,
            pressure,
            target,
            retrievability,
            stability
        );
        Ok(Stages {
            effective,
            pressure,
            retrievability,
            stability,
        })
    }
}
