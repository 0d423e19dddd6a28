//! Review transition pipeline for spaced repetition.
//!
//! Given one card's [`MemoryState`] and the grade of a review, [`ReviewEngine`]
//! computes the effective recall and elapsed time, applies the bounded
//! scheduling policies, updates stability and hands the result to an injected
//! [`Scheduler`]. Every call is a pure function of its inputs.

mod config;
mod effective_state;
mod error;
mod forgetting_curve;
mod memory;
mod parameters;
mod policy;
mod review;
mod scheduler;
mod stability;
mod stability_tensor;
#[cfg(test)]
mod test_helpers;

pub use config::ReviewConfig;
pub use effective_state::{
    EffectiveState, ReviewTiming, compute_effective_state, effective_elapsed_days,
};
pub use error::{Result, ReviewError};
pub use forgetting_curve::{ForgettingCurve, decay_factor, next_interval, recall};
pub use memory::{Grade, MemoryState};
pub use parameters::{DEFAULT_PARAMETERS, ParameterVector, Parameters};
pub use policy::{
    ContextSignals, RetentionSignals, apply_retention_pull, context_multiplier, load_pressure,
    session_momentum, target_retention,
};
pub use review::{NextStates, ReviewEngine, ReviewStepInput, ReviewStepResult};
pub use scheduler::{
    DEFAULT_DESIRED_RETENTION, RetentionScheduler, Schedule, ScheduleInput, Scheduler,
};
pub use stability::{forget_stability, init_stability, recall_stability, short_term_stability};
pub use stability_tensor::{StabilityUpdateInput, update_stability_tensor};
