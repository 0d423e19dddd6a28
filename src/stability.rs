use crate::forgetting_curve::Round;
use crate::memory::Grade;
use crate::parameters::ParameterVector;

pub(crate) const S_MIN: f64 = 0.1;
pub(crate) const S_MIN_INTERMEDIATE: f64 = 0.001;
pub(crate) const S_MAX: f64 = 36500.0;

/// Stability after the very first review of a card.
pub fn init_stability(w: &ParameterVector, grade: Grade) -> f64 {
    w[grade as usize - 1].max(S_MIN)
}

/// Stability after a successful recall.
///
/// `S' = S * (1 + e^w8 * (11 - D) * S^-w9 * (e^(w10 * (1 - R)) - 1) * hard_penalty * easy_bonus)`
pub fn recall_stability(w: &ParameterVector, d: f64, s: f64, r: f64, grade: Grade) -> f64 {
    let hard_penalty = if grade == Grade::Hard { w[15] } else { 1.0 };
    let easy_bonus = if grade == Grade::Easy { w[16] } else { 1.0 };
    (s * (1.0
        + w[8].exp()
            * (11.0 - d)
            * s.powf(-w[9])
            * ((w[10] * (1.0 - r)).exp() - 1.0)
            * hard_penalty
            * easy_bonus))
        .clamp(S_MIN_INTERMEDIATE, S_MAX)
        .to_8_decimal()
}

/// Post-lapse stability. Never exceeds the pre-review stability; with short-term
/// steps enabled the ceiling is lowered by `e^(w17 * w18)`.
pub fn forget_stability(
    w: &ParameterVector,
    d: f64,
    s: f64,
    r: f64,
    enable_short_term: bool,
) -> f64 {
    let new_s =
        w[11] * d.powf(-w[12]) * ((s + 1.0).powf(w[13]) - 1.0) * (w[14] * (1.0 - r)).exp();
    let ceiling = if enable_short_term {
        s / (w[17] * w[18]).exp()
    } else {
        s
    };
    new_s.max(S_MIN_INTERMEDIATE).min(ceiling)
}

/// Same-day stability change. Only a lapse may shrink it.
pub fn short_term_stability(w: &ParameterVector, s: f64, grade: Grade) -> f64 {
    let sinc = s.powf(-w[19]) * (w[17] * (grade.as_f64() - 3.0 + w[18])).exp();
    let sinc = if grade >= Grade::Hard {
        sinc.max(1.0)
    } else {
        sinc
    };
    (s * sinc).clamp(S_MIN_INTERMEDIATE, S_MAX)
}
