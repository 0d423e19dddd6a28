use snafu::Snafu;

#[derive(Snafu, Debug, Clone, PartialEq)]
#[snafu(visibility(pub(crate)))]
pub enum ReviewError {
    #[snafu(display("invalid parameters: {reason}"))]
    InvalidParameters { reason: String },
    #[snafu(display("invalid input: {field} = {value}"))]
    InvalidInput { field: &'static str, value: f64 },
    #[snafu(display("invalid grade: {grade}, expected 1..=4"))]
    InvalidGrade { grade: u8 },
}

pub type Result<T, E = ReviewError> = std::result::Result<T, E>;

/// Rejects NaN and infinities for the named input.
pub(crate) fn ensure_finite(field: &'static str, value: f64) -> Result<f64> {
    snafu::ensure!(value.is_finite(), InvalidInputSnafu { field, value });
    Ok(value)
}

/// Rejects values outside the closed unit interval (and non-finite ones).
pub(crate) fn ensure_unit(field: &'static str, value: f64) -> Result<f64> {
    snafu::ensure!(
        (0.0..=1.0).contains(&value),
        InvalidInputSnafu { field, value }
    );
    Ok(value)
}
