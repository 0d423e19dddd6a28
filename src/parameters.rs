use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::error::{InvalidParametersSnafu, Result};

/// Raw parameter input. Accepted lengths are 17, 19 and 21.
pub type Parameters = [f64];

pub(crate) const FSRS5_DEFAULT_DECAY: f64 = 0.5;

pub const DEFAULT_PARAMETERS: [f64; 21] = [
    0.212, 1.2931, 2.3065, 8.2956, // w0-w3: initial stability per grade
    6.4133, 0.8334, 3.0194, 0.001, // w4-w7: difficulty
    1.8722, 0.1666, 0.796, // w8-w10: recall stability
    1.4835, 0.0614, 0.2629, 1.6483, // w11-w14: forget stability
    0.6014, 1.8729, // w15-w16: hard penalty, easy bonus
    0.5425, 0.0912, 0.0658, // w17-w19: short-term stability
    0.1542, // w20: decay
];

/// A fully resolved, immutable 21-value parameter vector.
///
/// Shorter vectors from older model generations are migrated on construction,
/// so everything downstream can index `w[0]..=w[20]` without checking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct ParameterVector([f64; 21]);

impl ParameterVector {
    pub fn new(parameters: &Parameters) -> Result<Self> {
        let filled = check_and_fill_parameters(parameters)?;
        let mut resolved = [0.0; 21];
        resolved.copy_from_slice(&filled);
        Ok(Self(resolved))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl Default for ParameterVector {
    fn default() -> Self {
        Self(DEFAULT_PARAMETERS)
    }
}

impl Index<usize> for ParameterVector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl TryFrom<Vec<f64>> for ParameterVector {
    type Error = crate::ReviewError;

    fn try_from(parameters: Vec<f64>) -> Result<Self> {
        Self::new(&parameters)
    }
}

impl From<ParameterVector> for Vec<f64> {
    fn from(parameters: ParameterVector) -> Self {
        parameters.0.to_vec()
    }
}

pub(crate) fn check_and_fill_parameters(parameters: &Parameters) -> Result<Vec<f64>> {
    let parameters = match parameters.len() {
        17 => {
            let mut parameters = parameters.to_vec();
            parameters[4] += parameters[5] * 2.0;
            parameters[5] = (parameters[5] * 3.0 + 1.0).ln() / 3.0;
            parameters[6] += 0.5;
            parameters.extend_from_slice(&[0.0, 0.0, 0.0, FSRS5_DEFAULT_DECAY]);
            parameters
        }
        19 => {
            let mut parameters = parameters.to_vec();
            parameters.extend_from_slice(&[0.0, FSRS5_DEFAULT_DECAY]);
            parameters
        }
        21 => parameters.to_vec(),
        n => {
            return InvalidParametersSnafu {
                reason: format!("expected 17, 19 or 21 parameters, got {n}"),
            }
            .fail();
        }
    };
    if let Some(index) = parameters.iter().position(|w| !w.is_finite()) {
        return InvalidParametersSnafu {
            reason: format!("w{index} is not finite"),
        }
        .fail();
    }
    Ok(parameters)
}
