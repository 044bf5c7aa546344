use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{LassoError, Result};

/// Convergence threshold of the reference solver: `e^-5`, not `10^-5`.
pub const DEFAULT_TOLERANCE: f64 = 0.006_737_946_999_085_467;

/// Default cap on full coordinate sweeps.
pub const DEFAULT_MAX_SWEEPS: usize = 10_000;

/// How a peptide's list of identification probabilities collapses into one value of Y.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProbabilityReduction {
    /// Arithmetic mean of all observed probabilities.
    #[default]
    Average,
    /// Largest observed probability.
    Max,
    /// Ignore the observations; every peptide gets 1.
    ConstantOne,
}

impl ProbabilityReduction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbabilityReduction::Average => "average",
            ProbabilityReduction::Max => "max",
            ProbabilityReduction::ConstantOne => "constant-one",
        }
    }
}

impl FromStr for ProbabilityReduction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "average" | "mean" => Ok(ProbabilityReduction::Average),
            "max" => Ok(ProbabilityReduction::Max),
            "one" | "constant-one" | "constant_one" => Ok(ProbabilityReduction::ConstantOne),
            _ => Err(format!(
                "Unknown probability reduction: {}. Expected one of: average, max, constant-one",
                s
            )),
        }
    }
}

/// Settings for building the design matrix and running the solver.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct InferenceConfig {
    pub reduction: ProbabilityReduction,
    /// A coordinate counts as updated when it moves by more than this.
    pub tolerance: f64,
    /// Upper bound on full sweeps; `None` loops until stable.
    pub max_sweeps: Option<usize>,
    /// Value every coefficient starts from when no warm start is given.
    pub initial_coefficient: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            reduction: ProbabilityReduction::Average,
            tolerance: DEFAULT_TOLERANCE,
            max_sweeps: Some(DEFAULT_MAX_SWEEPS),
            initial_coefficient: 0.0,
        }
    }
}

impl InferenceConfig {
    pub fn new(reduction: ProbabilityReduction) -> Self {
        Self {
            reduction,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_stopping(self.tolerance, self.max_sweeps)?;
        if !(0.0..=1.0).contains(&self.initial_coefficient) {
            return Err(LassoError::InvalidConfig(format!(
                "initial_coefficient must lie in [0, 1], got {}",
                self.initial_coefficient
            )));
        }
        Ok(())
    }
}

/// Check the solver's stopping rule: a finite positive tolerance and a
/// sweep cap of at least one when capped.
pub(crate) fn validate_stopping(tolerance: f64, max_sweeps: Option<usize>) -> Result<()> {
    if !tolerance.is_finite() || tolerance <= 0.0 {
        return Err(LassoError::InvalidConfig(format!(
            "tolerance must be finite and positive, got {}",
            tolerance
        )));
    }
    if max_sweeps == Some(0) {
        return Err(LassoError::InvalidConfig(
            "max_sweeps must be at least 1".to_string(),
        ));
    }
    Ok(())
}
