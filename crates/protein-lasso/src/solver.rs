//! Box-constrained L1 coordinate descent over precomputed summaries.
//!
//! Minimises ||Y - X·coef||² + λ·||coef||₁ subject to 0 <= coef <= 1, one
//! protein at a time in index order, until a full sweep moves no coordinate
//! by more than the tolerance.
use crate::config::{validate_stopping, InferenceConfig};
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{ensure_finite, LassoError, Result};
use crate::math::Array1;
use crate::summary::Summaries;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convergence {
    /// The last sweep changed no coordinate.
    Converged,
    /// Stopped at the sweep cap with coordinates still moving.
    MaxSweepsReached,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub lambda: f64,
    /// Final protein probabilities, one per protein index.
    pub coefficients: Array1<f64>,
    pub sweeps: usize,
    pub convergence: Convergence,
    pub diagnostics: Diagnostics,
}

impl SolveOutcome {
    pub fn converged(&self) -> bool {
        self.convergence == Convergence::Converged
    }

    /// Number of strictly positive coefficients.
    pub fn support_size(&self) -> usize {
        self.coefficients.iter().filter(|&&c| c > 0.0).count()
    }
}

/// Solver bound to one set of summaries. Cheap to copy; holds no mutable state,
/// so several solves may share it across threads.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateDescent<'a> {
    summaries: &'a Summaries,
    tolerance: f64,
    max_sweeps: Option<usize>,
}

impl<'a> CoordinateDescent<'a> {
    pub fn new(summaries: &'a Summaries, config: &InferenceConfig) -> Self {
        Self {
            summaries,
            tolerance: config.tolerance,
            max_sweeps: config.max_sweeps,
        }
    }

    pub fn with_max_sweeps(mut self, max_sweeps: Option<usize>) -> Self {
        self.max_sweeps = max_sweeps;
        self
    }

    /// Run coordinate descent from `initial` at penalty `lambda`.
    ///
    /// A protein with zero sum of squares is never updated and keeps its
    /// initial value. Fails on an unusable tolerance or sweep cap, and on
    /// any update that overflows.
    pub fn solve(&self, initial: &[f64], lambda: f64) -> Result<SolveOutcome> {
        validate_stopping(self.tolerance, self.max_sweeps)?;
        if !lambda.is_finite() || lambda < 0.0 {
            return Err(LassoError::InvalidLambda(lambda));
        }
        let protein_num = self.summaries.protein_count();
        if initial.len() != protein_num {
            return Err(LassoError::LengthMismatch {
                what: "initial coefficient vector",
                expected: protein_num,
                found: initial.len(),
            });
        }
        if let Some((index, &value)) = initial
            .iter()
            .enumerate()
            .find(|&(_, &v)| !(0.0..=1.0).contains(&v))
        {
            return Err(LassoError::InitialCoefficient { index, value });
        }

        let inner_product = self.summaries.inner_product();
        let x_inter_product = self.summaries.x_inter_product();
        let sum = self.summaries.sum_of_squares();

        let mut coef = initial.to_vec();
        let mut sweeps = 0usize;
        let mut has_update = true;

        while has_update {
            if self.max_sweeps.is_some_and(|cap| sweeps >= cap) {
                break;
            }
            has_update = false;
            sweeps += 1;
            let mut updated = 0usize;

            for j in 0..protein_num {
                if sum[j] == 0.0 {
                    continue;
                }

                // includes i == j; the sum[j]·coef[j] term below cancels it
                let y_j: f64 = x_inter_product
                    .row_slice(j)
                    .iter()
                    .zip(coef.iter())
                    .filter(|&(_, &c)| c != 0.0)
                    .map(|(&xx, &c)| xx * c)
                    .sum();

                let residual = ensure_finite(inner_product[j] + sum[j] * coef[j] - y_j, || {
                    format!("residual of protein index {} at lambda {}", j, lambda)
                })?;
                let candidate = ((residual - 0.5 * lambda) / sum[j]).clamp(0.0, 1.0);

                if (coef[j] - candidate).abs() > self.tolerance {
                    has_update = true;
                    coef[j] = candidate;
                    updated += 1;
                }
            }

            log::debug!(
                "lambda {}: sweep {} updated {} coordinates",
                lambda,
                sweeps,
                updated
            );
        }

        for (q, &c) in coef.iter().enumerate() {
            ensure_finite(c, || format!("coefficient of protein index {} at lambda {}", q, lambda))?;
        }

        let mut diagnostics = Diagnostics::new();
        let convergence = if has_update {
            diagnostics.push(Warning::NotConverged { lambda, sweeps });
            Convergence::MaxSweepsReached
        } else {
            Convergence::Converged
        };

        Ok(SolveOutcome {
            lambda,
            coefficients: Array1::from_vec(coef),
            sweeps,
            convergence,
            diagnostics,
        })
    }
}
