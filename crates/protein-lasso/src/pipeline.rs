//! End-to-end protein inference: ingest once, solve at any penalty.
use rayon::prelude::*;

use crate::config::InferenceConfig;
use crate::design_matrix::DesignMatrix;
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::Result;
use crate::evidence::{EvidenceIndex, EvidenceRecord};
use crate::report::{rank_proteins, ProteinProbability};
use crate::solver::{CoordinateDescent, SolveOutcome};
use crate::summary::Summaries;

/// A prepared inference problem.
///
/// Everything except the coefficient vectors is immutable after
/// construction, so solves at different penalties can run concurrently.
#[derive(Debug, Clone)]
pub struct ProteinLasso {
    config: InferenceConfig,
    evidence: EvidenceIndex,
    design: DesignMatrix,
    summaries: Summaries,
    diagnostics: Diagnostics,
}

impl ProteinLasso {
    /// Build the problem from the identification and detectability relations.
    pub fn from_records<I, D>(
        identifications: I,
        detectability: D,
        config: &InferenceConfig,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = EvidenceRecord>,
        D: IntoIterator<Item = EvidenceRecord>,
    {
        let mut diagnostics = Diagnostics::new();
        let evidence = EvidenceIndex::from_records(identifications, detectability, &mut diagnostics)?;
        Self::from_evidence(evidence, diagnostics, config)
    }

    /// Build the problem from an already frozen evidence index.
    pub fn from_evidence(
        evidence: EvidenceIndex,
        mut diagnostics: Diagnostics,
        config: &InferenceConfig,
    ) -> Result<Self> {
        config.validate()?;
        let design = DesignMatrix::build(&evidence, config.reduction, &mut diagnostics)?;
        let summaries = Summaries::compute(&design.x, &design.y)?;

        let unmatched: Vec<&str> = diagnostics.unmatched_proteins().collect();
        let degenerate: Vec<usize> = summaries
            .degenerate_columns()
            .filter(|&q| !unmatched.contains(&evidence.protein(q)))
            .collect();
        for q in degenerate {
            diagnostics.push(Warning::DegenerateColumn {
                accession: evidence.protein(q).to_string(),
            });
        }

        Ok(Self {
            config: config.clone(),
            evidence,
            design,
            summaries,
            diagnostics,
        })
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    pub fn evidence(&self) -> &EvidenceIndex {
        &self.evidence
    }

    pub fn design(&self) -> &DesignMatrix {
        &self.design
    }

    pub fn summaries(&self) -> &Summaries {
        &self.summaries
    }

    /// Warnings raised while building the problem.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn protein_count(&self) -> usize {
        self.evidence.protein_count()
    }

    pub fn peptide_count(&self) -> usize {
        self.evidence.peptide_count()
    }

    pub fn lambda_max(&self) -> f64 {
        self.summaries.lambda_max()
    }

    /// Default starting point: every coefficient at the configured initial value.
    pub fn initial_coefficients(&self) -> Vec<f64> {
        vec![self.config.initial_coefficient; self.protein_count()]
    }

    pub fn solver(&self) -> CoordinateDescent<'_> {
        CoordinateDescent::new(&self.summaries, &self.config)
    }

    /// Solve at `lambda` from the default starting point.
    pub fn solve(&self, lambda: f64) -> Result<SolveOutcome> {
        self.solve_from(&self.initial_coefficients(), lambda)
    }

    /// Solve at `lambda` from a caller-supplied warm start.
    pub fn solve_from(&self, initial: &[f64], lambda: f64) -> Result<SolveOutcome> {
        let outcome = self.solver().solve(initial, lambda)?;
        log::info!(
            "lambda {}: {} of {} proteins positive after {} sweeps",
            lambda,
            outcome.support_size(),
            self.protein_count(),
            outcome.sweeps
        );
        Ok(outcome)
    }

    /// Solve independently at every penalty, in parallel. Results keep the input order.
    pub fn solve_many(&self, lambdas: &[f64]) -> Result<Vec<SolveOutcome>> {
        lambdas.par_iter().map(|&lambda| self.solve(lambda)).collect()
    }

    /// Final probability of one protein by accession.
    pub fn probability_of(&self, coefficients: &[f64], accession: &str) -> Option<f64> {
        self.evidence
            .protein_index(accession)
            .and_then(|q| coefficients.get(q).copied())
    }

    pub fn rank(&self, coefficients: &[f64]) -> Vec<ProteinProbability> {
        rank_proteins(&self.evidence, coefficients)
    }
}
