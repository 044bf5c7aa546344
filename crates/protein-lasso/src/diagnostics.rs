//! Structured warnings collected during a run.
//!
//! Every warning is also forwarded to the `log` facade, so command line
//! users see them through env_logger while library callers can inspect the
//! collected list.
use std::fmt;

use serde::Serialize;

/// Which input relation a row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Identification,
    Detectability,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Identification => write!(f, "identification"),
            Relation::Detectability => write!(f, "detectability"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Row lacked a required field and was dropped.
    SkippedRow { relation: Relation, row: usize },
    /// A `;`-separated accession token was empty after normalization.
    EmptyAccession { relation: Relation, row: usize },
    /// Protein named by identifications has no detectability entries; its column stays zero.
    UnmatchedProtein { accession: String },
    /// Protein column has zero sum of squares; its coefficient is frozen.
    DegenerateColumn { accession: String },
    /// Solver hit the sweep cap before stabilising.
    NotConverged { lambda: f64, sweeps: usize },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::SkippedRow { relation, row } => {
                write!(f, "{} row {} has a missing field and was skipped", relation, row)
            }
            Warning::EmptyAccession { relation, row } => {
                write!(f, "{} row {} contains an empty protein accession", relation, row)
            }
            Warning::UnmatchedProtein { accession } => {
                write!(f, "{} is not included in the detectability relation", accession)
            }
            Warning::DegenerateColumn { accession } => write!(
                f,
                "{} has no nonzero evidence; its coefficient keeps its initial value",
                accession
            ),
            Warning::NotConverged { lambda, sweeps } => write!(
                f,
                "coordinate descent at lambda {} did not converge within {} sweeps",
                lambda, sweeps
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: Warning) {
        match &warning {
            Warning::SkippedRow { .. } => log::debug!("{}", warning),
            _ => log::warn!("{}", warning),
        }
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn count_skipped_rows(&self, relation: Relation) -> usize {
        self.warnings
            .iter()
            .filter(|w| matches!(w, Warning::SkippedRow { relation: r, .. } if *r == relation))
            .count()
    }

    pub fn unmatched_proteins(&self) -> impl Iterator<Item = &str> {
        self.warnings.iter().filter_map(|w| match w {
            Warning::UnmatchedProtein { accession } => Some(accession.as_str()),
            _ => None,
        })
    }
}
