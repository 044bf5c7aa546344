//! Peptide x protein detectability matrix (X) and peptide probability vector (Y).
use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::config::ProbabilityReduction;
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{ensure_finite, Result};
use crate::evidence::EvidenceIndex;
use crate::math::{Array1, Array2};

/// How a (protein, peptide) edge got its weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// The detectability relation has the identified sequence itself.
    Exact,
    /// Longest detectability key containing, or contained in, the sequence.
    Substring,
    /// No key matched; the protein's median fallback was used.
    ProteinMedian,
}

/// Resolve the detectability weight of `peptide` against one protein's scores.
///
/// Exact match first. Otherwise every key that contains `peptide` or is
/// contained in it is a candidate; the longest candidate wins and equal
/// lengths prefer the higher score. With no candidate the `fallback` is used.
pub fn resolve_detectability(
    peptide: &str,
    scores: &BTreeMap<String, f64>,
    fallback: f64,
) -> (f64, MatchKind) {
    if let Some(&score) = scores.get(peptide) {
        return (score, MatchKind::Exact);
    }

    let mut best: Option<(usize, f64)> = None;
    for (candidate, &score) in scores {
        if !(candidate.contains(peptide) || peptide.contains(candidate.as_str())) {
            continue;
        }
        let len = candidate.len();
        best = match best {
            None => Some((len, score)),
            Some((best_len, best_score)) => {
                if len > best_len || (len == best_len && score > best_score) {
                    Some((len, score))
                } else {
                    Some((best_len, best_score))
                }
            }
        };
    }

    match best {
        Some((_, score)) => (score, MatchKind::Substring),
        None => (fallback, MatchKind::ProteinMedian),
    }
}

/// Collapse a peptide's observed probabilities into one entry of Y.
pub fn reduce_probabilities(probabilities: &[f64], reduction: ProbabilityReduction) -> f64 {
    let values = Array1::from_vec(probabilities.to_vec());
    match reduction {
        // ingestion only indexes peptides from complete rows, so lists are never empty
        ProbabilityReduction::Average => values.mean().unwrap_or(0.0),
        ProbabilityReduction::Max => values.max().unwrap_or(0.0),
        ProbabilityReduction::ConstantOne => 1.0,
    }
}

/// Resolved column of one protein: `(peptide index, weight, how)` per declared edge.
type ResolvedColumn = Option<Vec<(usize, f64, MatchKind)>>;

#[derive(Debug, Clone, PartialEq)]
pub struct DesignMatrix {
    /// Peptides x proteins.
    pub x: Array2<f64>,
    /// One reduced probability per peptide.
    pub y: Array1<f64>,
}

impl DesignMatrix {
    /// Build X and Y from a frozen evidence index.
    ///
    /// Proteins with no detectability entries keep an all-zero column and are
    /// reported as [`Warning::UnmatchedProtein`].
    pub fn build(
        evidence: &EvidenceIndex,
        reduction: ProbabilityReduction,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self> {
        let peptide_num = evidence.peptide_count();
        let protein_num = evidence.protein_count();

        let y = (0..peptide_num)
            .map(|p| {
                let value = reduce_probabilities(evidence.probabilities(p), reduction);
                ensure_finite(value, || format!("probability of peptide '{}'", evidence.peptide(p)))
            })
            .collect::<Result<Vec<f64>>>()?;

        let columns: Vec<ResolvedColumn> = (0..protein_num)
            .into_par_iter()
            .map(|q| resolve_column(evidence, q))
            .collect();

        let mut x = Array2::zeros(peptide_num, protein_num);
        let (mut exact, mut substring, mut median) = (0usize, 0usize, 0usize);
        for (q, column) in columns.into_iter().enumerate() {
            let Some(column) = column else {
                diagnostics.push(Warning::UnmatchedProtein {
                    accession: evidence.protein(q).to_string(),
                });
                continue;
            };
            for (p, weight, kind) in column {
                match kind {
                    MatchKind::Exact => exact += 1,
                    MatchKind::Substring => substring += 1,
                    MatchKind::ProteinMedian => median += 1,
                }
                x[(p, q)] = weight;
            }
        }

        log::info!(
            "Design matrix {} x {} ({} reduction): {} exact, {} substring, {} median-fallback edges",
            peptide_num,
            protein_num,
            reduction.as_str(),
            exact,
            substring,
            median
        );

        Ok(Self {
            x,
            y: Array1::from_vec(y),
        })
    }

    pub fn peptide_count(&self) -> usize {
        self.x.nrows()
    }

    pub fn protein_count(&self) -> usize {
        self.x.ncols()
    }
}

fn resolve_column(evidence: &EvidenceIndex, q: usize) -> ResolvedColumn {
    let accession = evidence.protein(q);
    let scores = evidence.detectability(accession)?;
    let fallback = evidence.fallback_score(accession).unwrap_or(0.0);
    Some(
        evidence
            .protein_peptides(q)
            .iter()
            .map(|&p| {
                let (weight, kind) = resolve_detectability(evidence.peptide(p), scores, fallback);
                (p, weight, kind)
            })
            .collect(),
    )
}
