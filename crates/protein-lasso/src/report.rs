//! Presentation table: proteins ranked by inferred probability.
use std::borrow::Cow;
use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::evidence::EvidenceIndex;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProteinProbability {
    pub accession: String,
    /// Protein index from ingestion (first-seen order).
    pub index: usize,
    pub probability: f64,
    /// Distinct peptide sequences as identified, modifications included.
    pub peptide_count: usize,
    /// Distinct peptide sequences after stripping `(...)` modification annotations.
    pub unmodified_peptide_count: usize,
}

static MODIFICATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]+\)").unwrap());

/// Remove every non-empty parenthesised modification annotation.
pub fn strip_modifications(sequence: &str) -> Cow<'_, str> {
    MODIFICATION.replace_all(sequence, "")
}

/// Rank proteins by descending probability.
///
/// The sort is stable, so equal probabilities keep ascending protein index.
pub fn rank_proteins(evidence: &EvidenceIndex, coefficients: &[f64]) -> Vec<ProteinProbability> {
    let mut rows: Vec<ProteinProbability> = coefficients
        .iter()
        .enumerate()
        .take(evidence.protein_count())
        .map(|(q, &probability)| {
            let peptides = evidence.protein_peptides(q);
            let unmodified: HashSet<Cow<'_, str>> = peptides
                .iter()
                .map(|&p| strip_modifications(evidence.peptide(p)))
                .collect();
            ProteinProbability {
                accession: evidence.protein(q).to_string(),
                index: q,
                probability,
                peptide_count: peptides.len(),
                unmodified_peptide_count: unmodified.len(),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::evidence::EvidenceRecord;

    #[test]
    fn strips_modification_annotations() {
        assert_eq!(strip_modifications("PEPM(Oxidation)TIDE"), "PEPMTIDE");
        assert_eq!(strip_modifications("(Acetyl)PEPC(Carbamidomethyl)K"), "PEPCK");
        assert_eq!(strip_modifications("PEP()TIDE"), "PEP()TIDE");
        assert_eq!(strip_modifications("PEPTIDE"), "PEPTIDE");
    }

    #[test]
    fn ranking_is_descending_and_stable() {
        let mut diagnostics = Diagnostics::new();
        let evidence = EvidenceIndex::from_records(
            vec![
                EvidenceRecord::new("PEPM(Oxidation)K", "P1", 0.9),
                EvidenceRecord::new("PEPMK", "P1", 0.9),
                EvidenceRecord::new("AAAK", "P2", 0.5),
                EvidenceRecord::new("CCCK", "P3", 0.5),
            ],
            Vec::new(),
            &mut diagnostics,
        )
        .unwrap();

        let rows = rank_proteins(&evidence, &[0.5, 1.0, 0.5]);
        let order: Vec<&str> = rows.iter().map(|r| r.accession.as_str()).collect();
        assert_eq!(order, vec!["P2", "P1", "P3"]);

        let p1 = rows.iter().find(|r| r.accession == "P1").unwrap();
        assert_eq!(p1.peptide_count, 2);
        assert_eq!(p1.unmodified_peptide_count, 1);
    }
}
