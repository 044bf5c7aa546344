//! Evidence index: normalized, deduplicated peptide/protein mappings.
//!
//! Two ordered relations feed the index. Identification rows assign peptide
//! and protein indices in first-seen order and accumulate peptide
//! probabilities; detectability rows attach a predicted score to each
//! (protein, peptide) pair. [`EvidenceIndexBuilder::finish`] freezes the
//! mappings and derives each protein's median fallback score.
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::diagnostics::{Diagnostics, Relation, Warning};
use crate::error::{ensure_finite, LassoError, Result};

/// One row of an input relation. `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EvidenceRecord {
    pub peptide: Option<String>,
    /// Accession field, possibly several accessions joined by `;`.
    pub proteins: Option<String>,
    /// Identification probability or detectability score, depending on the relation.
    pub value: Option<f64>,
}

impl EvidenceRecord {
    pub fn new(peptide: &str, proteins: &str, value: f64) -> Self {
        Self {
            peptide: Some(peptide.to_string()),
            proteins: Some(proteins.to_string()),
            value: Some(value),
        }
    }

    fn fields(&self) -> Option<(&str, &str, f64)> {
        Some((self.peptide.as_deref()?, self.proteins.as_deref()?, self.value?))
    }
}

/// Normalize a protein accession: keep everything before the last `|`,
/// otherwise trim surrounding whitespace.
pub fn normalize_accession(raw: &str) -> &str {
    match raw.rfind('|') {
        Some(pos) => &raw[..pos],
        None => raw.trim(),
    }
}

/// Fallback detectability of a protein: the value at index `ceil(count / 2)`
/// of the ascending-sorted scores, divided by 3.
///
/// For even counts this is the upper of the two middle values rather than
/// their mean. A single score uses index 0.
pub fn median_fallback<I>(scores: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut sorted: Vec<f64> = scores.into_iter().collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    let idx = sorted.len().div_ceil(2).min(sorted.len() - 1);
    Some(sorted[idx] / 3.0)
}

/// Accumulates the two relations. Consumed by [`EvidenceIndexBuilder::finish`].
#[derive(Debug, Default)]
pub struct EvidenceIndexBuilder {
    peptide_index: HashMap<String, usize>,
    peptides: Vec<String>,
    probabilities: Vec<Vec<f64>>,
    protein_index: HashMap<String, usize>,
    proteins: Vec<String>,
    protein_peptides: Vec<Vec<usize>>,
    edges: HashSet<(usize, usize)>,
    detectability: HashMap<String, BTreeMap<String, f64>>,
    identification_rows: usize,
    detectability_rows: usize,
}

impl EvidenceIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest identification rows in order.
    ///
    /// Rows with a missing field are skipped. A peptide gets its index the
    /// first time a complete row names it; each `;`-separated accession gets
    /// its protein index the same way. Repeated calls continue the numbering.
    pub fn ingest_identifications<I>(&mut self, rows: I, diagnostics: &mut Diagnostics) -> Result<()>
    where
        I: IntoIterator<Item = EvidenceRecord>,
    {
        for record in rows {
            self.identification_rows += 1;
            let row = self.identification_rows;
            let Some((peptide, accessions, probability)) = record.fields() else {
                diagnostics.push(Warning::SkippedRow {
                    relation: Relation::Identification,
                    row,
                });
                continue;
            };
            ensure_finite(probability, || {
                format!("identification row {} (peptide '{}')", row, peptide)
            })?;

            let peptide_idx = self.intern_peptide(peptide);
            self.probabilities[peptide_idx].push(probability);

            for token in accessions.split(';') {
                let accession = normalize_accession(token);
                // trailing and inner empty tokens alike: reported, never indexed as ""
                if accession.is_empty() {
                    diagnostics.push(Warning::EmptyAccession {
                        relation: Relation::Identification,
                        row,
                    });
                    continue;
                }
                let protein_idx = self.intern_protein(accession);
                if self.edges.insert((protein_idx, peptide_idx)) {
                    self.protein_peptides[protein_idx].push(peptide_idx);
                }
            }
        }
        Ok(())
    }

    /// Ingest detectability rows in order.
    ///
    /// When a (protein, peptide) pair is seen twice the larger score is kept.
    /// Negative or non-finite scores are rejected.
    pub fn ingest_detectability<I>(&mut self, rows: I, diagnostics: &mut Diagnostics) -> Result<()>
    where
        I: IntoIterator<Item = EvidenceRecord>,
    {
        for record in rows {
            self.detectability_rows += 1;
            let row = self.detectability_rows;
            let Some((peptide, accessions, score)) = record.fields() else {
                diagnostics.push(Warning::SkippedRow {
                    relation: Relation::Detectability,
                    row,
                });
                continue;
            };
            ensure_finite(score, || {
                format!("detectability row {} (peptide '{}')", row, peptide)
            })?;

            for token in accessions.split(';') {
                let accession = normalize_accession(token);
                if accession.is_empty() {
                    diagnostics.push(Warning::EmptyAccession {
                        relation: Relation::Detectability,
                        row,
                    });
                    continue;
                }
                if score < 0.0 {
                    return Err(LassoError::NegativeDetectability {
                        peptide: peptide.to_string(),
                        protein: accession.to_string(),
                        value: score,
                    });
                }
                let scores = self.detectability.entry(accession.to_string()).or_default();
                scores
                    .entry(peptide.to_string())
                    .and_modify(|current| {
                        if score > *current {
                            *current = score;
                        }
                    })
                    .or_insert(score);
            }
        }
        Ok(())
    }

    fn intern_peptide(&mut self, peptide: &str) -> usize {
        if let Some(&idx) = self.peptide_index.get(peptide) {
            return idx;
        }
        let idx = self.peptides.len();
        self.peptide_index.insert(peptide.to_string(), idx);
        self.peptides.push(peptide.to_string());
        self.probabilities.push(Vec::new());
        idx
    }

    fn intern_protein(&mut self, accession: &str) -> usize {
        if let Some(&idx) = self.protein_index.get(accession) {
            return idx;
        }
        let idx = self.proteins.len();
        self.protein_index.insert(accession.to_string(), idx);
        self.proteins.push(accession.to_string());
        self.protein_peptides.push(Vec::new());
        idx
    }

    /// Freeze the mappings and compute fallback scores.
    pub fn finish(self) -> EvidenceIndex {
        let fallback = self
            .detectability
            .iter()
            .filter_map(|(accession, scores)| {
                median_fallback(scores.values().copied()).map(|f| (accession.clone(), f))
            })
            .collect::<HashMap<_, _>>();

        log::info!(
            "Evidence index: {} peptides, {} proteins from {} identification rows; {} proteins with detectability from {} rows",
            self.peptides.len(),
            self.proteins.len(),
            self.identification_rows,
            self.detectability.len(),
            self.detectability_rows
        );

        EvidenceIndex {
            peptide_index: self.peptide_index,
            peptides: self.peptides,
            probabilities: self.probabilities,
            protein_index: self.protein_index,
            proteins: self.proteins,
            protein_peptides: self.protein_peptides,
            detectability: self.detectability,
            fallback,
        }
    }
}

/// Read-only peptide/protein mappings produced by ingestion.
#[derive(Debug, Clone)]
pub struct EvidenceIndex {
    peptide_index: HashMap<String, usize>,
    peptides: Vec<String>,
    probabilities: Vec<Vec<f64>>,
    protein_index: HashMap<String, usize>,
    proteins: Vec<String>,
    protein_peptides: Vec<Vec<usize>>,
    detectability: HashMap<String, BTreeMap<String, f64>>,
    fallback: HashMap<String, f64>,
}

impl EvidenceIndex {
    /// Build an index from both relations in one go.
    pub fn from_records<I, D>(
        identifications: I,
        detectability: D,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = EvidenceRecord>,
        D: IntoIterator<Item = EvidenceRecord>,
    {
        let mut builder = EvidenceIndexBuilder::new();
        builder.ingest_identifications(identifications, diagnostics)?;
        builder.ingest_detectability(detectability, diagnostics)?;
        Ok(builder.finish())
    }

    pub fn peptide_count(&self) -> usize {
        self.peptides.len()
    }

    pub fn protein_count(&self) -> usize {
        self.proteins.len()
    }

    pub fn peptide(&self, idx: usize) -> &str {
        &self.peptides[idx]
    }

    pub fn protein(&self, idx: usize) -> &str {
        &self.proteins[idx]
    }

    pub fn peptides(&self) -> &[String] {
        &self.peptides
    }

    pub fn proteins(&self) -> &[String] {
        &self.proteins
    }

    pub fn peptide_index(&self, peptide: &str) -> Option<usize> {
        self.peptide_index.get(peptide).copied()
    }

    pub fn protein_index(&self, accession: &str) -> Option<usize> {
        self.protein_index.get(accession).copied()
    }

    /// Observed identification probabilities of a peptide, in row order.
    pub fn probabilities(&self, peptide_idx: usize) -> &[f64] {
        &self.probabilities[peptide_idx]
    }

    /// Peptide indices connected to a protein, without duplicates.
    pub fn protein_peptides(&self, protein_idx: usize) -> &[usize] {
        &self.protein_peptides[protein_idx]
    }

    /// Detectability scores recorded for a protein, keyed by peptide sequence.
    pub fn detectability(&self, accession: &str) -> Option<&BTreeMap<String, f64>> {
        self.detectability.get(accession)
    }

    pub fn fallback_score(&self, accession: &str) -> Option<f64> {
        self.fallback.get(accession).copied()
    }
}
