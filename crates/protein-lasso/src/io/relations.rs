//! Reader for identification and detectability tables.
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::StringRecord;
use serde::{Deserialize, Serialize};

use crate::evidence::EvidenceRecord;
use crate::io::delimiter_for;

/// Header names of the three columns a relation provides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationColumns {
    pub peptide: String,
    pub protein: String,
    pub value: String,
}

impl RelationColumns {
    pub fn identification() -> Self {
        Self {
            peptide: "peptide".to_string(),
            protein: "protein".to_string(),
            value: "probability".to_string(),
        }
    }

    pub fn detectability() -> Self {
        Self {
            value: "detectability".to_string(),
            ..Self::identification()
        }
    }
}

impl Default for RelationColumns {
    fn default() -> Self {
        Self::identification()
    }
}

/// Read the identification relation from a `.tsv`/`.csv` file.
pub fn read_identifications<P: AsRef<Path>>(
    path: P,
    columns: &RelationColumns,
) -> Result<Vec<EvidenceRecord>> {
    read_relation_file(path, columns)
}

/// Read the detectability relation from a `.tsv`/`.csv` file.
pub fn read_detectability<P: AsRef<Path>>(
    path: P,
    columns: &RelationColumns,
) -> Result<Vec<EvidenceRecord>> {
    read_relation_file(path, columns)
}

fn read_relation_file<P: AsRef<Path>>(
    path: P,
    columns: &RelationColumns,
) -> Result<Vec<EvidenceRecord>> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open relation file: {}", path.as_ref().display()))?;
    read_relation(file, delimiter_for(&path), columns)
        .with_context(|| format!("Failed to read relation file: {}", path.as_ref().display()))
}

/// Read a relation with a header row from any reader.
///
/// Empty cells become missing fields; ingestion skips those rows. A value
/// that is present but not a number is an error.
pub fn read_relation<R: Read>(
    reader: R,
    delimiter: u8,
    columns: &RelationColumns,
) -> Result<Vec<EvidenceRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers().context("Failed to read header row")?.clone();
    let peptide_idx = require_column(&headers, &columns.peptide)?;
    let protein_idx = require_column(&headers, &columns.protein)?;
    let value_idx = require_column(&headers, &columns.value)?;

    let mut records = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;

        let value = match cell(&record, value_idx) {
            Some(raw) => Some(raw.parse::<f64>().with_context(|| {
                format!(
                    "Invalid value '{}' in column '{}' at row {}",
                    raw,
                    columns.value,
                    row_idx + 1
                )
            })?),
            None => None,
        };

        records.push(EvidenceRecord {
            peptide: cell(&record, peptide_idx).map(str::to_string),
            proteins: cell(&record, protein_idx).map(str::to_string),
            value,
        });
    }

    log::debug!("Read {} rows", records.len());
    Ok(records)
}

fn cell(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).map(str::trim).filter(|v| !v.is_empty())
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case(name))
}

fn require_column(headers: &StringRecord, name: &str) -> Result<usize> {
    find_column(headers, name).ok_or_else(|| anyhow!("Missing column '{}'", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_rows_and_blank_cells() {
        let data = "peptide\tprotein\tprobability\n\
                    PEPA\tP1;P2\t0.9\n\
                    PEPB\t\t0.5\n\
                    PEPC\tP3\t\n";
        let rows = read_relation(data.as_bytes(), b'\t', &RelationColumns::identification()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], EvidenceRecord::new("PEPA", "P1;P2", 0.9));
        assert!(rows[1].proteins.is_none());
        assert!(rows[2].value.is_none());
    }

    #[test]
    fn column_lookup_is_case_insensitive() {
        let data = "Peptide,Protein,Detectability\nPEPA,P1,0.4\n";
        let rows = read_relation(data.as_bytes(), b',', &RelationColumns::detectability()).unwrap();
        assert_eq!(rows[0].value, Some(0.4));
    }

    #[test]
    fn missing_column_errors() {
        let data = "peptide\tprotein\nPEPA\tP1\n";
        let err = read_relation(data.as_bytes(), b'\t', &RelationColumns::identification()).unwrap_err();
        assert!(err.to_string().contains("probability"));
    }

    #[test]
    fn unparsable_value_errors() {
        let data = "peptide\tprotein\tprobability\nPEPA\tP1\thigh\n";
        assert!(read_relation(data.as_bytes(), b'\t', &RelationColumns::identification()).is_err());
    }
}
