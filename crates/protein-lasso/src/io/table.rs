//! Writer for the ranked protein table.
use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::io::delimiter_for;
use crate::report::ProteinProbability;

pub const TABLE_HEADER: [&str; 4] = ["protein", "probability", "peptides", "unmodified_peptides"];

/// Write ranked proteins to a `.tsv`/`.csv` file.
pub fn write_protein_table<P: AsRef<Path>>(path: P, rows: &[ProteinProbability]) -> Result<()> {
    let file = File::create(&path)
        .with_context(|| format!("Failed to create output file: {}", path.as_ref().display()))?;
    write_protein_table_to(file, delimiter_for(&path), rows)
        .with_context(|| format!("Failed to write output file: {}", path.as_ref().display()))
}

/// Write ranked proteins to any writer, one row per protein in the given order.
pub fn write_protein_table_to<W: Write>(
    writer: W,
    delimiter: u8,
    rows: &[ProteinProbability],
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);
    writer.write_record(TABLE_HEADER)?;
    for row in rows {
        writer.write_record([
            row.accession.clone(),
            row.probability.to_string(),
            row.peptide_count.to_string(),
            row.unmodified_peptide_count.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
