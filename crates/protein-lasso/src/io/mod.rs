//! Delimited-text adapters for the two input relations and the result table.
pub mod relations;
pub mod table;

pub use relations::{
    read_detectability, read_identifications, read_relation, RelationColumns,
};
pub use table::{write_protein_table, write_protein_table_to};

use std::path::Path;

/// `,` for `.csv` files, tab otherwise.
pub fn delimiter_for<P: AsRef<Path>>(path: P) -> u8 {
    match path
        .as_ref()
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .as_deref()
    {
        Some("csv") => b',',
        _ => b'\t',
    }
}
