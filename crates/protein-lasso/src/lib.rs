//! protein-lasso: protein inference from peptide evidence.
//!
//! Identified peptides and their candidate parent proteins form a bipartite
//! evidence graph weighted by predicted peptide detectability. Each protein
//! receives a probability in [0, 1] from a box-constrained, L1-regularized
//! least-squares fit solved by coordinate descent; proteins whose evidence
//! is already explained by others are driven to zero.
//!
//! The pipeline runs leaf-first: [`evidence`] ingests the two input
//! relations, [`design_matrix`] resolves edge weights, [`summary`]
//! precomputes the inner products the [`solver`] reuses across penalties.
//! [`pipeline::ProteinLasso`] wires these together.
pub mod config;
pub mod design_matrix;
pub mod diagnostics;
pub mod error;
pub mod evidence;
pub mod io;
pub mod math;
pub mod pipeline;
pub mod report;
pub mod solver;
pub mod summary;

pub use config::{InferenceConfig, ProbabilityReduction};
pub use diagnostics::{Diagnostics, Warning};
pub use error::LassoError;
pub use evidence::{EvidenceIndex, EvidenceRecord};
pub use pipeline::ProteinLasso;
pub use report::ProteinProbability;
pub use solver::{Convergence, SolveOutcome};
