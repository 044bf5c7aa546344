//! `infer` and `lambda-max` command helpers.
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use protein_lasso::io::{
    read_detectability, read_identifications, write_protein_table, write_protein_table_to,
    RelationColumns,
};
use protein_lasso::{InferenceConfig, ProteinLasso, ProteinProbability, SolveOutcome};

/// Parameters for one inference run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferConfig {
    pub inference: InferenceConfig,
    pub identification_columns: RelationColumns,
    pub detectability_columns: RelationColumns,
    /// Absolute penalty. Takes precedence over `lambda_fraction`.
    pub lambda: Option<f64>,
    /// Penalty as a fraction of lambda_max.
    pub lambda_fraction: Option<f64>,
}

impl Default for InferConfig {
    fn default() -> Self {
        Self {
            inference: InferenceConfig::default(),
            identification_columns: RelationColumns::identification(),
            detectability_columns: RelationColumns::detectability(),
            lambda: None,
            lambda_fraction: None,
        }
    }
}

impl InferConfig {
    /// Penalty to solve at, given the problem's lambda_max. Defaults to 0.
    pub fn resolve_lambda(&self, lambda_max: f64) -> Result<f64> {
        match (self.lambda, self.lambda_fraction) {
            (Some(lambda), _) => Ok(lambda),
            (None, Some(fraction)) => {
                if !fraction.is_finite() || fraction < 0.0 {
                    bail!("lambda_fraction must be finite and non-negative, got {}", fraction);
                }
                Ok(fraction * lambda_max)
            }
            (None, None) => Ok(0.0),
        }
    }
}

/// Result of an inference run.
#[derive(Debug)]
pub struct InferResult {
    pub lambda_max: f64,
    pub outcome: SolveOutcome,
    pub proteins: Vec<ProteinProbability>,
}

/// Load an inference configuration from a JSON file.
pub fn load_infer_config<P: AsRef<Path>>(path: P) -> Result<InferConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: InferConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    Ok(config)
}

/// Read both relations and prepare the problem.
pub fn prepare_problem<P: AsRef<Path>>(
    identifications: P,
    detectability: P,
    config: &InferConfig,
) -> Result<ProteinLasso> {
    let ids = read_identifications(&identifications, &config.identification_columns)?;
    let dets = read_detectability(&detectability, &config.detectability_columns)?;
    let problem = ProteinLasso::from_records(ids, dets, &config.inference)
        .context("Failed to build the inference problem")?;
    Ok(problem)
}

/// Run protein inference on the two relation files.
pub fn run_inference<P: AsRef<Path>>(
    identifications: P,
    detectability: P,
    config: &InferConfig,
) -> Result<InferResult> {
    let problem = prepare_problem(identifications, detectability, config)?;
    let lambda_max = problem.lambda_max();
    let lambda = config.resolve_lambda(lambda_max)?;
    log::info!("Solving at lambda {} (lambda_max {})", lambda, lambda_max);

    let outcome = problem
        .solve(lambda)
        .with_context(|| format!("Coordinate descent failed at lambda {}", lambda))?;
    let proteins = problem.rank(outcome.coefficients.as_slice());

    Ok(InferResult {
        lambda_max,
        outcome,
        proteins,
    })
}

/// Write the ranked protein table to `output`, or tab-separated to stdout.
pub fn write_infer_output(result: &InferResult, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => write_protein_table(path, &result.proteins),
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            write_protein_table_to(&mut handle, b'\t', &result.proteins)?;
            handle.flush()?;
            Ok(())
        }
    }
}
