//! Integration tests for the full inference pipeline.

use protein_lasso::diagnostics::Warning;
use protein_lasso::{
    Convergence, EvidenceRecord, InferenceConfig, LassoError, ProbabilityReduction, ProteinLasso,
};

const EPS: f64 = 1e-9;

fn identifications() -> Vec<EvidenceRecord> {
    vec![
        EvidenceRecord::new("pepA", "P1", 0.9),
        EvidenceRecord::new("pepB", "P1;P2", 0.5),
        EvidenceRecord::new("pepB", "P2", 0.7),
    ]
}

fn detectability() -> Vec<EvidenceRecord> {
    vec![
        EvidenceRecord::new("pepA", "P1", 0.6),
        EvidenceRecord::new("pepB", "P1", 0.4),
        EvidenceRecord::new("pepB", "P2", 0.8),
    ]
}

fn two_protein_problem() -> ProteinLasso {
    ProteinLasso::from_records(identifications(), detectability(), &InferenceConfig::default())
        .unwrap()
}

/// Six proteins sharing peptides in overlapping blocks.
fn overlapping_problem(config: &InferenceConfig) -> ProteinLasso {
    let mut ids = Vec::new();
    let mut dets = Vec::new();
    for pep in 0..12usize {
        let sequence = format!("PEPTIDE{}K", pep);
        let first = pep / 2;
        let proteins = if pep % 3 == 0 && first + 1 < 6 {
            format!("PROT{};PROT{}", first, first + 1)
        } else {
            format!("PROT{}", first)
        };
        ids.push(EvidenceRecord::new(&sequence, &proteins, 0.5 + (pep % 5) as f64 * 0.1));
        for accession in proteins.split(';') {
            dets.push(EvidenceRecord::new(
                &sequence,
                accession,
                0.2 + ((pep * 7) % 9) as f64 * 0.08,
            ));
        }
    }
    ProteinLasso::from_records(ids, dets, config).unwrap()
}

// ---------------------------------------------------------------------------
// Worked two-protein scenario
// ---------------------------------------------------------------------------

#[test]
fn design_matrix_matches_hand_computation() {
    let problem = two_protein_problem();
    let evidence = problem.evidence();
    assert_eq!(evidence.peptides(), &["pepA".to_string(), "pepB".to_string()]);
    assert_eq!(evidence.proteins(), &["P1".to_string(), "P2".to_string()]);

    let design = problem.design();
    assert!((design.y[0] - 0.9).abs() < EPS);
    assert!((design.y[1] - 0.6).abs() < EPS);

    assert_eq!(design.x[(0, 0)], 0.6);
    assert_eq!(design.x[(0, 1)], 0.0);
    assert_eq!(design.x[(1, 0)], 0.4);
    assert_eq!(design.x[(1, 1)], 0.8);
}

#[test]
fn summaries_match_hand_computation() {
    let problem = two_protein_problem();
    let s = problem.summaries();
    assert!((s.inner_product()[0] - 0.78).abs() < EPS);
    assert!((s.inner_product()[1] - 0.48).abs() < EPS);
    assert!((s.x_inter_product()[(0, 1)] - 0.32).abs() < EPS);
    assert!((s.sum_of_squares()[0] - 0.52).abs() < EPS);
    assert!((s.sum_of_squares()[1] - 0.64).abs() < EPS);
    assert!((problem.lambda_max() - 1.56).abs() < EPS);
}

#[test]
fn unregularized_solution_is_the_algebraic_fixed_point() {
    let problem = two_protein_problem();
    let outcome = problem.solve(0.0).unwrap();
    assert!(outcome.converged());

    // coef[P1] clamps to 1; coef[P2] = (0.48 - 0.32 * 1) / 0.64
    let coef = outcome.coefficients.as_slice();
    assert_eq!(coef[0], 1.0);
    assert!((coef[1] - 0.25).abs() < EPS);
    assert_eq!(problem.probability_of(coef, "P2"), Some(coef[1]));
    assert_eq!(problem.probability_of(coef, "P9"), None);
}

#[test]
fn lambda_max_zeroes_every_coefficient() {
    let problem = two_protein_problem();
    let lambda_max = problem.lambda_max();

    for start in [vec![0.0, 0.0], vec![1.0, 1.0], vec![0.3, 0.9]] {
        let outcome = problem.solve_from(&start, lambda_max).unwrap();
        assert!(outcome.converged());
        assert!(outcome.coefficients.iter().all(|&c| c.abs() < EPS));
    }

    let above = problem.solve(lambda_max * 2.0).unwrap();
    assert_eq!(above.support_size(), 0);
}

#[test]
fn increasing_lambda_never_grows_the_support() {
    let problem = two_protein_problem();
    let lambdas = [0.0, 0.5, 1.0, 1.56];
    let outcomes = problem.solve_many(&lambdas).unwrap();

    let supports: Vec<usize> = outcomes.iter().map(|o| o.support_size()).collect();
    assert_eq!(supports, vec![2, 1, 1, 0]);
    for pair in supports.windows(2) {
        assert!(pair[1] <= pair[0]);
    }
    for (outcome, &lambda) in outcomes.iter().zip(lambdas.iter()) {
        assert_eq!(outcome.lambda, lambda);
    }
}

#[test]
fn ranking_orders_by_probability() {
    let problem = two_protein_problem();
    let outcome = problem.solve(0.0).unwrap();
    let rows = problem.rank(outcome.coefficients.as_slice());
    assert_eq!(rows[0].accession, "P1");
    assert_eq!(rows[0].peptide_count, 2);
    assert_eq!(rows[1].accession, "P2");
    assert_eq!(rows[1].unmodified_peptide_count, 1);
}

// ---------------------------------------------------------------------------
// Invariants on a larger fixture
// ---------------------------------------------------------------------------

#[test]
fn inputs_in_the_same_order_give_identical_results() {
    let config = InferenceConfig::default();
    let a = overlapping_problem(&config);
    let b = overlapping_problem(&config);

    assert_eq!(a.evidence().proteins(), b.evidence().proteins());
    assert_eq!(a.design(), b.design());
    assert_eq!(a.summaries(), b.summaries());

    let lambda = a.lambda_max() * 0.1;
    assert_eq!(
        a.solve(lambda).unwrap().coefficients,
        b.solve(lambda).unwrap().coefficients
    );
}

#[test]
fn inter_product_table_is_exactly_symmetric() {
    let problem = overlapping_problem(&InferenceConfig::default());
    let table = problem.summaries().x_inter_product();
    assert_eq!(table.shape(), (6, 6));
    assert!(table.is_symmetric());
}

#[test]
fn coefficients_stay_in_the_box_after_every_sweep() {
    let config = InferenceConfig {
        reduction: ProbabilityReduction::ConstantOne,
        ..InferenceConfig::default()
    };
    let problem = overlapping_problem(&config);
    let lambda = problem.lambda_max() * 0.05;
    let start = vec![0.5; problem.protein_count()];

    let full = problem.solve_from(&start, lambda).unwrap();
    assert!(full.converged());

    for cap in 1..=full.sweeps {
        let partial = problem
            .solver()
            .with_max_sweeps(Some(cap))
            .solve(&start, lambda)
            .unwrap();
        assert!(partial
            .coefficients
            .iter()
            .all(|&c| (0.0..=1.0).contains(&c)));
    }
}

#[test]
fn sweep_cap_is_reported_as_non_convergence() {
    let config = InferenceConfig {
        max_sweeps: Some(1),
        ..InferenceConfig::default()
    };
    let problem = overlapping_problem(&config);
    let outcome = problem.solve(0.0).unwrap();
    assert_eq!(outcome.convergence, Convergence::MaxSweepsReached);
    assert!(matches!(
        outcome.diagnostics.warnings()[0],
        Warning::NotConverged { sweeps: 1, .. }
    ));
}

// ---------------------------------------------------------------------------
// Detectability fallbacks and unmatched proteins
// ---------------------------------------------------------------------------

#[test]
fn substring_and_median_fallbacks_resolve_weights() {
    let ids = vec![
        EvidenceRecord::new("PEPTIDE", "P1", 0.9),
        EvidenceRecord::new("ZZZ", "P2", 0.8),
    ];
    let dets = vec![
        EvidenceRecord::new("APEPTIDE", "P1", 0.3),
        EvidenceRecord::new("PEPTIDEK", "P1", 0.8),
        EvidenceRecord::new("AAA", "P2", 0.3),
        EvidenceRecord::new("BBB", "P2", 0.9),
        EvidenceRecord::new("CCC", "P2", 0.6),
    ];
    let problem = ProteinLasso::from_records(ids, dets, &InferenceConfig::default()).unwrap();
    let x = &problem.design().x;

    assert_eq!(x[(0, 0)], 0.8);
    assert!((x[(1, 1)] - 0.3).abs() < EPS);
    assert_eq!(problem.evidence().fallback_score("P2"), Some(0.9 / 3.0));
}

#[test]
fn unmatched_protein_gets_a_zero_column_and_keeps_its_start() {
    let mut ids = identifications();
    ids.push(EvidenceRecord::new("pepC", "sp|P3|EXTRA", 0.8));
    let config = InferenceConfig {
        initial_coefficient: 0.5,
        ..InferenceConfig::default()
    };
    let problem = ProteinLasso::from_records(ids, detectability(), &config).unwrap();

    let p3 = problem.evidence().protein_index("sp|P3").unwrap();
    assert_eq!(problem.summaries().sum_of_squares()[p3], 0.0);
    assert_eq!(
        problem.diagnostics().unmatched_proteins().collect::<Vec<_>>(),
        vec!["sp|P3"]
    );
    assert!(!problem
        .diagnostics()
        .warnings()
        .iter()
        .any(|w| matches!(w, Warning::DegenerateColumn { .. })));

    let outcome = problem.solve(0.0).unwrap();
    assert_eq!(outcome.coefficients[p3], 0.5);
}

#[test]
fn max_reduction_uses_the_best_probability() {
    let config = InferenceConfig::new(ProbabilityReduction::Max);
    let problem = ProteinLasso::from_records(identifications(), detectability(), &config).unwrap();
    assert_eq!(problem.design().y[1], 0.7);
}

#[test]
fn overflowing_detectability_is_an_error_not_a_zero() {
    let ids = vec![EvidenceRecord::new("PEPA", "P1", 0.9)];
    let dets = vec![EvidenceRecord::new("PEPA", "P1", 1e200)];
    let err = ProteinLasso::from_records(ids, dets, &InferenceConfig::default()).unwrap_err();
    assert!(matches!(err, LassoError::NonFinite { .. }));
}

#[test]
fn invalid_config_is_rejected() {
    let config = InferenceConfig {
        tolerance: -1.0,
        ..InferenceConfig::default()
    };
    assert!(ProteinLasso::from_records(identifications(), detectability(), &config).is_err());
}
