//! Sparse algebraic summaries of the design matrix.
//!
//! The solver never touches X directly. Everything it needs is computed
//! here once: X_j·Y for every protein, the symmetric X_j·X_k table and the
//! per-protein sum of squares. Pairwise products intersect per-protein
//! nonzero supports instead of scanning every peptide.
use rayon::prelude::*;

use crate::error::{ensure_finite, LassoError, Result};
use crate::math::{Array1, Array2};

/// Nonzero entries of one protein column as `(peptide index, weight)`,
/// ascending by peptide index.
pub type Support = Vec<(usize, f64)>;

#[derive(Debug, Clone, PartialEq)]
pub struct Summaries {
    supports: Vec<Support>,
    inner_product: Array1<f64>,
    x_inter_product: Array2<f64>,
    sum_of_squares: Array1<f64>,
    lambda_max: f64,
}

impl Summaries {
    /// Compute all summaries of `x` (peptides x proteins) against `y`.
    pub fn compute(x: &Array2<f64>, y: &Array1<f64>) -> Result<Self> {
        if y.len() != x.nrows() {
            return Err(LassoError::LengthMismatch {
                what: "peptide probability vector",
                expected: x.nrows(),
                found: y.len(),
            });
        }
        let protein_num = x.ncols();

        let supports: Vec<Support> = (0..protein_num)
            .into_par_iter()
            .map(|q| column_support(x, q))
            .collect();

        let inner_product: Array1<f64> = supports
            .iter()
            .map(|support| support.iter().map(|&(p, w)| w * y[p]).sum::<f64>())
            .collect();

        let sum_of_squares: Array1<f64> = supports
            .iter()
            .map(|support| support.iter().map(|&(_, w)| w * w).sum::<f64>())
            .collect();

        for (q, (&inner, &squares)) in inner_product
            .iter()
            .zip(sum_of_squares.iter())
            .enumerate()
        {
            ensure_finite(inner, || format!("X·Y of protein index {}", q))?;
            ensure_finite(squares, || format!("sum of squares of protein index {}", q))?;
        }

        let lambda_max = 2.0
            * inner_product
                .iter()
                .fold(0.0f64, |acc, &v| if acc < v { v } else { acc });
        ensure_finite(lambda_max, || "lambda_max".to_string())?;

        let upper: Vec<Vec<f64>> = (0..protein_num)
            .into_par_iter()
            .map(|m| {
                (m..protein_num)
                    .map(|i| sparse_dot(&supports[m], &supports[i]))
                    .collect()
            })
            .collect();

        let mut x_inter_product = Array2::zeros(protein_num, protein_num);
        for (m, row) in upper.into_iter().enumerate() {
            for (offset, value) in row.into_iter().enumerate() {
                let i = m + offset;
                ensure_finite(value, || format!("X·X of protein indices ({}, {})", m, i))?;
                x_inter_product[(m, i)] = value;
                x_inter_product[(i, m)] = value;
            }
        }

        log::info!(
            "Summaries for {} proteins: lambda_max = {}, {} nonzero design entries",
            protein_num,
            lambda_max,
            supports.iter().map(Vec::len).sum::<usize>()
        );

        Ok(Self {
            supports,
            inner_product,
            x_inter_product,
            sum_of_squares,
            lambda_max,
        })
    }

    pub fn protein_count(&self) -> usize {
        self.inner_product.len()
    }

    /// X_j·Y per protein.
    pub fn inner_product(&self) -> &Array1<f64> {
        &self.inner_product
    }

    /// Symmetric protein x protein table of X_m·X_i.
    pub fn x_inter_product(&self) -> &Array2<f64> {
        &self.x_inter_product
    }

    /// Σ_p X[p][q]² per protein.
    pub fn sum_of_squares(&self) -> &Array1<f64> {
        &self.sum_of_squares
    }

    /// Smallest penalty at which every coefficient is driven to zero.
    pub fn lambda_max(&self) -> f64 {
        self.lambda_max
    }

    pub fn support(&self, protein_idx: usize) -> &[(usize, f64)] {
        &self.supports[protein_idx]
    }

    /// Proteins whose column has no nonzero entry.
    pub fn degenerate_columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.sum_of_squares
            .iter()
            .enumerate()
            .filter(|&(_, &s)| s == 0.0)
            .map(|(q, _)| q)
    }
}

fn column_support(x: &Array2<f64>, q: usize) -> Support {
    (0..x.nrows())
        .filter_map(|p| {
            let w = x[(p, q)];
            if w != 0.0 {
                Some((p, w))
            } else {
                None
            }
        })
        .collect()
}

/// Dot product of two supports sorted by peptide index.
fn sparse_dot(a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut acc = 0.0;
    while i < a.len() && j < b.len() {
        let (pa, wa) = a[i];
        let (pb, wb) = b[j];
        if pa == pb {
            acc += wa * wb;
            i += 1;
            j += 1;
        } else if pa < pb {
            i += 1;
        } else {
            j += 1;
        }
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_dot_intersects_supports() {
        let a = vec![(0, 1.0), (2, 2.0), (5, 3.0)];
        let b = vec![(1, 4.0), (2, 0.5), (5, 2.0)];
        assert_eq!(sparse_dot(&a, &b), 1.0 + 6.0);
        assert_eq!(sparse_dot(&a, &[]), 0.0);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let x = Array2::from_shape_vec((2, 1), vec![0.5, 0.5]).unwrap();
        let y = Array1::from_vec(vec![1.0]);
        assert!(matches!(
            Summaries::compute(&x, &y),
            Err(LassoError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn diagonal_equals_sum_of_squares() {
        let x = Array2::from_shape_vec((3, 2), vec![0.6, 0.0, 0.4, 0.8, 0.0, 0.3]).unwrap();
        let y = Array1::from_vec(vec![0.9, 0.6, 0.5]);
        let s = Summaries::compute(&x, &y).unwrap();
        for q in 0..2 {
            assert_eq!(s.x_inter_product()[(q, q)], s.sum_of_squares()[q]);
        }
        assert!(s.x_inter_product().is_symmetric());
        assert_eq!(s.support(1), &[(1, 0.8), (2, 0.3)]);
    }

    #[test]
    fn overflowing_products_are_rejected() {
        let x = Array2::from_shape_vec((1, 1), vec![1e200]).unwrap();
        let y = Array1::from_vec(vec![0.9]);
        assert!(matches!(
            Summaries::compute(&x, &y),
            Err(LassoError::NonFinite { .. })
        ));
    }

    #[test]
    fn empty_columns_are_degenerate() {
        let x = Array2::from_shape_vec((2, 2), vec![0.5, 0.0, 0.5, 0.0]).unwrap();
        let y = Array1::from_vec(vec![1.0, 1.0]);
        let s = Summaries::compute(&x, &y).unwrap();
        assert_eq!(s.degenerate_columns().collect::<Vec<_>>(), vec![1]);
    }
}
