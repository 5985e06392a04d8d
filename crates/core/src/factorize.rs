//! Cholesky factorization of CPSD matrices
//!
//! Each slice gets `1e-12·I` added before decomposition. A slice that is still
//! not positive definite is a terminal error for the call: raising the
//! regularization silently would hide ill-conditioning such as duplicated
//! points.
//!
//! Slices containing NaN or Inf (heights below the zero-plane
//! displacement) are not rejected. The leading block before the first
//! non-finite row is factorized as usual and every factor row from there on
//! is NaN, which is what the decomposition yields when NaN flows through it.
//! The degradation reaches the samples unchanged.

use crate::params::constants::CHOLESKY_REGULARIZATION;
use nalgebra::{Cholesky, DMatrix};

/// Lower-triangular factor of a regularized CPSD slice
///
/// Returns `None` if the regularized slice is not positive definite.
#[must_use]
pub fn factorize_slice(cpsd: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    factorize_slice_with(cpsd, CHOLESKY_REGULARIZATION)
}

/// Same as [`factorize_slice`] with an explicit diagonal regularization
#[must_use]
pub fn factorize_slice_with(cpsd: &DMatrix<f64>, regularization: f64) -> Option<DMatrix<f64>> {
    let n = cpsd.nrows();
    let first_bad = (0..n).find(|&i| (0..=i).any(|j| !cpsd[(i, j)].is_finite()));

    match first_bad {
        None => cholesky_regularized(cpsd.clone(), regularization),
        Some(k) => {
            let mut factor = DMatrix::from_fn(n, n, |i, j| {
                if i >= k && j <= i {
                    f64::NAN
                } else {
                    0.0
                }
            });
            if k > 0 {
                let leading =
                    cholesky_regularized(cpsd.view((0, 0), (k, k)).into_owned(), regularization)?;
                factor.view_mut((0, 0), (k, k)).copy_from(&leading);
            }
            Some(factor)
        }
    }
}

fn cholesky_regularized(mut matrix: DMatrix<f64>, regularization: f64) -> Option<DMatrix<f64>> {
    for i in 0..matrix.nrows() {
        matrix[(i, i)] += regularization;
    }
    Cholesky::new(matrix).map(Cholesky::unpack)
}

/// Factorize a sequence of slices, reporting the index of the first failure
///
/// # Errors
///
/// Returns the index of the first slice that is not positive definite.
pub fn factorize_all(cpsd: &[DMatrix<f64>]) -> Result<Vec<DMatrix<f64>>, usize> {
    cpsd.iter()
        .enumerate()
        .map(|(idx, slice)| factorize_slice(slice).ok_or(idx))
        .collect()
}
