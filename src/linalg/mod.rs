#![allow(non_snake_case)]

//! Linear algebra used by the estimators.

pub mod cholesky;
pub mod expm;
pub mod rcond;

use nalgebra::{allocator::Allocator, DefaultAllocator, Dim, MatrixN, RealField};

use crate::error::{check_non_negative, EstimateError, EstimateResult};

/// Force a matrix to be symmetric, M = (M + M') / 2.
///
/// Removes the asymmetry that roundoff accumulates in products such as F.X.F'.
pub fn symmetrise<N: RealField, D: Dim>(M: &mut MatrixN<N, D>)
where
    DefaultAllocator: Allocator<N, D, D>,
{
    let half = N::one() / (N::one() + N::one());
    let n = M.nrows();
    for j in 0..n {
        for i in 0..j {
            let e = (M[(i, j)] + M[(j, i)]) * half;
            M[(i, j)] = e;
            M[(j, i)] = e;
        }
    }
}

/// Checks a matrix is symmetric (within a relative tolerance) and positive semi-definite.
pub fn check_psd<N: RealField, D: Dim>(M: &MatrixN<N, D>, tolerance: N, what: &'static str) -> EstimateResult<N>
where
    DefaultAllocator: Allocator<N, D, D>,
{
    let n = M.nrows();
    let scale = M.iter().fold(N::zero(), |m, &e| if e.abs() > m { e.abs() } else { m });
    for j in 0..n {
        for i in 0..j {
            if (M[(i, j)] - M[(j, i)]).abs() > tolerance * scale {
                return Err(EstimateError::NotPsd(what));
            }
        }
    }
    check_non_negative(cholesky::psd_rcond(M), what)
}
