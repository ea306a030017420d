#![allow(non_snake_case)]

//! Modified Cholesky factorisation.
//!
//! UdU' factorisation of positive semi-definite matrices. Where:
//! U is unit upper triangular
//! d is diagonal
//!
//! Storage:
//! strict_upper_triangle(UD) = strict_upper_triangle(U), diagonal(UD) = d, strict_lower_triangle(UD) ignored

use nalgebra::{allocator::Allocator, storage::Storage, DefaultAllocator, Dim, MatrixN, RealField};

use super::rcond;

/// In place modified upper triangular Cholesky factor of a positive definite or semi-definite matrix M.
///
/// Reference: A+G p.219 right side of table
///
/// Strict lower triangle of M is ignored in computation.
///
/// Output: M as UdU' factor
///
/// Return: reciprocal condition number, -1 if negative, 0 if semi-definite (including zero)
pub fn UdUfactor<N: RealField, D: Dim>(M: &mut MatrixN<N, D>) -> N
where
    DefaultAllocator: Allocator<N, D, D>,
{
    let n = M.nrows();
    for j in (0..n).rev() {
        let mut d = M[(j, j)];

        if d > N::zero() {
            // Positive definite
            for i in (0..=j).rev() {
                let mut e = M[(i, j)];
                for k in j + 1..n {
                    e -= M[(i, k)] * M[(k, k)] * M[(j, k)];
                }
                if i == j {
                    d = e;
                    M[(i, j)] = e;
                } else {
                    M[(i, j)] = e / d;
                }
            }
            if d < N::zero() {
                return N::one().neg();
            }
        } else if d == N::zero() {
            // Possibly semi-definite, whole row must be identically zero
            for k in j + 1..n {
                if M[(j, k)] != N::zero() {
                    return N::one().neg();
                }
            }
        } else {
            // Negative
            return N::one().neg();
        }
    }

    rcond::rcond_diagonal(M)
}

/// Reciprocal condition number of a symmetric matrix from its UdU' factor.
///
/// Negative if the matrix is not positive semi-definite.
pub fn psd_rcond<N: RealField, D: Dim>(M: &MatrixN<N, D>) -> N
where
    DefaultAllocator: Allocator<N, D, D>,
{
    let mut UD = M.clone();
    UdUfactor(&mut UD)
}

/// Generalised inverse of a symmetric positive semi-definite matrix from its UdU' factor.
///
/// Pivots no larger than `tolerance` times the largest diagonal element are semi-definite and
/// their direction is left out of the inverse. The result G = inv(U)'.pinv(d).inv(U) is symmetric
/// and satisfies M.G.M = M, it is the inverse of a positive definite M.
///
/// Strict lower triangle of M is ignored in computation.
///
/// Return: None if M is negative
pub fn psd_inverse<N: RealField, D: Dim>(M: &MatrixN<N, D>, tolerance: N) -> Option<MatrixN<N, D>>
where
    DefaultAllocator: Allocator<N, D, D>,
{
    let n = M.nrows();
    let (nr, nc) = M.data.shape();
    let maxd = (0..n).fold(N::zero(), |m, i| if M[(i, i)] > m { M[(i, i)] } else { m });
    let zero_pivot = tolerance * maxd;

    let mut UD = M.clone();
    for j in (0..n).rev() {
        let mut d = UD[(j, j)];
        for k in j + 1..n {
            d -= UD[(j, k)] * UD[(k, k)] * UD[(j, k)];
        }
        if !(d >= -zero_pivot) {
            return None;
        }
        if d <= zero_pivot {
            // Semi-definite, no coupling to the remaining rows
            UD[(j, j)] = N::zero();
            for i in 0..j {
                UD[(i, j)] = N::zero();
            }
        } else {
            UD[(j, j)] = d;
            for i in 0..j {
                let mut e = UD[(i, j)];
                for k in j + 1..n {
                    e -= UD[(i, k)] * UD[(k, k)] * UD[(j, k)];
                }
                UD[(i, j)] = e / d;
            }
        }
    }

    // Back substitution for the inverse of the unit upper triangular U
    let mut UI = MatrixN::<N, D>::identity_generic(nr, nc);
    for j in 0..n {
        for i in (0..j).rev() {
            let mut e = N::zero();
            for k in i + 1..=j {
                e -= UD[(i, k)] * UI[(k, j)];
            }
            UI[(i, j)] = e;
        }
    }

    let mut G = MatrixN::<N, D>::zeros_generic(nr, nc);
    for k in 0..n {
        let d = UD[(k, k)];
        if d > N::zero() {
            let dinv = N::one() / d;
            for i in 0..n {
                for j in 0..n {
                    G[(i, j)] += UI[(k, i)] * dinv * UI[(k, j)];
                }
            }
        }
    }
    Some(G)
}
