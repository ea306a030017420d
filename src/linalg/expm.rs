//! Matrix exponential.
//!
//! Scaling and squaring with a truncated Taylor series. Used to discretise linear continuous
//! time systems with a zero-order-hold on their inputs.

use nalgebra::{allocator::Allocator, storage::Storage, DefaultAllocator, Dim, MatrixN};

/// Taylor terms after scaling, the scaled matrix has a norm below 1/2.
const TAYLOR_TERMS: usize = 18;

/// Computes exp(A).
pub fn expm<D: Dim>(a: &MatrixN<f64, D>) -> MatrixN<f64, D>
where
    DefaultAllocator: Allocator<f64, D, D>,
{
    let (nr, nc) = a.data.shape();

    // Infinity norm, max absolute row sum
    let norm = a
        .row_iter()
        .map(|row| row.iter().map(|v| v.abs()).sum::<f64>())
        .fold(0., f64::max);
    let squarings = if norm > 0.5 {
        (norm / 0.5).log2().ceil() as i32
    } else {
        0
    };
    let scaled = a / 2f64.powi(squarings);

    let identity = MatrixN::<f64, D>::identity_generic(nr, nc);
    let mut result = identity.clone();
    let mut term = identity;
    for k in 1..=TAYLOR_TERMS {
        term = &term * &scaled / k as f64;
        result += &term;
    }

    for _ in 0..squarings {
        result = &result * &result;
    }
    result
}
