#![allow(non_snake_case)]

//! Sampling Importance Resampling.
//!
//! Resamplers and summaries of weighted sample sets. A sample set is a vector of states with a
//! parallel vector of importance likelihoods. Resampling draws a new set of the same size with
//! replacement, each sample drawn in proportion to its likelihood.

use log::{trace, warn};
use nalgebra::{allocator::Allocator, DefaultAllocator, Dim, MatrixN, RealField, VectorN, U1};
use nalgebra::storage::Storage;
use rand_core::RngCore;
use rand_distr::{Distribution, Standard};

use crate::error::{EstimateError, EstimateResult};
use crate::models::KalmanState;

/// Samples of a state
pub type Samples<N, D> = Vec<VectorN<N, D>>;

/// Importance likelihoods of samples
pub type Likelihoods = Vec<f64>;

/// Number of times each sample is resampled
pub type Resamples = Vec<u32>;

/// A resampler computes the [`Resamples`] from likelihoods.
pub type Resampler = fn(&[f64], &mut dyn RngCore) -> EstimateResult<Resamples>;

/// Normalised cumulative sum of likelihoods.
///
/// Kahan summation. Returns the cumulative sums and the total.
fn cumulative_likelihoods(w: &[f64]) -> EstimateResult<(Vec<f64>, f64)> {
    let mut wmin = f64::MAX;
    let mut wcum = 0.;
    let mut c = 0.;
    let mut cumulative = Vec::with_capacity(w.len());
    for &wi in w {
        if wi < wmin {
            wmin = wi;
        }
        let y = wi - c;
        let t = wcum + y;
        c = (t - wcum) - y;
        wcum = t;
        cumulative.push(t);
    }
    if wmin < 0. {
        return Err(EstimateError::Degenerate("negative weight"));
    }
    // Any numerical failure cascades into the cumulative sum
    if !(wcum > 0.) || !wcum.is_finite() {
        return Err(EstimateError::Degenerate("zero or non-numeric cumulative weight sum"));
    }
    Ok((cumulative, wcum))
}

/// Count resamples from cumulative weights and sorted resample positions in [0, wcum).
fn count_resamples(cumulative: &[f64], positions: &[f64]) -> EstimateResult<Resamples> {
    let mut presamples = vec![0u32; cumulative.len()];
    let mut ui = 0;
    let mut unique = 0usize;
    for (pi, &wi) in cumulative.iter().enumerate() {
        if ui < positions.len() && positions[ui] < wi {
            unique += 1;
            while ui < positions.len() && positions[ui] < wi {
                presamples[pi] += 1;
                ui += 1;
            }
        }
    }
    if ui != positions.len() {
        // resample failed due to non numeric weights
        return Err(EstimateError::Degenerate("weights are not numeric and cannot be resampled"));
    }
    if unique * 10 < cumulative.len() {
        warn!("resample collapsed to {} unique of {}", unique, cumulative.len());
    }
    trace!("resampled {} unique of {}", unique, cumulative.len());
    Ok(presamples)
}

/// Standard (multinomial) resampler.
///
/// A sample is chosen once for each time its cumulative weight intersects with a uniform random draw.
/// Complexity O(n*log(n)), required to sort the uniform random draws made.
pub fn standard_resampler(w: &[f64], rng: &mut dyn RngCore) -> EstimateResult<Resamples> {
    let (cumulative, wcum) = cumulative_likelihoods(w)?;

    // Sorted uniform random distribution [0..1) for each resample, scaled to the cumulative sum
    let mut ur: Vec<f64> = (0..w.len()).map(|_| Distribution::<f64>::sample(&Standard, &mut *rng)).collect();
    ur.sort_by(|a, b| a.total_cmp(b));
    for u in ur.iter_mut() {
        *u *= wcum;
    }

    count_resamples(&cumulative, &ur)
}

/// Systematic resampler.
///
/// A single uniform draw offsets equally spaced positions through the cumulative weights.
/// Complexity O(n).
pub fn systematic_resampler(w: &[f64], rng: &mut dyn RngCore) -> EstimateResult<Resamples> {
    let (cumulative, wcum) = cumulative_likelihoods(w)?;

    let n = w.len() as f64;
    let offset: f64 = Distribution::<f64>::sample(&Standard, &mut *rng);
    let positions: Vec<f64> = (0..w.len()).map(|i| (i as f64 + offset) / n * wcum).collect();

    count_resamples(&cumulative, &positions)
}

/// Build the resampled set, each sample repeated as many times as it was resampled.
pub fn apply_resamples<S: Clone>(samples: &[S], resamples: &Resamples) -> Vec<S> {
    let mut resampled = Vec::with_capacity(samples.len());
    for (s, &count) in samples.iter().zip(resamples.iter()) {
        for _ in 0..count {
            resampled.push(s.clone());
        }
    }
    resampled
}

/// Normalise likelihoods to sum to one.
///
/// Zero or non-numeric sums are degenerate, all likelihoods may have underflowed.
pub fn normalise_likelihoods(w: &mut [f64]) -> EstimateResult<f64> {
    let sum: f64 = w.iter().sum();
    if !(sum > 0.) || !sum.is_finite() {
        return Err(EstimateError::Degenerate("likelihoods sum to zero"));
    }
    for wi in w.iter_mut() {
        *wi /= sum;
    }
    Ok(sum)
}

/// Effective sample size 1 / Σw² of normalised likelihoods.
pub fn effective_sample_size(w: &[f64]) -> f64 {
    1. / w.iter().map(|wi| wi * wi).sum::<f64>()
}

/// Mean and covariance of equally likely samples.
pub fn kalman_state<N: RealField, D: Dim>(s: &[VectorN<N, D>]) -> EstimateResult<KalmanState<N, D>>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, D> + Allocator<N, U1, D>,
{
    let first = s.first().ok_or(EstimateError::Degenerate("no samples"))?;
    let d = first.data.shape().0;
    let n: N = nalgebra::convert(s.len() as f64);

    let mut x = VectorN::<N, D>::zeros_generic(d, U1);
    for si in s {
        x += si;
    }
    x /= n;

    let mut X = MatrixN::<N, D>::zeros_generic(d, d);
    for si in s {
        let sx = si - &x;
        X += &sx * sx.transpose();
    }
    X /= n;

    Ok(KalmanState { x, X })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn one_hot_resamples_one() {
        let mut rng = StdRng::seed_from_u64(7);
        let w = vec![0., 0., 1., 0., 0.];
        for resampler in [standard_resampler as Resampler, systematic_resampler].iter() {
            let resamples = resampler(&w, &mut rng).unwrap();
            assert_eq!(resamples, vec![0, 0, 5, 0, 0]);
        }
    }

    #[test]
    fn resample_count_is_preserved() {
        let mut rng = StdRng::seed_from_u64(1);
        let w: Vec<f64> = (0..100).map(|i| (i % 7) as f64).collect();
        for resampler in [standard_resampler as Resampler, systematic_resampler].iter() {
            let resamples = resampler(&w, &mut rng).unwrap();
            assert_eq!(resamples.iter().sum::<u32>(), 100);
            // zero weights are never resampled
            for (wi, &r) in w.iter().zip(resamples.iter()) {
                if *wi == 0. {
                    assert_eq!(r, 0);
                }
            }
        }
    }

    #[test]
    fn degenerate_weights() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(standard_resampler(&[0., 0.], &mut rng).is_err());
        assert!(standard_resampler(&[1., -0.5], &mut rng).is_err());
        assert!(systematic_resampler(&[f64::NAN, 1.], &mut rng).is_err());
        let mut w = vec![0., 0., 0.];
        assert_eq!(normalise_likelihoods(&mut w), Err(EstimateError::Degenerate("likelihoods sum to zero")));
    }

    #[test]
    fn apply_and_effective_size() {
        let resampled = apply_resamples(&['a', 'b', 'c'], &vec![2, 0, 1]);
        assert_eq!(resampled, vec!['a', 'a', 'c']);
        assert!((effective_sample_size(&[0.25; 4]) - 4.).abs() < 1e-12);
        assert!((effective_sample_size(&[1., 0., 0.]) - 1.).abs() < 1e-12);
    }
}
