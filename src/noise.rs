#![allow(non_snake_case)]

//! Bayesian estimation noise models.
//!
//! Linear noise models are represented as structs.

use nalgebra::{allocator::Allocator, storage::Storage, DefaultAllocator, Dim, Matrix2, MatrixMN, MatrixN, RealField, VectorN};

use crate::error::{require, EstimateResult};
use crate::linalg;

/// Additive noise.
///
/// Noise represented as a the noise covariance matrix.
#[derive(PartialEq, Clone, Debug)]
pub struct CorrelatedNoise<N: RealField, D: Dim>
where
    DefaultAllocator: Allocator<N, D, D>,
{
    /// Noise covariance
    pub Q: MatrixN<N, D>,
}

/// Additive noise.
///
/// Noise represented as a the noise variance vector and a noise coupling matrix.
/// The noise covariance is G.q.G'.
#[derive(PartialEq, Clone, Debug)]
pub struct CoupledNoise<N: RealField, D: Dim, QD: Dim>
where
    DefaultAllocator: Allocator<N, D, QD> + Allocator<N, QD>,
{
    /// Noise variance
    pub q: VectorN<N, QD>,
    /// Noise coupling
    pub G: MatrixMN<N, D, QD>,
}

impl<N: RealField, D: Dim> CorrelatedNoise<N, D>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, D>,
{
    /// Creates a CorrelatedNoise from an CoupledNoise.
    pub fn from_coupled<QD: Dim>(coupled: &CoupledNoise<N, D, QD>) -> Self
    where
        DefaultAllocator: Allocator<N, D, QD> + Allocator<N, QD>,
    {
        let d = coupled.G.data.shape().0;
        let mut Q = MatrixN::<N, D>::zeros_generic(d, d);
        // Q = sum over j of q[j] * G[:,j] * G[:,j]'
        for j in 0..coupled.q.nrows() {
            Q.ger(coupled.q[j], &coupled.G.column(j), &coupled.G.column(j), N::one());
        }
        CorrelatedNoise { Q }
    }

    /// Checks the noise covariance is symmetric positive semi-definite.
    pub fn check_psd(&self, what: &'static str) -> EstimateResult<N> {
        let tolerance = N::default_epsilon() * (N::one() + N::one()).powi(10);
        linalg::check_psd(&self.Q, tolerance, what)
    }
}

impl CorrelatedNoise<f64, nalgebra::U2> {
    /// Creates a two dimensional CorrelatedNoise from standard deviations and a correlation coefficient.
    ///
    /// Q = [[σx², ρ.σx.σy], [ρ.σx.σy, σy²]]
    pub fn from_std_correlation(sigma_x: f64, sigma_y: f64, rho: f64) -> EstimateResult<Self> {
        require(sigma_x >= 0. && sigma_y >= 0., "standard deviations must be non-negative")?;
        require(rho.abs() <= 1., format!("correlation {} outside [-1, 1]", rho))?;
        let cross = rho * sigma_x * sigma_y;
        Ok(CorrelatedNoise {
            Q: Matrix2::new(sigma_x * sigma_x, cross, cross, sigma_y * sigma_y),
        })
    }
}
