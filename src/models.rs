#![allow(non_snake_case)]

//! Bayesian estimation models.
//!
//! State representations are modeled as structs.
//! Common Bayesian discrete system estimation operations are defined as traits.

use nalgebra::{allocator::Allocator, DefaultAllocator, Dim, MatrixMN, MatrixN, RealField, VectorN};

use crate::error::EstimateResult;
use crate::noise::CorrelatedNoise;

/// Kalman State.
///
/// Linear representation as a state vector and the state covariance (symmetric positive semi-definite) matrix.
#[derive(PartialEq, Clone, Debug)]
pub struct KalmanState<N: RealField, D: Dim>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, D>,
{
    /// State vector
    pub x: VectorN<N, D>,
    /// State covariance matrix (symmetric positive semi-definite)
    pub X: MatrixN<N, D>,
}

/// A state estimator.
pub trait Estimator<N: RealField, D: Dim>
where
    DefaultAllocator: Allocator<N, D>,
{
    /// The estimator's estimate of the system's state.
    fn state(&self) -> EstimateResult<VectorN<N, D>>;
}

/// A Kalman estimator.
///
/// The linear Kalman state representation x,X is used to represent the system.
pub trait KalmanEstimator<N: RealField, D: Dim>: Estimator<N, D>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, D>,
{
    /// Initialise the estimator with a KalmanState.
    fn init(&mut self, state: &KalmanState<N, D>) -> EstimateResult<()>;

    /// The estimator's estimate of the system's KalmanState.
    fn kalman_state(&self) -> EstimateResult<KalmanState<N, D>>;
}

/// A linear predictor.
///
/// Uses a linear model with additive noise.
pub trait LinearPredictor<N: RealField, D: Dim>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, D>,
{
    /// State prediction with a linear prediction model and additive noise.
    ///
    /// `x_pred` is the already predicted state, Fx the state transition used for the covariance.
    fn predict(&mut self, x_pred: &VectorN<N, D>, Fx: &MatrixN<N, D>, noise: &CorrelatedNoise<N, D>) -> EstimateResult<()>;
}

/// A linear observer with correlated observation noise.
///
/// Uses a linear observation model with correlated additive observation noise.
pub trait LinearObserver<N: RealField, D: Dim, ZD: Dim>
where
    DefaultAllocator: Allocator<N, ZD, D> + Allocator<N, ZD, ZD> + Allocator<N, ZD>,
{
    /// Observation with the innovation `s` of a linear observation model `Hx`.
    fn observe_innovation(&mut self, s: &VectorN<N, ZD>, Hx: &MatrixMN<N, ZD, D>, noise: &CorrelatedNoise<N, ZD>) -> EstimateResult<()>;
}
