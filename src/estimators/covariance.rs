#![allow(non_snake_case)]

//! Covariance state estimation.
//!
//! A discrete Bayesian estimator that uses a Kalman state representation [`KalmanState`] of the system for estimation.
//! The Kalman state is simply the x,X pair the dimensions of both are the dimensions of the system.
//!
//! Predictions and observations are computed in temporaries and only assigned once they succeed,
//! a failed operation leaves the state unchanged.
//!
//! [`KalmanState`]: ../../models/struct.KalmanState.html

use nalgebra::{allocator::Allocator, storage::Storage, DefaultAllocator, Dim, MatrixMN, MatrixN, RealField, VectorN, U1};

use crate::error::{check_non_negative, EstimateError, EstimateResult};
use crate::linalg::{cholesky, symmetrise};
use crate::models::{Estimator, KalmanEstimator, KalmanState, LinearObserver, LinearPredictor};
use crate::noise::CorrelatedNoise;

impl<N: RealField, D: Dim> KalmanState<N, D>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, D>,
{
    pub fn new_zero(d: D) -> KalmanState<N, D> {
        KalmanState {
            x: VectorN::zeros_generic(d, U1),
            X: MatrixN::zeros_generic(d, d),
        }
    }
}

impl<N: RealField, D: Dim> Estimator<N, D> for KalmanState<N, D>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, D>,
{
    fn state(&self) -> EstimateResult<VectorN<N, D>> {
        Ok(self.x.clone())
    }
}

impl<N: RealField, D: Dim> KalmanEstimator<N, D> for KalmanState<N, D>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, D>,
{
    fn init(&mut self, state: &KalmanState<N, D>) -> EstimateResult<()> {
        check_non_negative(cholesky::psd_rcond(&state.X), "X")?;
        self.x = state.x.clone();
        self.X = state.X.clone();

        Ok(())
    }

    fn kalman_state(&self) -> EstimateResult<KalmanState<N, D>> {
        Ok(self.clone())
    }
}

impl<N: RealField, D: Dim> LinearPredictor<N, D> for KalmanState<N, D>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, D>,
{
    fn predict(&mut self, x_pred: &VectorN<N, D>, Fx: &MatrixN<N, D>, noise: &CorrelatedNoise<N, D>) -> EstimateResult<()> {
        // X = Fx.X.Fx' + Q
        let mut X = &noise.Q + Fx * &self.X * Fx.transpose();
        symmetrise(&mut X);

        self.x = x_pred.clone();
        self.X = X;

        Ok(())
    }
}

impl<N: RealField, D: Dim, ZD: Dim> LinearObserver<N, D, ZD> for KalmanState<N, D>
where
    DefaultAllocator: Allocator<N, D, D>
        + Allocator<N, ZD, ZD>
        + Allocator<N, ZD, D>
        + Allocator<N, D, ZD>
        + Allocator<N, D>
        + Allocator<N, ZD>,
{
    fn observe_innovation(&mut self, s: &VectorN<N, ZD>, Hx: &MatrixMN<N, ZD, D>, noise: &CorrelatedNoise<N, ZD>) -> EstimateResult<()> {
        noise.check_psd("observation noise")?;

        let XHt = &self.X * Hx.transpose();
        // S = Hx.X.Hx' + Q
        let S = Hx * &XHt + &noise.Q;

        // Inverse innovation covariance, semi-definite directions carry no gain
        let tolerance = N::default_epsilon() * (N::one() + N::one()).powi(10);
        let SI = cholesky::psd_inverse(&S, tolerance).ok_or(EstimateError::NotPsd("innovation covariance"))?;
        // Kalman gain, X.Hx'.SI
        let W = &XHt * SI;

        // X = (I - W.Hx).X
        let d = self.x.data.shape().0;
        let mut X = (MatrixN::<N, D>::identity_generic(d, d) - &W * Hx) * &self.X;
        symmetrise(&mut X);

        self.x += &W * s;
        self.X = X;

        Ok(())
    }
}
