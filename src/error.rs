//! Estimation errors.
//!
//! Every fallible operation of the estimators returns an [`EstimateError`].
//! A step that fails leaves the estimator's belief exactly as it was before the step.

use thiserror::Error;

/// Estimation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    /// Construction parameters that can never give a valid estimator.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A step was requested for a time before the estimator's current time.
    #[error("negative time step: {dt}")]
    NegativeTimeStep { dt: f64 },

    /// A caller supplied matrix is not symmetric positive semi-definite.
    #[error("{0} not PSD")]
    NotPsd(&'static str),

    /// A discrete measurement outside the outcomes of the likelihood table.
    #[error("measurement {measurement} outside of {outcomes} outcomes")]
    MeasurementOutOfRange { measurement: usize, outcomes: usize },

    /// A distribution could not be normalised (zero, negative or NaN mass).
    #[error("degenerate distribution: {0}")]
    Degenerate(&'static str),

    /// Rejection sampling used its whole budget without satisfying the constraint.
    #[error("constraint unsatisfiable after {attempts} rejected samples")]
    ConstraintUnsatisfiable { attempts: usize },

    /// Resampling was requested without importance weights.
    #[error("particles have not been weighed")]
    NotWeighed,

    /// An iterative solver hit its iteration bound.
    #[error("not converged after {iterations} iterations (delta {delta})")]
    NotConverged { iterations: usize, delta: f64 },
}

/// Result type for estimation operations
pub type EstimateResult<T> = Result<T, EstimateError>;

/// Checks a time step is not negative.
///
/// NaN time steps are rejected as well.
pub fn check_time_step(dt: f64) -> EstimateResult<f64> {
    if dt >= 0. {
        Ok(dt)
    } else {
        Err(EstimateError::NegativeTimeStep { dt })
    }
}

/// Checks a reciprocal condition number is >= 0.
///
/// IEC 559 NaN values are never true.
pub fn check_non_negative<N: PartialOrd + num_traits::Zero>(rcond: N, what: &'static str) -> EstimateResult<N> {
    if rcond >= N::zero() {
        Ok(rcond)
    } else {
        Err(EstimateError::NotPsd(what))
    }
}

/// Refuses a configuration unless `ok`.
pub(crate) fn require(ok: bool, message: impl Into<String>) -> EstimateResult<()> {
    if ok {
        Ok(())
    } else {
        Err(EstimateError::InvalidConfig(message.into()))
    }
}
