//! A collection of Bayesian state estimators.

pub mod covariance;
pub mod discrete;
pub mod sir;
