//! Recursive Bayesian estimation for robots.
//!
//! Bayesian filtering is a probabilistic technique for data fusion. The technique combines a concise mathematical
//! formulation of a system with observations of that system. Probabilities are used to represent the state of a
//! system, likelihood functions to represent their relationships.
//!
//! For dynamic systems the Bayesian formulation results in a naturally recursive solution: a belief is predicted
//! forward in time with the system's dynamic model and then corrected with each observation of the system.
//!
//! Three estimators implement this predict and observe cycle with increasingly general belief representations:
//! - [`DiscreteBayesFilter`], a probability mass over a finite set of states.
//! - [`CartesianBot`], a linear Kalman filter of a two axis motor driven bot using the [`KalmanState`] representation.
//! - [`RoadTracker`], a particle filter of a vehicle constrained to an L shaped road.
//!
//! Grid world value iteration, [`GridWorld`], is included for decision making over a discrete state space.
//!
//! Estimators own their belief and any random number generator they use. Operations that fail return an
//! [`EstimateError`] and leave the belief unchanged.
//!
//! # Licensing
//!
//! Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction,
//! including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software,
//! and to permit persons to whom the Software is furnished to do so, subject to the following conditions:
//!
//! The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.
//!
//! THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
//! FITNESS FOR A PARTICULAR PURPOSE AND NON INFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY,
//! WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
//!
//! [`KalmanState`]: models::KalmanState

pub mod cartesian_bot;
pub mod error;
pub mod estimators;
pub mod linalg;
pub mod mdp;
pub mod models;
pub mod noise;
pub mod road;
pub mod road_tracker;

pub use cartesian_bot::{CartesianBot, CartesianBotConfig, MotorParams, PositionMeasurement};
pub use error::{EstimateError, EstimateResult};
pub use estimators::discrete::DiscreteBayesFilter;
pub use mdp::GridWorld;
pub use road::RoadGeometry;
pub use road_tracker::{ResamplingScheme, RoadTracker, RoadTrackerConfig};
