#![allow(non_snake_case)]

//! Particle filter tracking a vehicle on a road.
//!
//! The belief is a fixed size set of positions, all on the road. Each step the particles are moved
//! along the road segment they are on, weighed by the likelihood of a position measurement and
//! resampled in proportion to their weights.
//!
//! Particles are kept on the road by rejection sampling. Draws that leave the road are drawn
//! again, up to a budget of rejections after which the step fails.

use log::{debug, trace, warn};
use nalgebra::{Matrix2, Vector2, U2};
use rand_core::RngCore;
use rand_distr::{Distribution, Standard, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::error::{check_time_step, require, EstimateError, EstimateResult};
use crate::estimators::sir::{self, Likelihoods, Resampler, Samples};
use crate::models::{Estimator, KalmanEstimator, KalmanState};
use crate::noise::CorrelatedNoise;
use crate::road::{Location, RoadGeometry, Segment};

/// Choice of resampling algorithm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResamplingScheme {
    /// Multinomial draws
    Standard,
    Systematic,
}

impl ResamplingScheme {
    pub fn resampler(self) -> Resampler {
        match self {
            ResamplingScheme::Standard => sir::standard_resampler,
            ResamplingScheme::Systematic => sir::systematic_resampler,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadTrackerConfig {
    pub road: RoadGeometry,
    pub particle_count: usize,
    /// Commanded speed along the road
    pub speed: f64,
    /// Motion noise standard deviation per square root of time
    pub motion_std: f64,
    /// Position measurement standard deviation
    pub measurement_std: f64,
    /// Rejections allowed when drawing a single particle
    pub max_rejections: usize,
    pub resampling: ResamplingScheme,
}

impl Default for RoadTrackerConfig {
    fn default() -> Self {
        RoadTrackerConfig {
            road: RoadGeometry::default(),
            particle_count: 1000,
            speed: 1.,
            motion_std: 0.5,
            measurement_std: 0.5,
            max_rejections: 1000,
            resampling: ResamplingScheme::Standard,
        }
    }
}

impl RoadTrackerConfig {
    pub fn validate(&self) -> EstimateResult<()> {
        self.road.validate()?;
        require(self.particle_count > 0, "no particles")?;
        require(self.speed.is_finite(), "speed must be finite")?;
        require(
            self.motion_std >= 0. && self.motion_std.is_finite(),
            format!("motion std {} must be non-negative", self.motion_std),
        )?;
        require(
            self.measurement_std > 0. && self.measurement_std.is_finite(),
            format!("measurement std {} must be positive", self.measurement_std),
        )?;
        require(self.max_rejections > 0, "no rejections allowed")
    }
}

/// Particle filter state.
pub struct RoadTracker {
    config: RoadTrackerConfig,
    /// Positions, all on the road
    s: Samples<f64, U2>,
    /// Normalised importance weights, between weighing and resampling
    w: Option<Likelihoods>,
    time: f64,
    rng: Box<dyn RngCore>,
}

impl RoadTracker {
    /// Creates a tracker with particles drawn around `mean` at `time`.
    pub fn initialize(
        config: RoadTrackerConfig,
        mean: &Vector2<f64>,
        covariance: &Matrix2<f64>,
        time: f64,
        mut rng: Box<dyn RngCore>,
    ) -> EstimateResult<Self> {
        config.validate()?;
        let s = sample_initial(&config, mean, covariance, rng.as_mut())?;
        debug!("road tracker with {} particles around {:?}", s.len(), mean.as_slice());

        Ok(RoadTracker {
            config,
            s,
            w: None,
            time,
            rng,
        })
    }

    pub fn config(&self) -> &RoadTrackerConfig {
        &self.config
    }

    /// Change the commanded speed for subsequent predictions.
    pub fn set_speed(&mut self, speed: f64) -> EstimateResult<()> {
        require(speed.is_finite(), "speed must be finite")?;
        self.config.speed = speed;
        Ok(())
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// The particle positions.
    pub fn particles(&self) -> &[Vector2<f64>] {
        &self.s
    }

    /// The normalised importance weights, if weighed since the last resample.
    pub fn weights(&self) -> Option<&[f64]> {
        self.w.as_deref()
    }

    pub fn effective_sample_size(&self) -> Option<f64> {
        self.w.as_ref().map(|w| sir::effective_sample_size(w))
    }

    /// Move every particle along the road to `time`.
    ///
    /// A particle in the intersection moves along a segment chosen uniformly at random. The choice
    /// is drawn again with each rejected draw, so a segment that accepts more draws is favoured.
    pub fn predict(&mut self, time: f64) -> EstimateResult<()> {
        let dt = check_time_step(time - self.time)?;
        let s = predict_samples(&self.config, &self.s, dt, self.rng.as_mut())?;

        self.s = s;
        self.w = None;
        self.time = time;
        Ok(())
    }

    /// Weigh the particles by the likelihood of a position measurement.
    pub fn weigh(&mut self, measurement: &Vector2<f64>) -> EstimateResult<&[f64]> {
        let w = likelihoods(&self.s, measurement, self.config.measurement_std)?;
        Ok(self.w.insert(w).as_slice())
    }

    /// Draw a new equally likely set of particles in proportion to their weights.
    pub fn resample(&mut self) -> EstimateResult<()> {
        let w = self.w.as_ref().ok_or(EstimateError::NotWeighed)?;
        let resamples = (self.config.resampling.resampler())(w, self.rng.as_mut())?;
        self.s = sir::apply_resamples(&self.s, &resamples);
        self.w = None;
        Ok(())
    }

    /// A complete filter step, predict to `time`, weigh with `measurement` and resample.
    ///
    /// Either the whole step applies or the filter is left unchanged.
    pub fn step(&mut self, time: f64, measurement: &Vector2<f64>) -> EstimateResult<()> {
        let dt = check_time_step(time - self.time)?;
        let predicted = predict_samples(&self.config, &self.s, dt, self.rng.as_mut())?;
        let w = likelihoods(&predicted, measurement, self.config.measurement_std)?;
        let resamples = (self.config.resampling.resampler())(&w, self.rng.as_mut())?;
        trace!("step t={} effective size {}", time, sir::effective_sample_size(&w));

        self.s = sir::apply_resamples(&predicted, &resamples);
        self.w = None;
        self.time = time;
        Ok(())
    }
}

impl Estimator<f64, U2> for RoadTracker {
    /// The mean position, weighted if the particles have been weighed.
    fn state(&self) -> EstimateResult<Vector2<f64>> {
        match &self.w {
            Some(w) => Ok(self.s.iter().zip(w.iter()).map(|(s, wi)| s * *wi).sum()),
            None => Ok(sir::kalman_state(&self.s)?.x),
        }
    }
}

impl KalmanEstimator<f64, U2> for RoadTracker {
    /// Redraw the particles around the state.
    fn init(&mut self, state: &KalmanState<f64, U2>) -> EstimateResult<()> {
        let s = sample_initial(&self.config, &state.x, &state.X, self.rng.as_mut())?;
        self.s = s;
        self.w = None;
        Ok(())
    }

    /// Mean and covariance of the (unweighted) particles.
    fn kalman_state(&self) -> EstimateResult<KalmanState<f64, U2>> {
        sir::kalman_state(&self.s)
    }
}

/// Draw particles from a Gaussian, rejecting those off the road.
///
/// Draws are made in batches of the particle count.
fn sample_initial(
    config: &RoadTrackerConfig,
    mean: &Vector2<f64>,
    covariance: &Matrix2<f64>,
    rng: &mut dyn RngCore,
) -> EstimateResult<Samples<f64, U2>> {
    CorrelatedNoise { Q: *covariance }
        .check_psd("initial covariance")
        .map_err(|e| EstimateError::InvalidConfig(e.to_string()))?;

    // Factor the covariance as L.L', L = V.sqrt(Λ) also handles semi-definite covariances
    let eigen = covariance.symmetric_eigen();
    let sqrt_values = eigen.eigenvalues.map(|v| v.max(0.).sqrt());
    let L = eigen.eigenvectors * Matrix2::from_diagonal(&sqrt_values);

    let n = config.particle_count;
    let budget = config.max_rejections.saturating_mul(n);
    let mut rejected = 0;
    let mut s = Vec::with_capacity(n);
    while s.len() < n {
        for _ in 0..n {
            let z = Vector2::new(sample_standard_normal(rng), sample_standard_normal(rng));
            let candidate = mean + L * z;
            if !config.road.on_road(&candidate) {
                rejected += 1;
            } else if s.len() < n {
                s.push(candidate);
            }
        }
        if rejected > budget {
            return Err(EstimateError::ConstraintUnsatisfiable { attempts: rejected });
        }
    }
    debug!("initial particles drawn with {} rejections", rejected);
    Ok(s)
}

/// Move samples along the road over `dt`, redrawing any that leave the road.
///
/// Each draw of a sample in the intersection chooses its segment afresh, including redraws after a
/// rejection. A sample fails after `max_rejections` rejected draws.
fn predict_samples(
    config: &RoadTrackerConfig,
    s: &[Vector2<f64>],
    dt: f64,
    rng: &mut dyn RngCore,
) -> EstimateResult<Samples<f64, U2>> {
    let noise_std = config.motion_std * dt.sqrt();
    let mut predicted = Vec::with_capacity(s.len());
    let mut total_rejected = 0usize;
    let mut worst = 0usize;

    for p in s {
        let mut rejected = 0;
        let moved = loop {
            let segment = match config.road.locate(p) {
                Location::On(segment) => segment,
                Location::Intersection => {
                    if Distribution::<bool>::sample(&Standard, &mut *rng) {
                        Segment::Vertical
                    } else {
                        Segment::Horizontal
                    }
                }
                Location::Off => return Err(EstimateError::Degenerate("particle off the road")),
            };
            let along = config.speed * dt + noise_std * sample_standard_normal(rng);
            let across = noise_std * sample_standard_normal(rng);
            let candidate = p + segment.direction() * along + segment.across() * across;
            if config.road.on_road(&candidate) {
                break candidate;
            }
            rejected += 1;
            if rejected >= config.max_rejections {
                return Err(EstimateError::ConstraintUnsatisfiable { attempts: rejected });
            }
        };
        total_rejected += rejected;
        worst = worst.max(rejected);
        predicted.push(moved);
    }

    if worst > config.max_rejections / 2 {
        warn!("particle needed {} of {} allowed rejections", worst, config.max_rejections);
    }
    trace!("predicted dt={} with {} rejections", dt, total_rejected);
    Ok(predicted)
}

/// Normalised Gaussian likelihoods of the distances from the samples to a measurement.
fn likelihoods(s: &[Vector2<f64>], measurement: &Vector2<f64>, std: f64) -> EstimateResult<Likelihoods> {
    let variance = std * std;
    let mut w: Likelihoods = s
        .iter()
        .map(|p| (-(p - measurement).norm_squared() / (2. * variance)).exp())
        .collect();
    sir::normalise_likelihoods(&mut w)?;
    Ok(w)
}

fn sample_standard_normal(rng: &mut dyn RngCore) -> f64 {
    Distribution::<f64>::sample(&StandardNormal, &mut *rng)
}
