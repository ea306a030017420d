//! Test the road tracking particle filter.

use approx::assert_relative_eq;
use nalgebra::{Matrix2, Vector2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use robo_bayes::estimators::sir;
use robo_bayes::models::{Estimator, KalmanEstimator, KalmanState};
use robo_bayes::{EstimateError, ResamplingScheme, RoadGeometry, RoadTracker, RoadTrackerConfig};

fn tracker(config: RoadTrackerConfig, mean: Vector2<f64>, seed: u64) -> RoadTracker {
    RoadTracker::initialize(config, &mean, &(Matrix2::identity() * 0.5), 0., Box::new(StdRng::seed_from_u64(seed)))
        .unwrap()
}

fn small_config() -> RoadTrackerConfig {
    RoadTrackerConfig {
        particle_count: 200,
        ..RoadTrackerConfig::default()
    }
}

fn all_on_road(tracker: &RoadTracker) -> bool {
    let road = tracker.config().road;
    tracker.particles().iter().all(|p| road.on_road(p))
}

#[test]
fn test_particles_stay_on_road() {
    let mut tracker = tracker(small_config(), Vector2::new(5., 3.), 1);
    assert_eq!(tracker.particles().len(), 200);
    assert!(all_on_road(&tracker));

    // Drive up the vertical segment, through the intersection and along the horizontal segment
    let mut truth = Vector2::new(5., 3.);
    for step in 1..=12 {
        if truth.y < 10. {
            truth.y += 1.;
        } else {
            truth.x -= 1.;
        }
        tracker.step(step as f64, &truth).unwrap();
        assert_eq!(tracker.particles().len(), 200);
        assert!(all_on_road(&tracker), "off road at step {}", step);
        assert_eq!(tracker.time(), step as f64);
    }
}

#[test]
fn test_weigh_then_resample() {
    let mut tracker = tracker(small_config(), Vector2::new(5., 3.), 2);
    assert_eq!(tracker.resample(), Err(EstimateError::NotWeighed));

    tracker.predict(0.5).unwrap();
    assert!(tracker.weights().is_none());
    let w = tracker.weigh(&Vector2::new(5., 3.5)).unwrap().to_vec();
    assert_eq!(w.len(), 200);
    assert_relative_eq!(w.iter().sum::<f64>(), 1., epsilon = 1e-12);

    let ess = tracker.effective_sample_size().unwrap();
    assert!(ess >= 1. && ess <= 200. + 1e-9);

    // The weighted mean is used between weighing and resampling
    let weighted: Vector2<f64> = tracker.particles().iter().zip(w.iter()).map(|(p, wi)| p * *wi).sum();
    assert_relative_eq!(tracker.state().unwrap(), weighted, epsilon = 1e-12);

    tracker.resample().unwrap();
    assert!(tracker.weights().is_none());
    assert_eq!(tracker.particles().len(), 200);
    assert_eq!(tracker.resample(), Err(EstimateError::NotWeighed));
}

#[test]
fn test_degenerate_measurement() {
    let mut tracker = tracker(small_config(), Vector2::new(5., 3.), 3);
    let before = tracker.particles().to_vec();
    let far = Vector2::new(1000., 1000.);

    assert!(matches!(tracker.weigh(&far), Err(EstimateError::Degenerate(_))));
    assert!(tracker.weights().is_none());
    assert_eq!(tracker.particles(), before.as_slice());

    assert!(matches!(tracker.step(1., &far), Err(EstimateError::Degenerate(_))));
    assert_eq!(tracker.particles(), before.as_slice());
    assert_eq!(tracker.time(), 0.);
}

#[test]
fn test_negative_time_step() {
    let mut tracker = tracker(small_config(), Vector2::new(5., 3.), 4);
    tracker.predict(1.).unwrap();
    let before = tracker.particles().to_vec();

    assert_eq!(tracker.predict(0.), Err(EstimateError::NegativeTimeStep { dt: -1. }));
    assert!(tracker.step(0.5, &Vector2::new(5., 4.)).is_err());
    assert_eq!(tracker.particles(), before.as_slice());
    assert_eq!(tracker.time(), 1.);
}

#[test]
fn test_unsatisfiable_initialisation() {
    let config = RoadTrackerConfig {
        particle_count: 10,
        max_rejections: 2,
        ..RoadTrackerConfig::default()
    };
    let result = RoadTracker::initialize(
        config,
        &Vector2::new(100., 100.),
        &(Matrix2::identity() * 0.01),
        0.,
        Box::new(StdRng::seed_from_u64(5)),
    );
    assert!(matches!(result, Err(EstimateError::ConstraintUnsatisfiable { .. })));
}

#[test]
fn test_unsatisfiable_motion() {
    // Driving fast off the end of the horizontal segment
    let config = RoadTrackerConfig {
        particle_count: 50,
        speed: 100.,
        motion_std: 0.001,
        max_rejections: 5,
        ..RoadTrackerConfig::default()
    };
    let mut tracker = RoadTracker::initialize(
        config,
        &Vector2::new(-1.5, 10.),
        &(Matrix2::identity() * 0.01),
        0.,
        Box::new(StdRng::seed_from_u64(10)),
    )
    .unwrap();
    let before = tracker.particles().to_vec();

    assert_eq!(tracker.predict(1.), Err(EstimateError::ConstraintUnsatisfiable { attempts: 5 }));
    assert_eq!(tracker.particles(), before.as_slice());
    assert_eq!(tracker.time(), 0.);

    assert!(matches!(
        tracker.step(1., &Vector2::new(-1.5, 10.)),
        Err(EstimateError::ConstraintUnsatisfiable { .. })
    ));
    assert_eq!(tracker.particles(), before.as_slice());
    assert_eq!(tracker.time(), 0.);
}

#[test]
fn test_intersection_takes_both_segments() {
    let config = RoadTrackerConfig {
        speed: 1.,
        motion_std: 0.01,
        ..small_config()
    };
    let mut tracker = RoadTracker::initialize(
        config,
        &Vector2::new(5., 10.),
        &(Matrix2::identity() * 0.0001),
        0.,
        Box::new(StdRng::seed_from_u64(11)),
    )
    .unwrap();
    let road = tracker.config().road;
    assert!(tracker.particles().iter().all(|p| road.in_vertical(p) && road.in_horizontal(p)));
    let before = tracker.particles().to_vec();

    tracker.predict(0.5).unwrap();
    let moves: Vec<Vector2<f64>> = tracker.particles().iter().zip(before.iter()).map(|(a, b)| a - b).collect();
    let up = moves.iter().filter(|m| m.y > 0.4 && m.x.abs() < 0.1).count();
    let left = moves.iter().filter(|m| m.x < -0.4 && m.y.abs() < 0.1).count();
    assert_eq!(up + left, 200);
    assert!(up >= 50 && left >= 50, "up {} left {}", up, left);
}

#[test]
fn test_set_speed() {
    let config = RoadTrackerConfig {
        motion_std: 0.01,
        ..small_config()
    };
    let mut tracker = tracker(config, Vector2::new(5., 3.), 12);
    assert_eq!(tracker.set_speed(f64::NAN), Err(EstimateError::InvalidConfig("speed must be finite".to_string())));
    assert_eq!(tracker.config().speed, 1.);

    tracker.set_speed(0.).unwrap();
    let before = tracker.particles().to_vec();
    tracker.predict(1.).unwrap();
    for (a, b) in tracker.particles().iter().zip(before.iter()) {
        assert!((a - b).norm() < 0.1);
    }

    tracker.set_speed(2.).unwrap();
    let before = tracker.particles().to_vec();
    tracker.predict(2.).unwrap();
    for (a, b) in tracker.particles().iter().zip(before.iter()) {
        assert_relative_eq!(a.y - b.y, 2., epsilon = 0.1);
    }
}

#[test]
fn test_invalid_configuration() {
    let rng = || Box::new(StdRng::seed_from_u64(6));
    let mean = Vector2::new(5., 3.);
    let covariance = Matrix2::identity();

    let no_particles = RoadTrackerConfig { particle_count: 0, ..RoadTrackerConfig::default() };
    assert!(matches!(
        RoadTracker::initialize(no_particles, &mean, &covariance, 0., rng()),
        Err(EstimateError::InvalidConfig(_))
    ));

    let no_width = RoadTrackerConfig {
        road: RoadGeometry { width: 0., ..RoadGeometry::default() },
        ..RoadTrackerConfig::default()
    };
    assert!(RoadTracker::initialize(no_width, &mean, &covariance, 0., rng()).is_err());

    let not_psd = Matrix2::new(1., 2., 2., 1.);
    assert!(matches!(
        RoadTracker::initialize(small_config(), &mean, &not_psd, 0., rng()),
        Err(EstimateError::InvalidConfig(_))
    ));
}

#[test]
fn test_one_hot_resample() {
    let tracker = tracker(small_config(), Vector2::new(5., 3.), 7);
    let particles = tracker.particles();
    let mut w = vec![0.; particles.len()];
    w[17] = 1.;

    let mut rng = StdRng::seed_from_u64(8);
    for resampler in [sir::standard_resampler as sir::Resampler, sir::systematic_resampler].iter() {
        let resamples = resampler(&w, &mut rng).unwrap();
        let resampled = sir::apply_resamples(particles, &resamples);
        assert_eq!(resampled.len(), particles.len());
        assert!(resampled.iter().all(|p| *p == particles[17]));
    }
}

/// Track a truth position with noisy measurements, the final estimate error.
fn track(config: RoadTrackerConfig, seed: u64, start: Vector2<f64>, steps: usize) -> f64 {
    let mut measure_rng = StdRng::seed_from_u64(100 + seed);
    let noise = Normal::new(0., config.measurement_std).unwrap();
    let mut tracker = tracker(config, start, seed);

    let mut truth = start;
    for step in 1..=steps {
        truth.y += config.speed;
        let z = truth + Vector2::new(noise.sample(&mut measure_rng), noise.sample(&mut measure_rng));
        tracker.step(step as f64, &z).unwrap();
    }
    (tracker.state().unwrap() - truth).norm()
}

#[test]
fn test_stationary_convergence() {
    let config = RoadTrackerConfig {
        particle_count: 500,
        speed: 0.,
        motion_std: 0.3,
        measurement_std: 0.2,
        ..RoadTrackerConfig::default()
    };
    let converged = (0..5).filter(|&seed| track(config, seed, Vector2::new(5., 3.), 20) < 0.5).count();
    assert!(converged >= 4, "converged {} of 5", converged);
}

#[test]
fn test_moving_convergence() {
    let config = RoadTrackerConfig {
        particle_count: 500,
        speed: 1.,
        motion_std: 0.2,
        measurement_std: 0.3,
        resampling: ResamplingScheme::Systematic,
        ..RoadTrackerConfig::default()
    };
    let converged = (0..5).filter(|&seed| track(config, seed, Vector2::new(5., 1.), 6) < 0.5).count();
    assert!(converged >= 4, "converged {} of 5", converged);
}

#[test]
fn test_kalman_init() {
    let mut tracker = tracker(small_config(), Vector2::new(5., 3.), 9);
    let state = KalmanState {
        x: Vector2::<f64>::new(0., 10.),
        X: Matrix2::<f64>::identity() * 0.1,
    };
    tracker.init(&state).unwrap();
    assert!(all_on_road(&tracker));

    let summary = tracker.kalman_state().unwrap();
    assert!((summary.x - state.x).norm() < 0.2);
    assert!(summary.X[(0, 0)] > 0. && summary.X[(1, 1)] > 0.);
}

#[test]
fn test_config() {
    let config: RoadTrackerConfig =
        serde_json::from_str(r#"{"particle_count": 50, "resampling": "Systematic", "road": {"width": 3.0}}"#).unwrap();
    assert_eq!(config.particle_count, 50);
    assert_eq!(config.resampling, ResamplingScheme::Systematic);
    assert_eq!(config.road.width, 3.);
    assert_eq!(config.road.x_vert, RoadGeometry::default().x_vert);
    assert_eq!(config.speed, RoadTrackerConfig::default().speed);
    assert!(config.validate().is_ok());
}
