//! Particle filter tracking a vehicle on an L shaped road.
//!
//! The vehicle drives up the vertical segment and turns onto the horizontal segment, slowing down
//! at the turn.

use nalgebra::{Matrix2, Vector2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use robo_bayes::models::Estimator;
use robo_bayes::{RoadTracker, RoadTrackerConfig};

fn main() {
    let config = RoadTrackerConfig::default();
    let mut truth = Vector2::new(config.road.x_vert, 1.);
    let mut tracker = RoadTracker::initialize(
        config,
        &truth,
        &Matrix2::identity(),
        0.,
        Box::new(StdRng::seed_from_u64(1)),
    )
    .unwrap();

    let mut rng = StdRng::seed_from_u64(2);
    let measurement_noise = Normal::new(0., config.measurement_std).unwrap();

    // Slow down after turning onto the horizontal segment
    let turn_speed = config.speed / 2.;
    let mut speed = config.speed;
    for step in 1..=20 {
        if truth.y < config.road.y_horiz {
            truth.y += speed;
        } else {
            if speed != turn_speed {
                speed = turn_speed;
                tracker.set_speed(speed).unwrap();
            }
            truth.x -= speed;
        }
        let z = truth + Vector2::new(measurement_noise.sample(&mut rng), measurement_noise.sample(&mut rng));
        tracker.step(step as f64, &z).unwrap();

        let estimate = tracker.state().unwrap();
        println!(
            "t {:2} truth ({:5.2}, {:5.2}) estimate ({:5.2}, {:5.2}) error {:.3}",
            step,
            truth.x,
            truth.y,
            estimate.x,
            estimate.y,
            (estimate - truth).norm()
        );
    }
}
