//! Kalman filter of a Cartesian bot driven by DC motors.
//!
//! The x motor is driven with a constant voltage, the y motor with a step. Noisy position
//! measurements of a simulated bot arrive every second.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use robo_bayes::noise::CorrelatedNoise;
use robo_bayes::{CartesianBot, CartesianBotConfig, PositionMeasurement};

fn main() {
    let config = CartesianBotConfig::default();
    let mut truth = CartesianBot::new(config).unwrap();
    let mut estimate = CartesianBot::new(config).unwrap();

    let mut rng = StdRng::seed_from_u64(1);
    let position_noise = Normal::new(0., 0.05).unwrap();
    let noise = CorrelatedNoise::from_std_correlation(0.05, 0.05, 0.).unwrap();

    let dt = 0.1;
    for step in 1..=100 {
        let time = step as f64 * dt;
        let vx = 10.;
        let vy = if time < 5. { 0. } else { 5. };
        truth.simulate_system(time, vx, vy).unwrap();

        let measurement = if step % 10 == 0 {
            let (x, y) = truth.peek_pos();
            Some(PositionMeasurement {
                x: x + position_noise.sample(&mut rng),
                y: y + position_noise.sample(&mut rng),
                noise: noise.clone(),
            })
        } else {
            None
        };
        estimate.advance_filter(time, vx, vy, measurement.as_ref()).unwrap();

        if measurement.is_some() {
            let (x, y) = estimate.peek_pos();
            let cov = estimate.peek_pos_covariance();
            println!(
                "t {:4.1} position ({:.3}, {:.3}) variance ({:.5}, {:.5}) truth ({:.3}, {:.3})",
                time,
                x,
                y,
                cov[(0, 0)],
                cov[(1, 1)],
                truth.peek_pos().0,
                truth.peek_pos().1
            );
        }
    }
    let (wx, wy) = estimate.peek_omega();
    println!("Final angular velocity ({:.4}, {:.4})", wx, wy);
}
