#![allow(non_snake_case)]

//! Kalman filter for a Cartesian bot.
//!
//! The bot moves on two independent axes, each driven by a DC motor turning a wheel of radius r.
//! Per axis the motor is modeled as
//!
//! ```text
//! J dω/dt = K i - b ω
//! L di/dt = V - R i - K ω
//!   dp/dt = r ω
//! ```
//!
//! with the commanded voltage V as input. The filter state is `[ω_x, i_x, p_x, ω_y, i_y, p_y]`.
//!
//! Prediction discretises the axis models with a zero-order-hold on the voltage, using the matrix
//! exponential of the augmented system `[[A, B], [0, 0]]`. The same transition is applied to the
//! state mean and covariance. Voltage noise enters the covariance through the input coupling.
//! Observations are of the position on both axes with a (possibly correlated) position noise.

use log::{debug, trace};
use nalgebra::{Matrix2x6, Matrix3, Matrix4, Matrix6, Matrix6x2, Vector2, Vector3, Vector6, U1, U2, U3, U6};
use serde::{Deserialize, Serialize};

use crate::error::{check_time_step, require, EstimateResult};
use crate::linalg::expm::expm;
use crate::models::{Estimator, KalmanEstimator, KalmanState, LinearObserver, LinearPredictor};
use crate::noise::{CorrelatedNoise, CoupledNoise};

/// Index of the angular velocity in an axis state
pub const OMEGA: usize = 0;
/// Index of the motor current in an axis state
pub const CURRENT: usize = 1;
/// Index of the position in an axis state
pub const POSITION: usize = 2;
/// Offset of the y axis in the filter state
pub const Y_AXIS: usize = 3;

/// DC motor and wheel parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotorParams {
    /// Motor constant, torque per current and back EMF per angular velocity
    pub k: f64,
    /// Rotor moment of inertia
    pub j: f64,
    /// Viscous friction
    pub b: f64,
    /// Armature resistance
    pub r: f64,
    /// Armature inductance
    pub l: f64,
    /// Wheel radius
    pub wheel_radius: f64,
}

impl Default for MotorParams {
    fn default() -> Self {
        MotorParams {
            k: 0.01,
            j: 0.01,
            b: 0.1,
            r: 1.,
            l: 0.5,
            wheel_radius: 0.25,
        }
    }
}

impl MotorParams {
    pub fn validate(&self) -> EstimateResult<()> {
        let positive = [self.k, self.j, self.b, self.r, self.l, self.wheel_radius];
        require(
            positive.iter().all(|p| *p > 0. && p.is_finite()),
            format!("motor parameters must be positive {:?}", self),
        )
    }

    /// Continuous time axis model dx/dt = A x + B V.
    pub fn continuous(&self) -> (Matrix3<f64>, Vector3<f64>) {
        let A = Matrix3::new(
            -self.b / self.j, self.k / self.j, 0.,
            -self.k / self.l, -self.r / self.l, 0.,
            self.wheel_radius, 0., 0.,
        );
        let B = Vector3::new(0., 1. / self.l, 0.);
        (A, B)
    }

    /// Zero-order-hold discretisation of the axis model over `dt`.
    ///
    /// exp([[A, B], [0, 0]] dt) = [[Fx, Gx], [0, 1]]
    pub fn discretise(&self, dt: f64) -> (Matrix3<f64>, Vector3<f64>) {
        let (A, B) = self.continuous();
        let mut augmented = Matrix4::<f64>::zeros();
        augmented.fixed_slice_mut::<U3, U3>(0, 0).copy_from(&A);
        augmented.fixed_slice_mut::<U3, U1>(0, 3).copy_from(&B);

        let e = expm(&(augmented * dt));
        (
            e.fixed_slice::<U3, U3>(0, 0).into_owned(),
            e.fixed_slice::<U3, U1>(0, 3).into_owned(),
        )
    }

    /// Steady state angular velocity for a constant voltage, K V / (b R + K²).
    pub fn steady_state_omega(&self, voltage: f64) -> f64 {
        self.k * voltage / (self.b * self.r + self.k * self.k)
    }
}

/// Cartesian bot filter configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartesianBotConfig {
    pub motor: MotorParams,
    /// Variance of the commanded x voltage
    pub vx_variance: f64,
    /// Variance of the commanded y voltage
    pub vy_variance: f64,
}

impl Default for CartesianBotConfig {
    fn default() -> Self {
        CartesianBotConfig {
            motor: MotorParams::default(),
            vx_variance: 0.1,
            vy_variance: 0.2,
        }
    }
}

impl CartesianBotConfig {
    pub fn validate(&self) -> EstimateResult<()> {
        self.motor.validate()?;
        require(
            self.vx_variance >= 0. && self.vy_variance >= 0.,
            "voltage variances must be non-negative",
        )
    }
}

/// An observation of the bot's position.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionMeasurement {
    pub x: f64,
    pub y: f64,
    /// Position noise, may be correlated
    pub noise: CorrelatedNoise<f64, U2>,
}

/// Kalman filter of a Cartesian bot.
#[derive(Clone, Debug)]
pub struct CartesianBot {
    config: CartesianBotConfig,
    state: KalmanState<f64, U6>,
    time: f64,
}

impl CartesianBot {
    /// A bot at rest at time 0.
    pub fn new(config: CartesianBotConfig) -> EstimateResult<Self> {
        config.validate()?;
        debug!("Cartesian bot {:?}", config);
        Ok(CartesianBot {
            config,
            state: KalmanState::new_zero(U6),
            time: 0.,
        })
    }

    /// Reset to a bot at rest, with certainty, at `time`.
    pub fn set_state(&mut self, time: f64) {
        self.state = KalmanState::new_zero(U6);
        self.time = time;
    }

    /// Initialise with a KalmanState at `time`.
    pub fn init_at(&mut self, state: &KalmanState<f64, U6>, time: f64) -> EstimateResult<()> {
        self.init(state)?;
        self.time = time;
        Ok(())
    }

    pub fn config(&self) -> &CartesianBotConfig {
        &self.config
    }

    /// Time of the last step.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// State transition and voltage coupling of both axes over `dt`.
    pub fn transition(&self, dt: f64) -> (Matrix6<f64>, Matrix6x2<f64>) {
        let (Fa, Ga) = self.config.motor.discretise(dt);
        let mut Fx = Matrix6::<f64>::zeros();
        let mut G = Matrix6x2::<f64>::zeros();
        Fx.fixed_slice_mut::<U3, U3>(0, 0).copy_from(&Fa);
        Fx.fixed_slice_mut::<U3, U3>(Y_AXIS, Y_AXIS).copy_from(&Fa);
        G.fixed_slice_mut::<U3, U1>(0, 0).copy_from(&Ga);
        G.fixed_slice_mut::<U3, U1>(Y_AXIS, 1).copy_from(&Ga);
        (Fx, G)
    }

    /// Observation model, the positions of both axes.
    pub fn observe_model() -> Matrix2x6<f64> {
        let mut Hx = Matrix2x6::<f64>::zeros();
        Hx[(0, POSITION)] = 1.;
        Hx[(1, Y_AXIS + POSITION)] = 1.;
        Hx
    }

    /// Predict the bot to `time` with the commanded voltages `vx`, `vy`.
    pub fn predict(&mut self, time: f64, vx: f64, vy: f64) -> EstimateResult<()> {
        let dt = check_time_step(time - self.time)?;
        let (Fx, G) = self.transition(dt);

        let x_pred = Fx * self.state.x + G * Vector2::new(vx, vy);
        let noise = CorrelatedNoise::from_coupled(&CoupledNoise {
            q: Vector2::new(self.config.vx_variance, self.config.vy_variance),
            G,
        });
        LinearPredictor::predict(&mut self.state, &x_pred, &Fx, &noise)?;
        self.time = time;
        trace!("predict t={} x={:?}", time, self.state.x.as_slice());

        Ok(())
    }

    /// Correct with an observed position.
    pub fn update(&mut self, measurement: &PositionMeasurement) -> EstimateResult<()> {
        let Hx = CartesianBot::observe_model();
        let s = Vector2::new(measurement.x, measurement.y) - Hx * self.state.x;
        self.state.observe_innovation(&s, &Hx, &measurement.noise)?;
        trace!("update t={} innovation={:?}", self.time, s.as_slice());

        Ok(())
    }

    /// Complete a step without a measurement, the predicted belief becomes the posterior.
    pub fn skip_measure(&mut self) {
        trace!("no measurement at t={}", self.time);
    }

    /// A complete filter step, predict then update with the measurement if there is one.
    ///
    /// Either the whole step applies or the filter is left unchanged.
    pub fn advance_filter(&mut self, time: f64, vx: f64, vy: f64, measurement: Option<&PositionMeasurement>) -> EstimateResult<()> {
        let prior = (self.state.clone(), self.time);
        let stepped = self.predict(time, vx, vy).and_then(|_| match measurement {
            Some(z) => self.update(z),
            None => {
                self.skip_measure();
                Ok(())
            }
        });
        if stepped.is_err() {
            self.state = prior.0;
            self.time = prior.1;
        }
        stepped
    }

    /// Simulate the bot, a predict only step.
    pub fn simulate_system(&mut self, time: f64, vx: f64, vy: f64) -> EstimateResult<()> {
        self.advance_filter(time, vx, vy, None)
    }

    /// Angular velocities (x, y).
    pub fn peek_omega(&self) -> (f64, f64) {
        self.peek(OMEGA)
    }

    /// Motor currents (x, y).
    pub fn peek_current(&self) -> (f64, f64) {
        self.peek(CURRENT)
    }

    /// Positions (x, y).
    pub fn peek_pos(&self) -> (f64, f64) {
        self.peek(POSITION)
    }

    /// Position covariance.
    pub fn peek_pos_covariance(&self) -> nalgebra::Matrix2<f64> {
        let Hx = CartesianBot::observe_model();
        Hx * self.state.X * Hx.transpose()
    }

    fn peek(&self, index: usize) -> (f64, f64) {
        (self.state.x[index], self.state.x[Y_AXIS + index])
    }
}

impl Estimator<f64, U6> for CartesianBot {
    fn state(&self) -> EstimateResult<Vector6<f64>> {
        Ok(self.state.x)
    }
}

impl KalmanEstimator<f64, U6> for CartesianBot {
    fn init(&mut self, state: &KalmanState<f64, U6>) -> EstimateResult<()> {
        self.state.init(state)
    }

    fn kalman_state(&self) -> EstimateResult<KalmanState<f64, U6>> {
        Ok(self.state.clone())
    }
}
