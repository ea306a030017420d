//! Value iteration on a grid world Markov decision process.
//!
//! Cells of an X by Y grid are states. From a cell the controls are moves to each 4-neighbour.
//! A move reaches the intended neighbour with probability `1 - (n - 1) p` and slips or skids to
//! each of the other `n - 1` neighbours with probability `p`. Every move costs `move_cost`.
//! Terminal cells keep a fixed value.

use log::debug;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{require, EstimateError, EstimateResult};

/// A terminal cell and its value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerminalState {
    pub x: usize,
    pub y: usize,
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridWorld {
    pub size_x: usize,
    pub size_y: usize,
    /// Discount factor
    pub gamma: f64,
    /// Probability of reaching each unintended neighbour
    pub slip_skid_prob: f64,
    pub move_cost: f64,
    pub terminal_states: Vec<TerminalState>,
    /// Convergence threshold on the largest value change of an iteration
    pub epsilon: f64,
    pub max_iterations: usize,
}

impl Default for GridWorld {
    fn default() -> Self {
        GridWorld {
            size_x: 4,
            size_y: 4,
            gamma: 0.9,
            slip_skid_prob: 0.1,
            move_cost: 1.,
            terminal_states: vec![
                TerminalState { x: 0, y: 1, value: -100. },
                TerminalState { x: 0, y: 0, value: 50. },
                TerminalState { x: 1, y: 2, value: -100. },
            ],
            epsilon: 0.001,
            max_iterations: 10_000,
        }
    }
}

/// Values of converged value iteration.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueSolution {
    /// Values indexed by (x, y)
    pub values: DMatrix<f64>,
    pub iterations: usize,
}

impl GridWorld {
    pub fn validate(&self) -> EstimateResult<()> {
        require(self.size_x > 0 && self.size_y > 0, "empty grid")?;
        require(self.size_x * self.size_y > 1, "a single cell has no moves")?;
        require(
            self.gamma >= 0. && self.gamma < 1.,
            format!("discount {} outside [0, 1)", self.gamma),
        )?;
        // The worst case cell has 4 neighbours
        let max_neighbours = self.neighbours(self.size_x / 2, self.size_y / 2).len();
        require(
            self.slip_skid_prob >= 0. && 1. - (max_neighbours as f64 - 1.) * self.slip_skid_prob >= 0.,
            format!("slip/skid probability {} too large", self.slip_skid_prob),
        )?;
        require(self.move_cost.is_finite(), "move cost must be finite")?;
        require(self.epsilon > 0., "epsilon must be positive")?;
        for ts in &self.terminal_states {
            require(
                ts.x < self.size_x && ts.y < self.size_y,
                format!("terminal state ({}, {}) outside the grid", ts.x, ts.y),
            )?;
        }
        Ok(())
    }

    /// Value of a terminal cell.
    pub fn terminal_value(&self, x: usize, y: usize) -> Option<f64> {
        self.terminal_states
            .iter()
            .find(|ts| ts.x == x && ts.y == y)
            .map(|ts| ts.value)
    }

    /// Initial values, zero except terminal cells.
    pub fn initial_values(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.size_x, self.size_y, |x, y| self.terminal_value(x, y).unwrap_or(0.))
    }

    /// The 4-neighbours of a cell in the order left, right, top, bottom.
    pub fn neighbours(&self, x: usize, y: usize) -> Vec<(usize, usize)> {
        let mut n = Vec::with_capacity(4);
        if x > 0 {
            n.push((x - 1, y));
        }
        if x + 1 < self.size_x {
            n.push((x + 1, y));
        }
        if y > 0 {
            n.push((x, y - 1));
        }
        if y + 1 < self.size_y {
            n.push((x, y + 1));
        }
        n
    }

    /// Motion distribution, row u is the distribution over neighbours when moving to neighbour u.
    pub fn motion_distribution(&self, neighbour_count: usize) -> DMatrix<f64> {
        let move_prob = 1. - (neighbour_count as f64 - 1.) * self.slip_skid_prob;
        DMatrix::from_fn(neighbour_count, neighbour_count, |u, j| {
            if u == j {
                move_prob
            } else {
                self.slip_skid_prob
            }
        })
    }

    /// Expected value less the move cost of each control from a non terminal cell.
    fn control_values(&self, values: &DMatrix<f64>, x: usize, y: usize) -> (Vec<(usize, usize)>, Vec<f64>) {
        let neighbours = self.neighbours(x, y);
        let distribution = self.motion_distribution(neighbours.len());
        let control = (0..neighbours.len())
            .map(|u| {
                let expected: f64 = neighbours
                    .iter()
                    .enumerate()
                    .map(|(j, &(nx, ny))| values[(nx, ny)] * distribution[(u, j)])
                    .sum();
                expected - self.move_cost
            })
            .collect();
        (neighbours, control)
    }

    /// Checks `values` is indexed by the grid's (x, y).
    pub fn check_values(&self, values: &DMatrix<f64>) -> EstimateResult<()> {
        require(
            values.shape() == (self.size_x, self.size_y),
            format!("values {:?} do not match the {}x{} grid", values.shape(), self.size_x, self.size_y),
        )
    }

    /// One Bellman backup of all non terminal cells.
    pub fn iterate(&self, values: &DMatrix<f64>) -> EstimateResult<DMatrix<f64>> {
        self.check_values(values)?;
        let mut next = self.initial_values();
        for x in 0..self.size_x {
            for y in 0..self.size_y {
                if self.terminal_value(x, y).is_some() {
                    continue;
                }
                let (_, control) = self.control_values(values, x, y);
                let best = control.into_iter().fold(f64::NEG_INFINITY, f64::max);
                next[(x, y)] = self.gamma * best;
            }
        }
        Ok(next)
    }

    /// Iterate from the initial values until the largest change is no more than epsilon.
    pub fn solve(&self) -> EstimateResult<ValueSolution> {
        self.validate()?;
        let mut values = self.initial_values();
        let mut delta = f64::INFINITY;
        let mut iterations = 0;
        while delta > self.epsilon {
            if iterations == self.max_iterations {
                return Err(EstimateError::NotConverged { iterations, delta });
            }
            let next = self.iterate(&values)?;
            delta = (&next - &values).amax();
            values = next;
            iterations += 1;
            debug!("value iteration {} delta {}", iterations, delta);
        }
        Ok(ValueSolution { values, iterations })
    }

    /// The best move from each non terminal cell, indexed by (x, y).
    pub fn greedy_policy(&self, values: &DMatrix<f64>) -> EstimateResult<Vec<Vec<Option<(usize, usize)>>>> {
        self.check_values(values)?;
        Ok((0..self.size_x)
            .map(|x| {
                (0..self.size_y)
                    .map(|y| {
                        if self.terminal_value(x, y).is_some() {
                            return None;
                        }
                        let (neighbours, control) = self.control_values(values, x, y);
                        control
                            .iter()
                            .enumerate()
                            .max_by(|a, b| a.1.total_cmp(b.1))
                            .map(|(u, _)| neighbours[u])
                    })
                    .collect()
            })
            .collect())
    }
}
