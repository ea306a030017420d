//! A discrete Bayes filter estimating whether a door is open.
//!
//! The door sensor reports open with probability 0.9 when the door is open
//! and with probability 0.5 when it is closed.

use nalgebra::{DMatrix, DVector};

use robo_bayes::DiscreteBayesFilter;

fn main() {
    // Rows are the sensed outcomes (open, closed), columns the door states (open, closed)
    let likelihood = DMatrix::from_row_slice(2, 2, &[0.9, 0.5, 0.1, 0.5]);
    let prior = DVector::from_vec(vec![0.5, 0.5]);
    let mut door = DiscreteBayesFilter::new(likelihood, prior).unwrap();
    println!("Prior P(open) {:.6}", door.belief()[0]);

    for &z in [0, 0, 0, 0, 0, 1, 0, 0].iter() {
        let belief = door.update(z).unwrap();
        let sensed = if z == 0 { "open" } else { "closed" };
        println!("Sensed {:6} P(open) {:.6}", sensed, belief[0]);
    }
}
