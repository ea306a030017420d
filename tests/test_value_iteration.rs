//! Test grid world value iteration.

use approx::assert_abs_diff_eq;
use nalgebra::DMatrix;

use robo_bayes::mdp::TerminalState;
use robo_bayes::{EstimateError, GridWorld};

#[test]
fn test_first_iteration() {
    let world = GridWorld::default();
    let first = world.iterate(&world.initial_values()).unwrap();
    #[rustfmt::skip]
    let expect = DMatrix::from_row_slice(4, 4, &[
        50., -100., -18.9, -0.9,
        35.1, -18.9, -100., -9.9,
        -0.9, -0.9, -9.9, -0.9,
        -0.9, -0.9, -0.9, -0.9,
    ]);
    assert_abs_diff_eq!(first, expect, epsilon = 1e-9);
}

#[test]
fn test_converged_values() {
    let world = GridWorld::default();
    let solution = world.solve().unwrap();
    assert_eq!(solution.iterations, 29);

    #[rustfmt::skip]
    let expect = DMatrix::from_row_slice(4, 4, &[
        50., -100., -23.532482, -6.433211,
        38.5728, 7.373304, -100., -4.21648,
        31.213358, 21.916061, 6.157203, 8.698339,
        26.316719, 21.487748, 16.303291, 13.088403,
    ]);
    assert_abs_diff_eq!(solution.values, expect, epsilon = 1e-5);

    // Terminal values are fixed
    for ts in world.terminal_states.iter() {
        assert_eq!(solution.values[(ts.x, ts.y)], ts.value);
    }
}

#[test]
fn test_greedy_policy() {
    let world = GridWorld::default();
    let solution = world.solve().unwrap();
    let policy = world.greedy_policy(&solution.values).unwrap();

    assert_eq!(policy[0][0], None);
    assert_eq!(policy[0][1], None);
    assert_eq!(policy[1][2], None);
    assert_eq!(policy[1][0], Some((0, 0)));
    assert_eq!(policy[2][0], Some((1, 0)));
    assert_eq!(policy[0][2], Some((0, 3)));
    assert_eq!(policy[3][3], Some((3, 2)));
}

#[test]
fn test_motion_distribution() {
    let world = GridWorld::default();
    assert_eq!(world.neighbours(0, 0), vec![(1, 0), (0, 1)]);
    assert_eq!(world.neighbours(1, 1), vec![(0, 1), (2, 1), (1, 0), (1, 2)]);

    for n in 2..=4 {
        let distribution = world.motion_distribution(n);
        for u in 0..n {
            assert_abs_diff_eq!(distribution.row(u).sum(), 1., epsilon = 1e-12);
        }
    }
}

#[test]
fn test_zero_valued_terminal() {
    let world = GridWorld {
        terminal_states: vec![
            TerminalState { x: 0, y: 0, value: 0. },
            TerminalState { x: 3, y: 3, value: 10. },
        ],
        ..GridWorld::default()
    };
    let solution = world.solve().unwrap();
    assert_eq!(solution.values[(0, 0)], 0.);
    assert!(world.greedy_policy(&solution.values).unwrap()[0][0].is_none());
}

#[test]
fn test_values_shape() {
    let world = GridWorld::default();
    let wrong = DMatrix::zeros(3, 4);
    assert!(matches!(world.iterate(&wrong), Err(EstimateError::InvalidConfig(_))));
    assert!(matches!(world.greedy_policy(&wrong), Err(EstimateError::InvalidConfig(_))));
    assert!(world.iterate(&DMatrix::zeros(4, 4)).is_ok());
}

#[test]
fn test_not_converged() {
    let world = GridWorld {
        max_iterations: 3,
        ..GridWorld::default()
    };
    assert!(matches!(
        world.solve(),
        Err(EstimateError::NotConverged { iterations: 3, .. })
    ));
}

#[test]
fn test_invalid_configuration() {
    let invalid = [
        GridWorld { gamma: 1., ..GridWorld::default() },
        GridWorld { gamma: -0.1, ..GridWorld::default() },
        GridWorld { slip_skid_prob: 0.5, ..GridWorld::default() },
        GridWorld { slip_skid_prob: -0.1, ..GridWorld::default() },
        GridWorld { epsilon: 0., ..GridWorld::default() },
        GridWorld { size_x: 0, ..GridWorld::default() },
        GridWorld {
            terminal_states: vec![TerminalState { x: 4, y: 0, value: 1. }],
            ..GridWorld::default()
        },
    ];
    for world in invalid.iter() {
        assert!(matches!(world.solve(), Err(EstimateError::InvalidConfig(_))), "{:?}", world);
    }
}

#[test]
fn test_config() {
    let world: GridWorld = serde_json::from_str(r#"{"gamma": 0.5, "terminal_states": []}"#).unwrap();
    assert_eq!(world.gamma, 0.5);
    assert!(world.terminal_states.is_empty());
    assert_eq!(world.size_x, 4);
    assert!(world.validate().is_ok());
}
