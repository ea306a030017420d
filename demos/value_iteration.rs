//! Value iteration on a 4 by 4 grid world with a goal and two traps.

use robo_bayes::GridWorld;

fn main() {
    let world = GridWorld::default();
    let solution = world.solve().unwrap();
    println!("Converged after {} iterations", solution.iterations);

    for x in 0..world.size_x {
        let row: Vec<String> = (0..world.size_y)
            .map(|y| format!("{:9.3}", solution.values[(x, y)]))
            .collect();
        println!("{}", row.join(" "));
    }

    let policy = world.greedy_policy(&solution.values).unwrap();
    for (x, row) in policy.iter().enumerate() {
        for (y, best) in row.iter().enumerate() {
            if let Some((nx, ny)) = best {
                println!("({}, {}) -> ({}, {})", x, y, nx, ny);
            }
        }
    }
}
