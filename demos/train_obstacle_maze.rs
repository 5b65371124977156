use std::{error::Error, fs, path::Path};

use qmaze::{
    algo::{QLearningAgent, QLearningAgentConfig},
    gym::GridWorld,
};

const NUM_EPISODES: u16 = 500;

/// Learn the maze many times over without a UI and record how each run went
fn main() -> Result<(), Box<dyn Error>> {
    let path = Path::new("demos/out");
    fs::create_dir_all(path)?;

    let mut agent = QLearningAgent::new(
        GridWorld::new(),
        QLearningAgentConfig {
            seed: Some(0),
            ..Default::default()
        },
    );

    let mut wtr = csv::Writer::from_path(path.join("obstacle_maze.csv"))?;
    wtr.write_record(["episode", "steps", "reward"])?;

    for episode in 0..NUM_EPISODES {
        let summary = agent.learn_path(|_| {});
        wtr.write_record(&[
            episode.to_string(),
            summary.steps.to_string(),
            summary.total_reward.to_string(),
        ])?;
    }

    wtr.flush()?;

    let route = agent
        .greedy_path(50)
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ");
    println!("Greedy route after {NUM_EPISODES} episodes: {route}");

    Ok(())
}
