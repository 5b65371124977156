//! Tabular Q-learning for pathfinding in a small grid world with obstacles
//!
//! A [`QLearningAgent`](algo::QLearningAgent) learns to walk from the start
//! cell of a [`GridWorld`](gym::GridWorld) to its exit. Each step is reported
//! to a caller-supplied observer, which is where any rendering or pacing belongs.

/// Implemented RL algorithms
pub mod algo;

/// Environment
pub mod env;

/// Exploration policies
pub mod exploration;

/// Grid world environments
pub mod gym;

/// Terminal visualization of the learning agent
#[cfg(feature = "viz")]
pub mod viz;

mod util;
