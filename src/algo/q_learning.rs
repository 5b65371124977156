use std::{collections::HashMap, fmt::Debug, ops::ControlFlow};

use log::{debug, info, trace, warn};
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    assert_interval,
    env::{DiscreteActionSpace, Environment},
    exploration::{Choice, EpsilonGreedy},
    gym::{Action, Cell, GridWorld},
};

use super::{Hashable, QTable};

/// Configuration for the [`QLearningAgent`]
#[derive(Debug, Clone, PartialEq)]
pub struct QLearningAgentConfig {
    /// Learning rate
    ///
    /// **Default**: `0.1`
    pub alpha: f32,
    /// Exploration rate of the epsilon greedy policy
    ///
    /// **Default**: `0.2`
    pub epsilon: f32,
    /// Discount factor, fixed for the lifetime of the agent
    ///
    /// **Default**: `0.9`
    pub gamma: f32,
    /// Seed for the agent's random source, or `None` to seed from system entropy
    ///
    /// **Default**: `None`
    pub seed: Option<u64>,
}

impl Default for QLearningAgentConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            epsilon: 0.2,
            gamma: 0.9,
            seed: None,
        }
    }
}

/// Where the agent is and what it has collected since the run began
#[derive(Debug, Clone, PartialEq)]
pub struct AgentState<S> {
    pub position: S,
    pub cumulative_reward: f32,
}

/// Reported to the observer after every step of an episode
#[derive(Debug, Clone, PartialEq)]
pub struct StepEvent<S, A> {
    /// The state the agent moved into
    pub state: S,
    /// The action that moved it there
    pub action: A,
    /// Reward for entering `state`
    pub reward: f32,
    /// Sum of rewards since the run began, including `reward`
    pub cumulative_reward: f32,
    /// 1-based index of the step within the episode
    pub step: u32,
}

/// Outcome of a call to [`QLearningAgent::run_episode`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeSummary {
    pub steps: u32,
    pub total_reward: f32,
    /// `false` only if the observer stopped the episode early
    pub reached_exit: bool,
}

/// A tabular Q-learning agent
///
/// ### Generics
/// - `E` - The [`Environment`] in which the agent will learn
///     - The state and action spaces must both be discrete because a Q value is recorded for each state action pair
///     - For the same reason, the state and action types must be [`Hashable`]
pub struct QLearningAgent<E>
where
    E: Environment + DiscreteActionSpace,
    E::State: Hashable + Debug,
    E::Action: Hashable + Debug,
{
    env: E,
    q_table: QTable<E::State, E::Action>,
    state: AgentState<E::State>,
    exploration: EpsilonGreedy,
    alpha: f32,   // learning rate
    gamma: f32,   // discount factor
    episode: u32, // completed episodes since the last reset
    rng: StdRng,
}

impl<E> QLearningAgent<E>
where
    E: Environment + DiscreteActionSpace,
    E::State: Hashable + Debug,
    E::Action: Hashable + Debug,
{
    /// Initialize a new agent at the start state of `env` with an all-zero table
    ///
    /// **Panics** if `gamma` is not in the interval `[0,1]`
    pub fn new(env: E, config: QLearningAgentConfig) -> Self {
        assert_interval!(config.gamma, 0.0, 1.0);
        warn_out_of_range("alpha", config.alpha);
        warn_out_of_range("epsilon", config.epsilon);

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let state = AgentState {
            position: env.start(),
            cumulative_reward: 0.0,
        };

        Self {
            env,
            q_table: QTable::new(),
            state,
            exploration: EpsilonGreedy::new(config.epsilon),
            alpha: config.alpha,
            gamma: config.gamma,
            episode: 0,
            rng,
        }
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn q_table(&self) -> &QTable<E::State, E::Action> {
        &self.q_table
    }

    /// Mutable access to the table, e.g. to pre-seed values
    pub fn q_table_mut(&mut self) -> &mut QTable<E::State, E::Action> {
        &mut self.q_table
    }

    pub fn state(&self) -> &AgentState<E::State> {
        &self.state
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn epsilon(&self) -> f32 {
        self.exploration.epsilon()
    }

    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    /// Number of episodes that reached a terminal state since the last [`reset`](Self::reset)
    pub fn episodes(&self) -> u32 {
        self.episode
    }

    /// Set the learning rate and exploration rate for the following runs
    ///
    /// Values outside `[0,1]` are not rejected, only logged.
    pub fn configure(&mut self, alpha: f32, epsilon: f32) {
        warn_out_of_range("alpha", alpha);
        warn_out_of_range("epsilon", epsilon);
        self.alpha = alpha;
        self.exploration.set_epsilon(epsilon);
        info!("Configured alpha = {alpha}, epsilon = {epsilon}");
    }

    /// Forget everything learned and go back to the start state
    pub fn reset(&mut self) {
        self.q_table.clear();
        self.episode = 0;
        self.restart();
        info!("Agent reset");
    }

    /// Go back to the start state and clear the cumulative reward, keeping the table
    pub fn restart(&mut self) {
        self.state = AgentState {
            position: self.env.start(),
            cumulative_reward: 0.0,
        };
    }

    /// Move the agent to an arbitrary state without learning anything
    pub fn place_at(&mut self, position: E::State) {
        self.state.position = position;
    }

    /// Restart and learn until a terminal state is reached
    pub fn learn_path(
        &mut self,
        on_step: impl FnMut(&StepEvent<E::State, E::Action>),
    ) -> EpisodeSummary {
        self.restart();
        self.run_episode(on_step)
    }

    /// Learn from the current position until a terminal state is reached
    ///
    /// There is no step limit. `on_step` is called after every step.
    pub fn run_episode(
        &mut self,
        mut on_step: impl FnMut(&StepEvent<E::State, E::Action>),
    ) -> EpisodeSummary {
        self.run_episode_until(|event| {
            on_step(event);
            ControlFlow::Continue(())
        })
    }

    /// Like [`run_episode`](Self::run_episode), but `on_step` may stop the
    /// episode by returning [`ControlFlow::Break`]
    ///
    /// A stopped episode keeps everything learned so far and leaves the agent
    /// where it stopped.
    pub fn run_episode_until(
        &mut self,
        mut on_step: impl FnMut(&StepEvent<E::State, E::Action>) -> ControlFlow<()>,
    ) -> EpisodeSummary {
        let mut steps = 0;
        let mut reward_sum = 0.0;

        while !self.env.is_terminal(&self.state.position) {
            steps += 1;
            let state = self.state.position;
            let action = self.act(state);
            let next_state = self.env.transition(&state, action);
            let reward = self.env.reward(&next_state);

            self.learn(state, action, reward, next_state);

            self.state.position = next_state;
            self.state.cumulative_reward += reward;
            reward_sum += reward;

            trace!("Step {steps}: {state:?} --{action:?}--> {next_state:?}, reward {reward}");
            let event = StepEvent {
                state: next_state,
                action,
                reward,
                cumulative_reward: self.state.cumulative_reward,
                step: steps,
            };
            if on_step(&event).is_break() {
                debug!("Episode stopped by observer after {steps} steps");
                return EpisodeSummary {
                    steps,
                    total_reward: reward_sum,
                    reached_exit: false,
                };
            }
        }

        self.episode += 1;
        debug!(
            "Episode {} finished in {steps} steps, total reward {}",
            self.episode, self.state.cumulative_reward
        );

        EpisodeSummary {
            steps,
            total_reward: reward_sum,
            reached_exit: true,
        }
    }

    /// Follow the best known actions from the start state without learning
    ///
    /// Stops at a terminal state or after `max_steps` moves. The start state is
    /// the first element.
    pub fn greedy_path(&self, max_steps: usize) -> Vec<E::State> {
        let mut position = self.env.start();
        let mut path = vec![position];
        for _ in 0..max_steps {
            if self.env.is_terminal(&position) {
                break;
            }
            let Some(action) = self.q_table.best_action(position, self.env.actions()) else {
                break;
            };
            position = self.env.transition(&position, action);
            path.push(position);
        }
        path
    }

    /// Epsilon greedy action selection
    fn act(&mut self, state: E::State) -> E::Action {
        match self.exploration.choose(&mut self.rng) {
            Choice::Explore => self.env.random_action(&mut self.rng),
            Choice::Exploit => self
                .q_table
                .best_action(state, self.env.actions())
                .unwrap_or_else(|| self.env.random_action(&mut self.rng)),
        }
    }

    /// Q(s,a) += alpha * (r + gamma * max_a' Q(s',a') - Q(s,a))
    fn learn(&mut self, state: E::State, action: E::Action, reward: f32, next_state: E::State) {
        let q_value = self.q_table.get(state, action);
        let max_next_q = self.q_table.max_value(next_state, self.env.actions());
        let updated = q_value + self.alpha * (reward + self.gamma * max_next_q - q_value);
        self.q_table.set(state, action, updated);
    }
}

impl QLearningAgent<GridWorld> {
    /// Best known action for every non-exit cell that has been learned about
    pub fn greedy_policy(&self) -> HashMap<Cell, Action> {
        let actions = self.env.actions();
        self.env
            .cells()
            .filter(|cell| !self.env.is_terminal(cell))
            .filter(|&cell| actions.iter().any(|&a| self.q_table.get(cell, a) != 0.0))
            .filter_map(|cell| {
                self.q_table
                    .best_action(cell, actions)
                    .map(|action| (cell, action))
            })
            .collect()
    }
}

fn warn_out_of_range(name: &str, value: f32) {
    if !(0.0..=1.0).contains(&value) {
        warn!("{name} = {value} is outside [0, 1]");
    }
}

#[cfg(test)]
mod tests {
    use statrs::statistics::Statistics;

    use super::*;

    fn agent(alpha: f32, epsilon: f32, seed: u64) -> QLearningAgent<GridWorld> {
        QLearningAgent::new(
            GridWorld::new(),
            QLearningAgentConfig {
                alpha,
                epsilon,
                gamma: 0.9,
                seed: Some(seed),
            },
        )
    }

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-4,
            "Expected {expected}, got {actual}"
        );
    }

    /// The whitelisted route from start to exit, with the move leading into each cell
    const ROUTE: [(Action, Cell); 8] = [
        (Action::Down, Cell::new(0, 1)),
        (Action::Right, Cell::new(1, 1)),
        (Action::Down, Cell::new(1, 2)),
        (Action::Right, Cell::new(2, 2)),
        (Action::Down, Cell::new(2, 3)),
        (Action::Right, Cell::new(3, 3)),
        (Action::Right, Cell::new(4, 3)),
        (Action::Down, Cell::new(4, 4)),
    ];

    #[test]
    fn starts_at_start_with_defaults() {
        let agent = QLearningAgent::new(GridWorld::new(), QLearningAgentConfig::default());
        assert_eq!(agent.state().position, Cell::new(0, 0));
        assert_eq!(agent.state().cumulative_reward, 0.0);
        assert_eq!(agent.alpha(), 0.1);
        assert_eq!(agent.epsilon(), 0.2);
        assert_eq!(agent.gamma(), 0.9);
        assert!(agent.q_table().is_empty());
    }

    #[test]
    #[should_panic(expected = "Invalid value for `config.gamma`")]
    fn gamma_must_be_in_unit_interval() {
        QLearningAgent::new(
            GridWorld::new(),
            QLearningAgentConfig {
                gamma: 1.5,
                ..Default::default()
            },
        );
    }

    #[test]
    fn configure_accepts_out_of_range_values() {
        let mut agent = agent(0.1, 0.2, 0);
        agent.configure(0.5, 0.0);
        assert_eq!(agent.alpha(), 0.5);
        assert_eq!(agent.epsilon(), 0.0);

        agent.configure(1.2, -0.1);
        assert_eq!(agent.alpha(), 1.2);
        assert_eq!(agent.epsilon(), -0.1);
    }

    #[test]
    fn reset_forgets_and_is_idempotent() {
        let mut agent = agent(0.5, 0.5, 1);
        agent.learn_path(|_| {});
        assert!(!agent.q_table().is_empty());
        assert_eq!(agent.episodes(), 1);

        agent.reset();
        let once = (agent.q_table().clone(), agent.state().clone(), agent.episodes());
        agent.reset();
        let twice = (agent.q_table().clone(), agent.state().clone(), agent.episodes());

        assert_eq!(once, twice);
        assert_eq!(once.0, QTable::new());
        assert_eq!(
            once.1,
            AgentState {
                position: Cell::new(0, 0),
                cumulative_reward: 0.0
            }
        );
        assert_eq!(once.2, 0);
    }

    #[test]
    fn restart_keeps_table() {
        let mut agent = agent(0.5, 0.5, 2);
        agent.learn_path(|_| {});
        let table = agent.q_table().clone();

        agent.place_at(Cell::new(2, 2));
        agent.restart();
        assert_eq!(agent.state().position, Cell::new(0, 0));
        assert_eq!(agent.state().cumulative_reward, 0.0);
        assert_eq!(agent.q_table(), &table);
    }

    #[test]
    fn greedy_finish_from_three_three() {
        let mut agent = agent(0.5, 0.0, 3);
        agent
            .q_table_mut()
            .set(Cell::new(3, 3), Action::Right, 10.0);
        agent.q_table_mut().set(Cell::new(4, 3), Action::Down, 10.0);
        agent.place_at(Cell::new(3, 3));

        let mut events = Vec::new();
        let summary = agent.run_episode(|e| events.push(e.clone()));

        assert_eq!(
            events,
            vec![
                StepEvent {
                    state: Cell::new(4, 3),
                    action: Action::Right,
                    reward: 1.0,
                    cumulative_reward: 1.0,
                    step: 1,
                },
                StepEvent {
                    state: Cell::new(4, 4),
                    action: Action::Down,
                    reward: 100.0,
                    cumulative_reward: 101.0,
                    step: 2,
                },
            ]
        );
        assert_eq!(
            summary,
            EpisodeSummary {
                steps: 2,
                total_reward: 101.0,
                reached_exit: true,
            }
        );
        assert_eq!(agent.state().position, Cell::new(4, 4));
        assert_eq!(agent.episodes(), 1);

        // 10 + 0.5 * (1 + 0.9 * 10 - 10)
        assert_close(agent.q_table().get(Cell::new(3, 3), Action::Right), 10.0);
        // 10 + 0.5 * (100 + 0.9 * 0 - 10)
        assert_close(agent.q_table().get(Cell::new(4, 3), Action::Down), 55.0);
    }

    #[test]
    fn zero_table_exploits_first_action() {
        let mut agent = agent(0.5, 0.0, 4);
        let mut first = None;
        agent.run_episode_until(|e| {
            first = Some(e.clone());
            ControlFlow::Break(())
        });

        let first = first.expect("one step was taken");
        assert_eq!(first.action, Action::Up, "Ties go to Up");
        assert_eq!(first.state, Cell::new(0, 0), "Bounced off the top wall");
        assert_eq!(first.reward, 0.0, "Start cell reward, no penalty");
        assert_eq!(agent.q_table().get(Cell::new(0, 0), Action::Up), 0.0);
    }

    #[test]
    fn bounce_left_at_start() {
        let mut agent = agent(0.5, 0.0, 5);
        agent.q_table_mut().set(Cell::new(0, 0), Action::Left, 2.0);

        let mut events = Vec::new();
        let summary = agent.run_episode_until(|e| {
            events.push(e.clone());
            ControlFlow::Break(())
        });

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, Action::Left);
        assert_eq!(events[0].state, Cell::new(0, 0));
        assert_eq!(events[0].reward, 0.0);
        assert!(!summary.reached_exit);
        assert_eq!(agent.episodes(), 0, "Stopped episodes are not counted");
        // 2 + 0.5 * (0 + 0.9 * 2 - 2)
        assert_close(agent.q_table().get(Cell::new(0, 0), Action::Left), 1.9);
    }

    #[test]
    fn seeded_route_is_deterministic() {
        let run = |seed| {
            let mut agent = agent(0.5, 0.0, seed);
            let mut from = Cell::new(0, 0);
            for (action, to) in ROUTE {
                agent.q_table_mut().set(from, action, 50.0);
                from = to;
            }
            let mut events = Vec::new();
            let summary = agent.learn_path(|e| events.push((e.action, e.state)));
            (events, summary)
        };

        let (events, summary) = run(10);
        assert_eq!(events, ROUTE.to_vec());
        assert_eq!(summary.steps, 8);
        assert_eq!(summary.total_reward, 7.0 + 100.0);
        assert_eq!(run(11), (events, summary), "Independent of the seed");
    }

    #[test]
    fn observer_can_stop_the_episode() {
        let mut agent = agent(0.1, 1.0, 6);
        let mut seen = 0;
        let summary = agent.run_episode_until(|e| {
            seen = e.step;
            if e.step == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        assert_eq!(seen, 3);
        assert_eq!(summary.steps, 3);
        assert!(!summary.reached_exit);
        assert_ne!(agent.state().position, Cell::new(4, 4));
    }

    #[test]
    fn cumulative_reward_matches_events() {
        let mut agent = agent(0.3, 0.3, 7);
        let mut rewards = Vec::new();
        let mut last_cumulative = 0.0;
        let summary = agent.learn_path(|e| {
            rewards.push(e.reward);
            last_cumulative = e.cumulative_reward;
        });

        assert_eq!(rewards.len() as u32, summary.steps);
        assert_eq!(*rewards.last().unwrap(), 100.0, "Last step enters the exit");
        assert_close(last_cumulative, rewards.iter().sum());
        assert_close(summary.total_reward, last_cumulative);
        assert_close(agent.state().cumulative_reward, last_cumulative);
    }

    #[test]
    fn episode_at_exit_is_empty() {
        let mut agent = agent(0.1, 0.2, 8);
        agent.place_at(Cell::new(4, 4));
        let mut calls = 0;
        let summary = agent.run_episode(|_| calls += 1);
        assert_eq!(calls, 0);
        assert_eq!(summary.steps, 0);
        assert!(summary.reached_exit);
    }

    #[test]
    fn learns_the_maze() {
        let mut agent = agent(0.1, 0.2, 2024);
        let steps = (0..600)
            .map(|_| agent.learn_path(|_| {}).steps as f64)
            .collect::<Vec<_>>();

        let early = steps[..50].iter().mean();
        let late = steps[steps.len() - 50..].iter().mean();
        assert!(
            late < early,
            "Episodes should get shorter: first 50 averaged {early}, last 50 averaged {late}"
        );

        let path = agent.greedy_path(50);
        assert_eq!(path.last(), Some(&Cell::new(4, 4)), "Greedy path {path:?}");

        let policy = agent.greedy_policy();
        assert!(!policy.contains_key(&Cell::new(4, 4)));
        assert!(policy.contains_key(&Cell::new(0, 0)));
    }
}
