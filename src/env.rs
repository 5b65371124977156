use rand::Rng;

/// Describes the dynamics of a discrete-time Markov decision process in which
/// an agent can operate.
///
/// The environment itself holds no episode state: the agent tracks where it is
/// and asks the environment what happens next. This keeps the environment
/// shareable and read-only once constructed.
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State;

    /// A representation of an action that an agent can take to affect the environment
    type Action;

    /// The state every episode begins in
    fn start(&self) -> Self::State;

    /// Determine if a state ends the episode
    fn is_terminal(&self, state: &Self::State) -> bool;

    /// The state reached by taking `action` in `state`
    fn transition(&self, state: &Self::State, action: Self::Action) -> Self::State;

    /// The reward received for entering `state`
    fn reward(&self, state: &Self::State) -> f32;
}

/// An environment with a finite, fixed action space
pub trait DiscreteActionSpace: Environment {
    /// Get the available actions, in enumeration order
    ///
    /// The returned slice should never be empty, instead specify an action that represents doing nothing if necessary.
    fn actions(&self) -> &[Self::Action];

    /// Pick one of the available actions uniformly at random
    fn random_action<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Action
    where
        Self::Action: Copy,
    {
        let actions = self.actions();
        actions[rng.gen_range(0..actions.len())]
    }
}
