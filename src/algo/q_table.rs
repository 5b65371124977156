use std::collections::HashMap;

use super::Hashable;

/// Action values for every state-action pair
///
/// Pairs that were never written read as `0.0`, so an empty table is the
/// all-zero table.
#[derive(Debug, Clone, PartialEq)]
pub struct QTable<S, A>
where
    S: Hashable,
    A: Hashable,
{
    values: HashMap<(S, A), f32>,
}

impl<S, A> QTable<S, A>
where
    S: Hashable,
    A: Hashable,
{
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn get(&self, state: S, action: A) -> f32 {
        *self.values.get(&(state, action)).unwrap_or(&0.0)
    }

    pub fn set(&mut self, state: S, action: A, value: f32) {
        self.values.insert((state, action), value);
    }

    /// Forget every learned value
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Number of explicitly stored entries
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The greatest value among `actions` in `state`, or `0.0` if `actions` is empty
    pub fn max_value(&self, state: S, actions: &[A]) -> f32 {
        self.best_action(state, actions)
            .map(|a| self.get(state, a))
            .unwrap_or(0.0)
    }

    /// The highest valued action in `state`
    ///
    /// Ties go to the action listed first in `actions`. Note that
    /// [`Iterator::max_by`] would pick the last one, which is why this folds by hand.
    pub fn best_action(&self, state: S, actions: &[A]) -> Option<A> {
        actions
            .iter()
            .map(|&a| (a, self.get(state, a)))
            .fold(None, |best: Option<(A, f32)>, (a, value)| match best {
                Some((_, best_value)) if value <= best_value => best,
                _ => Some((a, value)),
            })
            .map(|(a, _)| a)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(S, A), &f32)> {
        self.values.iter()
    }
}

impl<S, A> Default for QTable<S, A>
where
    S: Hashable,
    A: Hashable,
{
    fn default() -> Self {
        Self::new()
    }
}
