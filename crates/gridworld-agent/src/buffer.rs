//! Experience store for replay

use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use gridworld_core::{GridAction, GridState, Reward};

/// One stored observation: the context window, the action taken, the reward
/// received and the state reached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Context window, oldest first
    pub states: Vec<GridState>,
    /// Action taken from the most recent context state
    pub action: GridAction,
    /// Reward received
    pub reward: Reward,
    /// State reached
    pub next_state: GridState,
}

impl Transition {
    /// The state the action was taken from
    #[must_use]
    pub fn most_recent_state(&self) -> Option<&GridState> {
        self.states.last()
    }
}

/// Named partitions of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BufferCategory {
    /// Every observation the agent records
    Generic,
}

/// How observations are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SamplingPolicy {
    /// Each stored observation equally likely
    #[default]
    Uniform,
}

/// Categorized replay store
#[derive(Debug, Clone)]
pub struct ExperienceStore {
    categories: IndexMap<BufferCategory, VecDeque<Transition>>,
    capacity: Option<usize>,
    policy: SamplingPolicy,
}

impl ExperienceStore {
    /// Create a store; `capacity` bounds each category with FIFO eviction
    #[must_use]
    pub fn new(capacity: Option<usize>, policy: SamplingPolicy) -> Self {
        let mut categories = IndexMap::new();
        categories.insert(BufferCategory::Generic, VecDeque::new());
        Self {
            categories,
            capacity,
            policy,
        }
    }

    /// Unbounded store with uniform sampling
    #[must_use]
    pub fn unbounded() -> Self {
        Self::new(None, SamplingPolicy::Uniform)
    }

    /// Add an observation to the generic category
    pub fn insert(&mut self, transition: Transition) {
        let buffer = self.categories.entry(BufferCategory::Generic).or_default();
        if let Some(capacity) = self.capacity {
            while buffer.len() >= capacity {
                buffer.pop_front();
            }
        }
        buffer.push_back(transition);
    }

    /// Whether the generic category holds at least `threshold` observations
    #[must_use]
    pub fn is_ready(&self, threshold: usize) -> bool {
        self.category_len(BufferCategory::Generic) >= threshold
    }

    /// Draw one observation from the generic category
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Transition> {
        let buffer = self.categories.get(&BufferCategory::Generic)?;
        if buffer.is_empty() {
            return None;
        }
        match self.policy {
            SamplingPolicy::Uniform => buffer.get(rng.gen_range(0..buffer.len())),
        }
    }

    /// Observations held in one category
    #[must_use]
    pub fn category_len(&self, category: BufferCategory) -> usize {
        self.categories.get(&category).map_or(0, VecDeque::len)
    }

    /// Observations held across all categories
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.values().map(VecDeque::len).sum()
    }

    /// Check if the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every observation
    pub fn clear(&mut self) {
        for buffer in self.categories.values_mut() {
            buffer.clear();
        }
    }

    /// Sampling policy
    #[must_use]
    pub fn policy(&self) -> SamplingPolicy {
        self.policy
    }
}

impl Default for ExperienceStore {
    fn default() -> Self {
        Self::unbounded()
    }
}
