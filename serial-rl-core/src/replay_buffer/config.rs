//! Configuration of [`ReplayBuffer`](super::ReplayBuffer).
use serde::{Deserialize, Serialize};
use std::default::Default;

fn default_replay_buffer_size() -> usize {
    10000
}

/// Configuration of [`ReplayBuffer`](super::ReplayBuffer),
/// `policy.other.replay_buffer`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ReplayBufferConfig {
    /// The maximum number of samples kept in the buffer.
    #[serde(default = "default_replay_buffer_size")]
    pub replay_buffer_size: usize,

    /// Seed of the minibatch sampler. The seed of the run is used if not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for ReplayBufferConfig {
    fn default() -> Self {
        Self {
            replay_buffer_size: default_replay_buffer_size(),
            seed: None,
        }
    }
}

impl ReplayBufferConfig {
    /// Sets the capacity of the replay buffer.
    pub fn replay_buffer_size(mut self, replay_buffer_size: usize) -> Self {
        self.replay_buffer_size = replay_buffer_size;
        self
    }

    /// Sets the seed of the sampler.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
