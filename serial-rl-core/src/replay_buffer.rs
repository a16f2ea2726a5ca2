//! Replay buffer.
mod config;
use crate::{
    record::{Record, RecordValue::Scalar},
    Env, Transition,
};
pub use config::ReplayBufferConfig;
use log::trace;
use rand::{rngs::StdRng, seq::index, SeedableRng};

/// A bounded buffer of [`Transition`]s serving uniformly sampled minibatches.
///
/// When the buffer is full, pushed samples overwrite the oldest ones.
pub struct ReplayBuffer<E: Env> {
    capacity: usize,
    i: usize,
    data: Vec<Transition<E>>,
    rng: StdRng,
    push_count: usize,
    sample_count: usize,
    last_env_step: usize,
    last_train_iter: usize,
}

impl<E: Env> ReplayBuffer<E> {
    /// Builds a replay buffer. The sampler is seeded with 42 if the
    /// configuration has no seed.
    pub fn build(config: &ReplayBufferConfig) -> Self {
        let capacity = config.replay_buffer_size.max(1);
        Self {
            capacity,
            i: 0,
            data: Vec::with_capacity(capacity.min(1 << 16)),
            rng: StdRng::seed_from_u64(config.seed.unwrap_or(42)),
            push_count: 0,
            sample_count: 0,
            last_env_step: 0,
            last_train_iter: 0,
        }
    }

    /// The number of samples in the buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the buffer has no sample.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The maximum number of samples.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of samples pushed so far, including evicted ones.
    pub fn push_count(&self) -> usize {
        self.push_count
    }

    /// The number of samples drawn so far.
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Adds samples collected up to `env_step`.
    pub fn push(&mut self, samples: Vec<Transition<E>>, env_step: usize) {
        let n = samples.len();
        for tr in samples.into_iter() {
            if self.data.len() < self.capacity {
                self.data.push(tr);
            } else {
                self.data[self.i] = tr;
            }
            self.i = (self.i + 1) % self.capacity;
        }
        self.push_count += n;
        self.last_env_step = env_step;
        trace!("Pushed {} samples at env_step {}", n, env_step);
    }

    /// Draws `batch_size` distinct samples uniformly at random.
    ///
    /// Returns `None` if the buffer holds fewer than `batch_size` samples.
    pub fn sample(&mut self, batch_size: usize, train_iter: usize) -> Option<Vec<Transition<E>>> {
        if batch_size == 0 || self.data.len() < batch_size {
            return None;
        }
        let batch = index::sample(&mut self.rng, self.data.len(), batch_size)
            .into_iter()
            .map(|ix| self.data[ix].clone())
            .collect::<Vec<_>>();
        self.sample_count += batch_size;
        self.last_train_iter = train_iter;
        Some(batch)
    }

    /// Removes all samples. Counters are kept.
    pub fn clear(&mut self) {
        self.data.clear();
        self.i = 0;
    }

    /// Metrics of the buffer.
    pub fn record(&self) -> Record {
        Record::from_slice(&[
            ("buffer/len", Scalar(self.data.len() as f32)),
            ("buffer/push_count", Scalar(self.push_count as f32)),
            ("buffer/sample_count", Scalar(self.sample_count as f32)),
            ("buffer/last_env_step", Scalar(self.last_env_step as f32)),
            ("buffer/last_train_iter", Scalar(self.last_train_iter as f32)),
        ])
    }

    /// Samples in the buffer, from the oldest to the newest.
    pub fn iter(&self) -> impl Iterator<Item = &Transition<E>> {
        let (newer, older) = if self.data.len() < self.capacity {
            self.data.split_at(self.data.len())
        } else {
            self.data.split_at(self.i)
        };
        older.iter().chain(newer.iter())
    }
}
