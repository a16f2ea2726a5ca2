//! Agent.
use super::{Env, Policy, PolicyKwargs, Transition};
use crate::record::Record;
use anyhow::Result;
use std::path::Path;

/// Represents a trainable policy on an environment.
///
/// The serial loop switches the agent between training mode (collection) and
/// evaluation mode. Parameter updates are done in [`Agent::learn`] with
/// minibatches sampled from the replay buffer.
pub trait Agent<E: Env>: Policy<E> {
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Sample an action for collection, given exploration arguments.
    ///
    /// The default implementation ignores `kwargs`.
    #[allow(unused_variables)]
    fn explore(&mut self, obs: &E::Obs, kwargs: &PolicyKwargs) -> E::Act {
        self.sample(obs)
    }

    /// Seeds the randomness of the agent with the seed of the run.
    ///
    /// The default implementation ignores it.
    #[allow(unused_variables)]
    fn seed(&mut self, seed: i64) {}

    /// The number of samples in a minibatch for [`Agent::learn`].
    fn batch_size(&self) -> usize;

    /// Performs an optimization step with a minibatch and returns some information.
    fn learn(&mut self, batch: Vec<Transition<E>>) -> Result<Record>;

    /// Save the parameters of the agent in the given directory.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Load the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
