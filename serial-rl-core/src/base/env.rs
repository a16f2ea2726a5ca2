//! Environment.
use super::{Act, Obs, Step};
use crate::record::Record;
use anyhow::Result;
use serde::de::DeserializeOwned;

/// Represents an environment, typically an MDP.
///
/// Implementations live outside of this crate; the serial loop only builds,
/// seeds, resets and steps them.
pub trait Env {
    /// Configurations.
    ///
    /// It is deserialized from the `env` section of the experiment
    /// configuration, so environment specific keys can be put there.
    type Config: Clone + DeserializeOwned;

    /// Observation of the environment.
    type Obs: Obs;

    /// Action of the environment.
    type Act: Act;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Sets the random seed used by the next [`Env::reset`].
    fn seed(&mut self, seed: i64);

    /// Resets the environment and returns the initial observation.
    fn reset(&mut self) -> Result<Self::Obs>;

    /// Performes an environment step.
    ///
    /// The returned [`Record`] carries environment specific information and
    /// may be empty.
    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)>
    where
        Self: Sized;

    /// Samples an action uniformly from the action space.
    ///
    /// Used for collecting transitions before training starts.
    fn random_action(&mut self) -> Self::Act;
}
