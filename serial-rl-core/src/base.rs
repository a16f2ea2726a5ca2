//! Core functionalities.
mod agent;
mod env;
mod policy;
mod step;
pub use agent::Agent;
pub use env::Env;
pub use policy::{Configurable, Policy, PolicyKwargs};
use std::fmt::Debug;
pub use step::{Step, Transition};

/// An observation of an environment.
///
/// Environments in this library are not vectorized; parallel instances are
/// held by [`EnvManager`](crate::EnvManager) instead.
pub trait Obs: Clone + Debug {}

/// An action of an environment.
pub trait Act: Clone + Debug {}
