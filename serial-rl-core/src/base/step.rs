//! Environment step and transitions.
use super::Env;

/// Represents an action, observation and reward tuple `(a_t, o_t+1, r_t)`.
///
/// An environment emits [`Step`] object at every interaction steps.
/// The collector pairs it with `o_t` to create a [`Transition`].
pub struct Step<E: Env> {
    /// Action.
    pub act: E::Act,

    /// Observation.
    pub obs: E::Obs,

    /// Reward.
    pub reward: f32,

    /// Flag denoting if episode is terminated.
    pub is_terminated: bool,

    /// Flag denoting if episode is truncated.
    pub is_truncated: bool,
}

impl<E: Env> Step<E> {
    /// Constructs a [`Step`] object.
    pub fn new(
        obs: E::Obs,
        act: E::Act,
        reward: f32,
        is_terminated: bool,
        is_truncated: bool,
    ) -> Self {
        Step {
            act,
            obs,
            reward,
            is_terminated,
            is_truncated,
        }
    }

    #[inline]
    /// Terminated or truncated.
    pub fn is_done(&self) -> bool {
        self.is_terminated || self.is_truncated
    }
}

/// A transition `(o_t, a_t, o_t+1, r_t)`, the sample stored in the replay buffer.
pub struct Transition<E: Env> {
    /// Observation `o_t`.
    pub obs: E::Obs,

    /// Action `a_t`.
    pub act: E::Act,

    /// Observation `o_t+1`.
    pub next_obs: E::Obs,

    /// Reward `r_t`.
    pub reward: f32,

    /// Flag denoting if episode is terminated at `t+1`.
    pub is_terminated: bool,

    /// Flag denoting if episode is truncated at `t+1`.
    pub is_truncated: bool,

    /// Index of the environment in the collector's manager.
    pub env_id: usize,

    /// Training iteration at which the transition was collected.
    pub collect_iter: usize,
}

impl<E: Env> Transition<E> {
    /// Terminated or truncated.
    pub fn is_done(&self) -> bool {
        self.is_terminated || self.is_truncated
    }
}

// Derive would require `E: Clone`.
impl<E: Env> Clone for Transition<E> {
    fn clone(&self) -> Self {
        Self {
            obs: self.obs.clone(),
            act: self.act.clone(),
            next_obs: self.next_obs.clone(),
            reward: self.reward,
            is_terminated: self.is_terminated,
            is_truncated: self.is_truncated,
            env_id: self.env_id,
            collect_iter: self.collect_iter,
        }
    }
}

impl<E: Env> std::fmt::Debug for Transition<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transition")
            .field("obs", &self.obs)
            .field("act", &self.act)
            .field("next_obs", &self.next_obs)
            .field("reward", &self.reward)
            .field("is_terminated", &self.is_terminated)
            .field("is_truncated", &self.is_truncated)
            .field("env_id", &self.env_id)
            .field("collect_iter", &self.collect_iter)
            .finish()
    }
}
