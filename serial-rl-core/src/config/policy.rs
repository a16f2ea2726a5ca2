//! The `policy` section of [`MainConfig`](super::MainConfig).
use super::Extra;
use crate::{
    error::ConfigError, evaluator::EvaluatorConfig, exploration::EpsilonGreedy,
    learner::LearnerConfig, replay_buffer::ReplayBufferConfig,
};
use serde::{Deserialize, Serialize};

/// Shape of observations or actions, either a single dimension or a list.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(untagged)]
pub enum ShapeSpec {
    /// A vector of the given length.
    Dim(usize),

    /// A tensor of the given dimensions.
    Dims(Vec<usize>),
}

impl ShapeSpec {
    /// Returns the dimensions.
    pub fn dims(&self) -> Vec<usize> {
        match self {
            Self::Dim(d) => vec![*d],
            Self::Dims(ds) => ds.clone(),
        }
    }

    /// The number of elements.
    pub fn numel(&self) -> usize {
        self.dims().iter().product()
    }

    fn validate(&self, path: &str) -> Result<(), ConfigError> {
        let dims = self.dims();
        if dims.is_empty() {
            return Err(ConfigError::invalid(path, "shape has no dimension"));
        }
        if dims.iter().any(|&d| d == 0) {
            return Err(ConfigError::invalid(path, "dimensions must be positive"));
        }
        Ok(())
    }
}

/// Kind of the action space the model acts on.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ActionSpace {
    /// Finite set of actions.
    Discrete,

    /// Deterministic continuous actions.
    Regression,

    /// Stochastic continuous actions with reparameterization.
    Reparameterization,

    /// Mixture of discrete and continuous actions.
    Hybrid,

    /// Anything else the model understands.
    General,
}

/// Model specification.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ModelSection {
    /// Shape of observations.
    pub obs_shape: ShapeSpec,

    /// Shape of actions, the number of actions for discrete action spaces.
    pub action_shape: ShapeSpec,

    /// Kind of the action space.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_space: Option<ActionSpace>,

    /// Model specific keys, e.g. hidden sizes.
    #[serde(flatten)]
    pub extra: Extra,
}

/// Hyperparameters of learning.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct LearnSection {
    /// The number of optimization steps after each collection.
    pub update_per_collect: usize,

    /// The number of samples in a minibatch.
    pub batch_size: usize,

    /// Configuration of the learner.
    #[serde(default)]
    pub learner: LearnerConfig,

    /// Algorithm specific keys, e.g. learning rates.
    #[serde(flatten)]
    pub extra: Extra,
}

/// Target of a collection round.
///
/// Exactly one of `n_sample` and `n_episode` must be given.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Default)]
pub struct CollectSection {
    /// The number of samples per collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_sample: Option<usize>,

    /// The number of episodes per collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_episode: Option<usize>,

    /// Collector specific keys.
    #[serde(flatten)]
    pub extra: Extra,
}

/// Evaluation settings.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Default)]
pub struct EvalSection {
    /// Configuration of the evaluator.
    #[serde(default)]
    pub evaluator: EvaluatorConfig,
}

/// Other components.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Default)]
pub struct OtherSection {
    /// Configuration of the replay buffer.
    #[serde(default)]
    pub replay_buffer: ReplayBufferConfig,

    /// Epsilon-greedy schedule, for policies exploring with epsilon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eps: Option<EpsilonGreedy>,
}

/// The `policy` section.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PolicySection {
    /// Whether the agent should use a GPU.
    #[serde(default)]
    pub cuda: bool,

    /// The number of random samples pushed to the replay buffer before training.
    #[serde(default)]
    pub random_collect_size: usize,

    /// Model specification.
    pub model: ModelSection,

    /// Learning hyperparameters.
    pub learn: LearnSection,

    /// Collection target.
    pub collect: CollectSection,

    /// Evaluation settings.
    #[serde(default)]
    pub eval: EvalSection,

    /// Replay buffer and exploration.
    #[serde(default)]
    pub other: OtherSection,

    /// Policy specific keys.
    #[serde(flatten)]
    pub extra: Extra,
}

impl PolicySection {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        self.model.obs_shape.validate("policy.model.obs_shape")?;
        self.model.action_shape.validate("policy.model.action_shape")?;

        if self.learn.update_per_collect == 0 {
            return Err(ConfigError::invalid(
                "policy.learn.update_per_collect",
                "must be at least 1",
            ));
        }
        if self.learn.batch_size == 0 {
            return Err(ConfigError::invalid(
                "policy.learn.batch_size",
                "must be at least 1",
            ));
        }

        match (self.collect.n_sample, self.collect.n_episode) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::invalid(
                    "policy.collect",
                    "give either n_sample or n_episode, not both",
                ))
            }
            (None, None) => return Err(ConfigError::MissingKey("policy.collect.n_sample".into())),
            (Some(0), None) => {
                return Err(ConfigError::invalid(
                    "policy.collect.n_sample",
                    "must be at least 1",
                ))
            }
            (None, Some(0)) => {
                return Err(ConfigError::invalid(
                    "policy.collect.n_episode",
                    "must be at least 1",
                ))
            }
            _ => {}
        }

        if self.other.replay_buffer.replay_buffer_size == 0 {
            return Err(ConfigError::invalid(
                "policy.other.replay_buffer.replay_buffer_size",
                "must be at least 1",
            ));
        }
        if self.eval.evaluator.eval_freq == 0 {
            return Err(ConfigError::invalid(
                "policy.eval.evaluator.eval_freq",
                "must be at least 1",
            ));
        }
        if let Some(eps) = &self.other.eps {
            eps.validate("policy.other.eps")?;
        }

        Ok(())
    }
}
