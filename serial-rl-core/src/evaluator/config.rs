//! Configuration of [`Evaluator`](super::Evaluator).
use serde::{Deserialize, Serialize};

fn default_eval_freq() -> usize {
    1000
}

/// Configuration of [`Evaluator`](super::Evaluator), `policy.eval.evaluator`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EvaluatorConfig {
    /// Interval of evaluation in training iterations.
    #[serde(default = "default_eval_freq")]
    pub eval_freq: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            eval_freq: default_eval_freq(),
        }
    }
}

impl EvaluatorConfig {
    /// Sets the interval of evaluation.
    pub fn eval_freq(mut self, eval_freq: usize) -> Self {
        self.eval_freq = eval_freq;
        self
    }
}

/// Limits on the length of a training run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepBudget {
    /// The maximum number of environment steps.
    pub max_env_step: Option<usize>,

    /// The maximum number of training iterations.
    pub max_train_iter: Option<usize>,
}

impl StepBudget {
    /// No limit.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Returns `true` if any limit has been reached.
    pub fn is_exhausted(&self, train_iter: usize, env_step: usize) -> bool {
        self.max_env_step.map_or(false, |n| env_step >= n)
            || self.max_train_iter.map_or(false, |n| train_iter >= n)
    }
}
