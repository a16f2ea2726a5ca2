//! Configuration of [`Learner`](super::Learner).
use serde::{Deserialize, Serialize};

fn default_log_show_after_iter() -> usize {
    100
}

fn default_save_ckpt_after_iter() -> usize {
    10000
}

/// Hooks run by [`Learner`](super::Learner), `policy.learn.learner.hook`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct HookConfig {
    /// Interval of logging learn records, in training iterations.
    #[serde(default = "default_log_show_after_iter")]
    pub log_show_after_iter: usize,

    /// Interval of saving checkpoints, in training iterations. `0` disables it.
    #[serde(default = "default_save_ckpt_after_iter")]
    pub save_ckpt_after_iter: usize,

    /// Directory of a checkpoint loaded before training. Empty for none.
    #[serde(default)]
    pub load_ckpt_before_run: String,

    /// Whether a checkpoint `final` is saved when training ends.
    #[serde(default)]
    pub save_ckpt_after_run: bool,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            log_show_after_iter: default_log_show_after_iter(),
            save_ckpt_after_iter: default_save_ckpt_after_iter(),
            load_ckpt_before_run: String::new(),
            save_ckpt_after_run: false,
        }
    }
}

impl HookConfig {
    /// Sets the interval of logging.
    pub fn log_show_after_iter(mut self, v: usize) -> Self {
        self.log_show_after_iter = v;
        self
    }

    /// Sets the interval of saving checkpoints.
    pub fn save_ckpt_after_iter(mut self, v: usize) -> Self {
        self.save_ckpt_after_iter = v;
        self
    }

    /// Sets the checkpoint loaded before training.
    pub fn load_ckpt_before_run(mut self, v: impl Into<String>) -> Self {
        self.load_ckpt_before_run = v.into();
        self
    }

    /// Sets if a checkpoint is saved when training ends.
    pub fn save_ckpt_after_run(mut self, v: bool) -> Self {
        self.save_ckpt_after_run = v;
        self
    }
}

/// Configuration of [`Learner`](super::Learner), `policy.learn.learner`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Default)]
pub struct LearnerConfig {
    /// Hooks.
    #[serde(default)]
    pub hook: HookConfig,
}

impl LearnerConfig {
    /// Sets the hooks.
    pub fn hook(mut self, hook: HookConfig) -> Self {
        self.hook = hook;
        self
    }
}
