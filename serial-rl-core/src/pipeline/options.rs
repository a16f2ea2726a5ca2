use std::path::{Path, PathBuf};

/// Options of a run of [`serial_pipeline`](super::serial_pipeline) given
/// outside of the experiment configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Base seed of the environment instances.
    pub seed: i64,

    /// Training stops at the first evaluation after this number of environment steps.
    pub max_env_step: Option<usize>,

    /// Training stops at the first evaluation after this number of training iterations.
    pub max_train_iter: Option<usize>,

    /// Outputs go to `<root_dir>/<exp_name>`.
    pub root_dir: PathBuf,

    /// Whether the compiled configuration is written to the experiment directory.
    pub save_cfg: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            seed: 0,
            max_env_step: None,
            max_train_iter: None,
            root_dir: PathBuf::from("."),
            save_cfg: true,
        }
    }
}

impl PipelineOptions {
    /// Sets the seed.
    pub fn seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the maximum number of environment steps.
    pub fn max_env_step(mut self, v: usize) -> Self {
        self.max_env_step = Some(v);
        self
    }

    /// Sets the maximum number of training iterations.
    pub fn max_train_iter(mut self, v: usize) -> Self {
        self.max_train_iter = Some(v);
        self
    }

    /// Sets the root directory of outputs.
    pub fn root_dir(mut self, root_dir: impl AsRef<Path>) -> Self {
        self.root_dir = root_dir.as_ref().to_path_buf();
        self
    }

    /// Sets if the compiled configuration is saved.
    pub fn save_cfg(mut self, save_cfg: bool) -> Self {
        self.save_cfg = save_cfg;
        self
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    /// Training iterations done.
    pub train_iter: usize,

    /// Environment steps taken by the collector.
    pub env_step: usize,

    /// The best mean return over the evaluations during training.
    pub best_reward: Option<f32>,

    /// Mean return of the final evaluation.
    pub final_reward: f32,

    /// Directory of the outputs of the run.
    pub exp_dir: PathBuf,
}
