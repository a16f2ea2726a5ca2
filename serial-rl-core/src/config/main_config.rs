//! Hyperparameters of an experiment.
use super::{Extra, PolicySection};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// The `env` section.
///
/// The whole section, including the keys in `extra`, is also deserialized
/// into [`Env::Config`](crate::Env::Config).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EnvSection {
    /// Identifier of the environment, e.g. `BipedalWalker-v3`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_id: Option<String>,

    /// The number of environment instances for collection.
    pub collector_env_num: usize,

    /// The number of environment instances for evaluation.
    pub evaluator_env_num: usize,

    /// The number of episodes per evaluation. Defaults to `evaluator_env_num`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_evaluator_episode: Option<usize>,

    /// Mean evaluation return at which training stops.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_value: Option<f32>,

    /// Environment specific keys.
    #[serde(flatten)]
    pub extra: Extra,
}

impl EnvSection {
    /// The number of episodes per evaluation.
    pub fn n_evaluator_episode(&self) -> usize {
        self.n_evaluator_episode.unwrap_or(self.evaluator_env_num)
    }
}

/// Hyperparameters of an experiment.
///
/// Construct it with [`MainConfig::load`] or [`MainConfig::from_yaml_str`];
/// both validate the configuration before returning it, so every required
/// key is present and in range before any component is built.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct MainConfig {
    /// Name of the experiment, the directory of logs and checkpoints.
    pub exp_name: String,

    /// Environment settings.
    pub env: EnvSection,

    /// Policy settings.
    pub policy: PolicySection,
}

impl MainConfig {
    /// Parses and validates [`MainConfig`] from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Constructs [`MainConfig`] from YAML file and validates it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let config: Self = serde_yaml::from_reader(rdr)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves [`MainConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }

    /// Checks required values and their ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.exp_name.trim().is_empty() {
            return Err(ConfigError::invalid("exp_name", "must not be empty"));
        }
        if self.env.collector_env_num == 0 {
            return Err(ConfigError::invalid(
                "env.collector_env_num",
                "must be at least 1",
            ));
        }
        if self.env.evaluator_env_num == 0 {
            return Err(ConfigError::invalid(
                "env.evaluator_env_num",
                "must be at least 1",
            ));
        }
        if self.env.n_evaluator_episode() == 0 {
            return Err(ConfigError::invalid(
                "env.n_evaluator_episode",
                "must be at least 1",
            ));
        }
        self.policy.validate()
    }

    /// Returns the value at a dotted path such as `policy.learn.batch_size`.
    ///
    /// Segments of sequences are indices, e.g. `policy.model.obs_shape.0`.
    pub fn get(&self, path: &str) -> Option<Value> {
        let mut value = serde_yaml::to_value(self).ok()?;
        for key in path.split('.') {
            value = match value {
                Value::Mapping(mut map) => map.remove(&Value::String(key.to_string()))?,
                Value::Sequence(mut seq) => {
                    let ix: usize = key.parse().ok()?;
                    if ix < seq.len() {
                        seq.swap_remove(ix)
                    } else {
                        return None;
                    }
                }
                _ => return None,
            };
        }
        Some(value)
    }

    /// Same as [`MainConfig::get`], but a missing key is an error.
    pub fn require(&self, path: &str) -> Result<Value, ConfigError> {
        self.get(path)
            .ok_or_else(|| ConfigError::MissingKey(path.to_string()))
    }

    /// Sets the name of the experiment.
    pub fn exp_name(mut self, exp_name: impl Into<String>) -> Self {
        self.exp_name = exp_name.into();
        self
    }
}
