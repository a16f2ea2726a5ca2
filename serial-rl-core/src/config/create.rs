//! Types of the components of an experiment.
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// A reference to a registered type.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TypeRef {
    /// Registered name of the type.
    #[serde(rename = "type")]
    pub type_name: String,

    /// Modules providing the type. Kept for reference only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub import_names: Vec<String>,
}

impl TypeRef {
    /// Constructs a reference to the type of the given name.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            import_names: vec![],
        }
    }
}

/// How environment instances are managed.
///
/// Both kinds step the instances sequentially in the calling thread.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum EnvManagerKind {
    /// Instances owned by the manager.
    Base,

    /// Instances requested to run in worker processes.
    Subprocess,
}

impl Default for EnvManagerKind {
    fn default() -> Self {
        Self::Base
    }
}

/// The `env_manager` section of [`CreateConfig`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Default)]
pub struct EnvManagerType {
    /// Kind of the manager.
    #[serde(rename = "type", default)]
    pub kind: EnvManagerKind,
}

/// Names the types of environment, environment manager and policy.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct CreateConfig {
    /// Environment type.
    pub env: TypeRef,

    /// Environment manager type.
    #[serde(default)]
    pub env_manager: EnvManagerType,

    /// Policy type.
    pub policy: TypeRef,
}

impl CreateConfig {
    /// Constructs a configuration with the given environment and policy types.
    pub fn new(env: impl Into<String>, policy: impl Into<String>) -> Self {
        Self {
            env: TypeRef::new(env),
            env_manager: EnvManagerType::default(),
            policy: TypeRef::new(policy),
        }
    }

    /// Sets the kind of the environment manager.
    pub fn env_manager(mut self, kind: EnvManagerKind) -> Self {
        self.env_manager.kind = kind;
        self
    }

    /// Parses [`CreateConfig`] from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Constructs [`CreateConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        Ok(serde_yaml::from_reader(rdr)?)
    }

    /// Saves [`CreateConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create_config() -> anyhow::Result<()> {
        let config = CreateConfig::from_yaml_str(
            r#"
env:
  type: bipedalwalker
  import_names: [dizoo.box2d.bipedalwalker.envs.bipedalwalker_env]
env_manager:
  type: subprocess
policy:
  type: td3
"#,
        )?;
        assert_eq!(config.env.type_name, "bipedalwalker");
        assert_eq!(config.env.import_names.len(), 1);
        assert_eq!(config.env_manager.kind, EnvManagerKind::Subprocess);
        assert_eq!(config.policy.type_name, "td3");
        Ok(())
    }

    #[test]
    fn test_env_manager_defaults_to_base() -> anyhow::Result<()> {
        let config = CreateConfig::from_yaml_str("env: {type: corridor}\npolicy: {type: random}\n")?;
        assert_eq!(config, CreateConfig::new("corridor", "random"));
        Ok(())
    }
}
