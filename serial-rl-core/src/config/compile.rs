//! Resolution of a configuration into the configurations of concrete types.
use super::{CreateConfig, MainConfig};
use crate::{error::ConfigError, Configurable, Env};
use log::info;
use serde::Serialize;
use std::{fs, io::Write, path::Path};

/// File name of the configuration written by [`CompiledConfig::save`].
pub const TOTAL_CONFIG_FILE: &str = "total_config.yaml";

/// A validated [`MainConfig`] together with the configurations of the
/// environment and the agent parsed from it.
pub struct CompiledConfig<E: Env, A: Configurable> {
    /// Hyperparameters.
    pub main: MainConfig,

    /// Component types, if the experiment was launched from them.
    pub create: Option<CreateConfig>,

    /// Configuration of the environment, parsed from the `env` section.
    pub env_config: E::Config,

    /// Configuration of the agent, parsed from the `policy` section.
    pub agent_config: A::Config,
}

#[derive(Serialize)]
struct TotalConfig<'a> {
    main_config: &'a MainConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    create_config: Option<&'a CreateConfig>,
}

/// Validates `main` and parses the configurations of environment and agent.
///
/// Every configuration error surfaces here, before anything is built.
pub fn compile_config<E, A>(
    main: MainConfig,
    create: Option<CreateConfig>,
) -> Result<CompiledConfig<E, A>, ConfigError>
where
    E: Env,
    A: Configurable,
{
    main.validate()?;
    let env_config = serde_yaml::from_value(serde_yaml::to_value(&main.env)?)?;
    let agent_config = serde_yaml::from_value(serde_yaml::to_value(&main.policy)?)?;

    Ok(CompiledConfig {
        main,
        create,
        env_config,
        agent_config,
    })
}

impl<E: Env, A: Configurable> CompiledConfig<E, A> {
    /// Writes the configuration into `dir/total_config.yaml`.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::create_dir_all(&dir)?;
        let path = dir.as_ref().join(TOTAL_CONFIG_FILE);
        let total = TotalConfig {
            main_config: &self.main,
            create_config: self.create.as_ref(),
        };
        let mut file = fs::File::create(&path)?;
        file.write_all(serde_yaml::to_string(&total)?.as_bytes())?;
        info!("Saved the configuration in {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toy::{CorridorEnv, RandomAgent};
    use tempdir::TempDir;

    fn main_config() -> MainConfig {
        MainConfig::from_yaml_str(
            r#"
exp_name: corridor_random
env:
  collector_env_num: 2
  evaluator_env_num: 2
  length: 7
policy:
  model: {obs_shape: 1, action_shape: 2}
  learn: {update_per_collect: 2, batch_size: 4}
  collect: {n_sample: 8}
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_compile_parses_sections() -> anyhow::Result<()> {
        let compiled = compile_config::<CorridorEnv, RandomAgent>(main_config(), None)?;
        assert_eq!(compiled.env_config.length, 7);
        assert_eq!(compiled.agent_config.batch_size, 4);
        assert_eq!(compiled.agent_config.n_actions, 2);
        Ok(())
    }

    #[test]
    fn test_compile_rejects_bad_env_section() {
        let mut main = main_config();
        main.env
            .extra
            .insert("length".to_string(), serde_yaml::Value::String("long".into()));
        assert!(matches!(
            compile_config::<CorridorEnv, RandomAgent>(main, None),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_save_total_config() -> anyhow::Result<()> {
        let dir = TempDir::new("compile_config")?;
        let create = CreateConfig::new("corridor", "random");
        let compiled = compile_config::<CorridorEnv, RandomAgent>(main_config(), Some(create))?;
        compiled.save(dir.path())?;
        let s = fs::read_to_string(dir.path().join(TOTAL_CONFIG_FILE))?;
        assert!(s.contains("main_config"));
        assert!(s.contains("corridor"));
        Ok(())
    }
}
