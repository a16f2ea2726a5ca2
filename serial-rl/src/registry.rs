use anyhow::Result;
use log::info;
use serial_rl_core::{
    config::{compile_config, CreateConfig, EnvManagerKind, MainConfig},
    error::SerialRlError,
    record::AggregateRecorder,
    serial_pipeline,
    toy::{CorridorEnv, RandomAgent},
    Agent, Configurable, Env, PipelineOptions, PipelineReport,
};
use std::collections::HashMap;

/// Runs the serial loop for a pair of environment and agent types.
pub type Launcher = fn(
    MainConfig,
    CreateConfig,
    PipelineOptions,
    &mut Box<dyn AggregateRecorder>,
) -> Result<PipelineReport>;

/// Compiles the configuration for `E` and `A`, then runs the serial loop.
pub fn launch<E, A>(
    main: MainConfig,
    create: CreateConfig,
    options: PipelineOptions,
    recorder: &mut Box<dyn AggregateRecorder>,
) -> Result<PipelineReport>
where
    E: Env,
    A: Agent<E> + Configurable,
{
    if create.env_manager.kind == EnvManagerKind::Subprocess {
        info!("Environment instances run in the calling thread");
    }
    let config = compile_config::<E, A>(main, Some(create))?;
    serial_pipeline(config, options, recorder)
}

/// Launchers keyed by the environment and policy type names of [`CreateConfig`].
#[derive(Default)]
pub struct Registry {
    launchers: HashMap<(String, String), Launcher>,
}

impl Registry {
    /// Constructs an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs a registry with the launchers shipped in this crate.
    ///
    /// * `corridor` / `random`: [`CorridorEnv`] with [`RandomAgent`].
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register::<CorridorEnv, RandomAgent>("corridor", "random");
        registry
    }

    /// Registers the launcher of `E` and `A` under the type names.
    ///
    /// A launcher registered under the same names is replaced.
    pub fn register<E, A>(
        &mut self,
        env_type: impl Into<String>,
        policy_type: impl Into<String>,
    ) -> &mut Self
    where
        E: Env,
        A: Agent<E> + Configurable,
    {
        self.launchers
            .insert((env_type.into(), policy_type.into()), launch::<E, A>);
        self
    }

    /// Returns the launcher registered under the type names.
    pub fn get(&self, env_type: &str, policy_type: &str) -> Option<Launcher> {
        self.launchers
            .get(&(env_type.to_string(), policy_type.to_string()))
            .copied()
    }

    /// Registered pairs of type names, sorted.
    pub fn registered(&self) -> Vec<(&str, &str)> {
        let mut pairs = self
            .launchers
            .keys()
            .map(|(e, p)| (e.as_str(), p.as_str()))
            .collect::<Vec<_>>();
        pairs.sort();
        pairs
    }

    /// Runs the experiment with the launcher named in `create`.
    pub fn launch(
        &self,
        main: MainConfig,
        create: CreateConfig,
        options: PipelineOptions,
        recorder: &mut Box<dyn AggregateRecorder>,
    ) -> Result<PipelineReport> {
        let env_type = create.env.type_name.clone();
        let policy_type = create.policy.type_name.clone();
        match self.get(&env_type, &policy_type) {
            Some(launcher) => launcher(main, create, options, recorder),
            None => Err(SerialRlError::UnregisteredLauncher(env_type, policy_type).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin() {
        let registry = Registry::with_builtin();
        assert!(registry.get("corridor", "random").is_some());
        assert!(registry.get("corridor", "dqn").is_none());
        assert_eq!(registry.registered(), vec![("corridor", "random")]);
    }
}
