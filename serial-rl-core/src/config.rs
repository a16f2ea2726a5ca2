//! Experiment configuration.
//!
//! An experiment is described by two documents:
//!
//! * [`MainConfig`] holds the hyperparameters: environment settings and the
//!   `policy` section with `model`, `learn`, `collect`, `eval` and `other`.
//! * [`CreateConfig`] names the types of environment, environment manager and
//!   policy, used to pick concrete Rust types for a run.
//!
//! Both are plain YAML. Keys specific to an environment or an algorithm are
//! kept in the `extra` map of the section they appear in and are handed over
//! to [`Env::Config`](crate::Env::Config) and the agent configuration by
//! [`compile_config`].
mod compile;
mod create;
mod main_config;
mod policy;
pub use compile::{compile_config, CompiledConfig, TOTAL_CONFIG_FILE};
pub use create::{CreateConfig, EnvManagerKind, EnvManagerType, TypeRef};
pub use main_config::{EnvSection, MainConfig};
pub use policy::{
    ActionSpace, CollectSection, EvalSection, LearnSection, ModelSection, OtherSection,
    PolicySection, ShapeSpec,
};

/// Extra keys of a configuration section.
pub type Extra = std::collections::BTreeMap<String, serde_yaml::Value>;
