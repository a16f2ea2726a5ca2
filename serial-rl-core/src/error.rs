//! Errors in the library.
use thiserror::Error;

/// Errors raised by records, environment managers and launchers.
#[derive(Debug, Error)]
pub enum SerialRlError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// An environment manager was requested with no environments.
    #[error("Environment manager needs at least one environment")]
    EmptyEnvManager,

    /// An environment index out of range of the manager.
    #[error("Environment id {0} is out of range (env_num = {1})")]
    UnknownEnvId(usize, usize),

    /// No launcher is registered for the pair of environment and policy types.
    #[error("No launcher is registered for env type `{0}` and policy type `{1}`")]
    UnregisteredLauncher(String, String),
}

/// Errors in loading and validating experiment configurations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid YAML or a required field is missing.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A key requested by dotted path does not exist.
    #[error("Missing configuration key: {0}")]
    MissingKey(String),

    /// A value is present but not acceptable.
    #[error("Invalid value for `{path}`: {reason}")]
    Invalid {
        /// Dotted path of the value.
        path: String,

        /// Why the value was rejected.
        reason: String,
    },

    /// Reading or writing a configuration file failed.
    #[error("I/O error on configuration file: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub(crate) fn invalid(path: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
