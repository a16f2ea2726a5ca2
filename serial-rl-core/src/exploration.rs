//! Exploration schedules.
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// How epsilon decays with environment steps.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum DecayKind {
    /// `max(start - (start - end) * step / decay, end)`.
    Linear,

    /// `end + (start - end) * exp(-step / decay)`.
    Exp,
}

/// Epsilon-greedy schedule, a function from environment steps to the
/// probability of taking a random action.
///
/// The orchestrator evaluates it with the collector's environment step
/// counter before every collection and hands the value to the agent through
/// [`PolicyKwargs`](crate::PolicyKwargs).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    /// Decay type.
    #[serde(rename = "type")]
    pub kind: DecayKind,

    /// Epsilon at step 0.
    pub start: f64,

    /// Epsilon approached as the number of steps grows.
    pub end: f64,

    /// Steps of decay.
    pub decay: usize,
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self {
            kind: DecayKind::Exp,
            start: 0.95,
            end: 0.1,
            decay: 10000,
        }
    }
}

impl EpsilonGreedy {
    /// Constructs a schedule.
    pub fn new(start: f64, end: f64, decay: usize, kind: DecayKind) -> Self {
        Self {
            kind,
            start,
            end,
            decay,
        }
    }

    /// Returns epsilon at the given environment step.
    pub fn epsilon(&self, step: usize) -> f64 {
        let step = step as f64;
        let decay = self.decay as f64;
        match self.kind {
            DecayKind::Linear => (self.start - (self.start - self.end) * step / decay).max(self.end),
            DecayKind::Exp => self.end + (self.start - self.end) * (-step / decay).exp(),
        }
    }

    pub(crate) fn validate(&self, path: &str) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.start) || !(0.0..=1.0).contains(&self.end) {
            return Err(ConfigError::invalid(path, "start and end must be in [0, 1]"));
        }
        if self.end > self.start {
            return Err(ConfigError::invalid(path, "end must not exceed start"));
        }
        if self.decay == 0 {
            return Err(ConfigError::invalid(path, "decay must be positive"));
        }
        Ok(())
    }
}
