#![warn(missing_docs)]
//! Core of a serial training loop for reinforcement learning experiments.
//!
//! Algorithms and environments are supplied by implementing [`Agent`] and
//! [`Env`]. This crate wires them into the loop run by [`serial_pipeline`]:
//! evaluate, collect, store, train.
pub mod config;
pub mod error;
pub mod exploration;
pub mod record;
pub mod replay_buffer;
pub mod toy;

mod base;
pub use base::{Act, Agent, Configurable, Env, Obs, Policy, PolicyKwargs, Step, Transition};

mod env_manager;
pub use env_manager::EnvManager;

mod collector;
pub use collector::{CollectTarget, SampleCollector};

mod learner;
pub use learner::{HookConfig, Learner, LearnerConfig};

mod evaluator;
pub use evaluator::{EvalOutput, Evaluator, EvaluatorConfig, StepBudget};

mod pipeline;
pub use pipeline::{
    serial_pipeline, serial_pipeline_with_agent, Phase, PipelineOptions, PipelineReport,
    TrainingContext,
};
