//! Serial training of reinforcement learning agents from configuration files.
//!
//! This crate consists of the following:
//!
//! * [serial-rl-core](serial_rl_core) provides the traits implemented by
//!   environments and agents, the configuration types and the serial loop.
//! * [serial-rl-tensorboard](serial_rl_tensorboard) has `TensorboardRecorder`
//!   to write records which can be shown in Tensorboard.
//! * [`Registry`] maps the type names of a create configuration to a
//!   monomorphized launcher of the serial loop. The `serial-rl` binary runs
//!   an experiment with the launchers registered in [`Registry::with_builtin`].
//!
//! Presets are in the `config` directory of this crate.
mod registry;
pub use registry::{launch, Launcher, Registry};
pub use serial_rl_core::*;
pub use serial_rl_tensorboard::TensorboardRecorder;

use serial_rl_core::record::{AggregateRecorder, NullRecorder};
use std::path::{Path, PathBuf};

/// Directory of the scalar summaries of an experiment, `<root>/<exp_name>/log/serial`.
pub fn log_dir(root_dir: impl AsRef<Path>, exp_name: &str) -> PathBuf {
    root_dir.as_ref().join(exp_name).join("log").join("serial")
}

/// Creates the recorder of an experiment.
///
/// Records are written with [`TensorboardRecorder`] if `tensorboard` is `true`,
/// otherwise discarded.
pub fn create_recorder(
    root_dir: impl AsRef<Path>,
    exp_name: &str,
    tensorboard: bool,
) -> Box<dyn AggregateRecorder> {
    match tensorboard {
        true => Box::new(TensorboardRecorder::new(log_dir(root_dir, exp_name))),
        false => Box::new(NullRecorder::new()),
    }
}
