//! Types and traits for recording metrics of the training loop.
//!
//! Every phase of the serial loop returns a [`Record`], a map from metric
//! names to [`RecordValue`]s. The orchestrator stores them into an
//! [`AggregateRecorder`] and flushes it once per round.
//!
//! ```rust
//! use serial_rl_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("collect/envstep", RecordValue::Scalar(64.0));
//! record.insert("eval/reward_mean", RecordValue::Scalar(-1.0));
//! assert_eq!(record.get_scalar("collect/envstep").unwrap(), 64.0);
//! ```
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;
mod storage;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::{AggregateRecorder, Recorder};
pub use storage::RecordStorage;
