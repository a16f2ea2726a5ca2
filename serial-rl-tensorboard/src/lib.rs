//! TensorBoard backend of [`AggregateRecorder`].
use log::warn;
use serial_rl_core::record::{AggregateRecorder, Record, RecordStorage, RecordValue, Recorder};
use std::path::Path;
use tensorboard_rs::summary_writer::SummaryWriter;

/// Write records to TFRecord.
///
/// Records stored between two flushes are aggregated with [`RecordStorage`],
/// then their scalars are written with the step given to
/// [`AggregateRecorder::flush`].
pub struct TensorboardRecorder {
    writer: SummaryWriter,
    storage: RecordStorage,
    step_key: String,
    ignore_unsupported_value: bool,
}

impl TensorboardRecorder {
    /// Construct a [`TensorboardRecorder`].
    ///
    /// TFRecord will be stored in `logdir`, typically `<root>/<exp_name>/log/serial`.
    pub fn new<P: AsRef<Path>>(logdir: P) -> Self {
        Self {
            writer: SummaryWriter::new(logdir),
            storage: RecordStorage::new(),
            step_key: "train_iter".to_string(),
            ignore_unsupported_value: true,
        }
    }

    /// Construct a [`TensorboardRecorder`] warning about values it cannot write.
    pub fn new_with_check_unsupported_value<P: AsRef<Path>>(logdir: P) -> Self {
        Self {
            ignore_unsupported_value: false,
            ..Self::new(logdir)
        }
    }

    fn write_with_step(&mut self, record: &Record, step: usize) {
        for (k, v) in record.iter() {
            if *k == self.step_key {
                continue;
            }
            match v {
                RecordValue::Scalar(v) => self.writer.add_scalar(k, *v, step),
                RecordValue::DateTime(_) => {} // discard value
                _ => {
                    if !self.ignore_unsupported_value {
                        warn!("Unsupported value: {:?}", (k, v));
                    }
                }
            }
        }
        self.writer.flush();
    }
}

impl Recorder for TensorboardRecorder {
    /// Write a given [`Record`] into a TFRecord.
    ///
    /// The step is the scalar under `train_iter`. Records without it are
    /// skipped.
    fn write(&mut self, record: Record) {
        match record.get_scalar(&self.step_key) {
            Ok(step) => self.write_with_step(&record, step as usize),
            Err(e) => warn!("Record is not written: {}", e),
        }
    }
}

impl AggregateRecorder for TensorboardRecorder {
    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        if self.storage.is_empty() {
            return;
        }
        let record = self.storage.aggregate();
        self.write_with_step(&record, step.max(0) as usize);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempdir::TempDir;

    #[test]
    fn test_flush_writes_event_file() -> Result<()> {
        let dir = TempDir::new("tensorboard")?;
        let logdir = dir.path().join("log").join("serial");
        let mut recorder = TensorboardRecorder::new(&logdir);

        for i in 0..3 {
            recorder.store(Record::from_scalar("learn/loss", i as f32));
            recorder.store(Record::from_scalar("collect/envstep", 64.0 * i as f32));
            recorder.flush(i);
        }
        recorder.write(Record::from_slice(&[
            ("train_iter", RecordValue::Scalar(3.0)),
            ("eval/reward_mean", RecordValue::Scalar(1.0)),
        ]));
        recorder.write(Record::from_scalar("eval/reward_mean", 1.0));

        assert!(std::fs::read_dir(&logdir)?.next().is_some());
        Ok(())
    }
}
