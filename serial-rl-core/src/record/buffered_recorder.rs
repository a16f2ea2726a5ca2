use super::{AggregateRecorder, Record, RecordStorage, Recorder};

/// Buffered recorder.
///
/// Keeps written records and the aggregated records of every flush in
/// memory. This is used for inspecting a run, mostly in tests.
#[derive(Default)]
pub struct BufferedRecorder {
    buf: Vec<Record>,
    storage: RecordStorage,
    flushed: Vec<(i64, Record)>,
}

impl BufferedRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an iterator over the written records.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.buf.iter()
    }

    /// Returns the aggregated records with the step given at each flush.
    pub fn flushed(&self) -> &[(i64, Record)] {
        &self.flushed
    }

    /// Returns the values of a scalar in the aggregated records, in order of flushes.
    pub fn scalars(&self, key: &str) -> Vec<(i64, f32)> {
        self.flushed
            .iter()
            .filter_map(|(step, record)| record.get_scalar(key).ok().map(|v| (*step, v)))
            .collect()
    }
}

impl Recorder for BufferedRecorder {
    /// Write a [`Record`] to the buffer.
    fn write(&mut self, record: Record) {
        self.buf.push(record);
    }
}

impl AggregateRecorder for BufferedRecorder {
    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        let record = self.storage.aggregate();
        if !record.is_empty() {
            self.flushed.push((step, record));
        }
    }
}
