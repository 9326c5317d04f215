//! Downstream channel contract and an in-memory implementation.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::record::Record;
use crate::shape::RecordShape;

/// The two outputs of the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumOutputAnchor {
    /// Records whose operation succeeded.
    Output,
    /// Records whose operation failed.
    ErrorOutput,
}

impl EnumOutputAnchor {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Output => "Output",
            Self::ErrorOutput => "ErrorOutput",
        }
    }
}

impl fmt::Display for EnumOutputAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A schema-bound downstream consumer.
///
/// `init` is called once before any record; `close` exactly once at shutdown.
pub trait OutputChannel: Send {
    fn init(&mut self, shape: Arc<RecordShape>);
    fn push_record(&mut self, record: Record);
    fn update_progress(&mut self, percent: f64);
    fn close(&mut self);
}

#[derive(Debug, Default)]
struct SpecChannelLog {
    shape: Option<Arc<RecordShape>>,
    l_records: Vec<Record>,
    l_progress: Vec<f64>,
    cnt_init: u64,
    cnt_close: u64,
}

/// Keeps everything it receives; clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct CollectingChannel {
    log: Arc<Mutex<SpecChannelLog>>,
}

impl CollectingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shape(&self) -> Option<Arc<RecordShape>> {
        self.log.lock().shape.clone()
    }

    pub fn records(&self) -> Vec<Record> {
        self.log.lock().l_records.clone()
    }

    /// Drain received records.
    pub fn take_records(&self) -> Vec<Record> {
        std::mem::take(&mut self.log.lock().l_records)
    }

    pub fn record_count(&self) -> usize {
        self.log.lock().l_records.len()
    }

    pub fn progress_values(&self) -> Vec<f64> {
        self.log.lock().l_progress.clone()
    }

    pub fn init_count(&self) -> u64 {
        self.log.lock().cnt_init
    }

    pub fn close_count(&self) -> u64 {
        self.log.lock().cnt_close
    }

    pub fn is_closed(&self) -> bool {
        self.close_count() > 0
    }
}

impl OutputChannel for CollectingChannel {
    fn init(&mut self, shape: Arc<RecordShape>) {
        let mut log = self.log.lock();
        log.shape = Some(shape);
        log.cnt_init += 1;
    }

    fn push_record(&mut self, record: Record) {
        self.log.lock().l_records.push(record);
    }

    fn update_progress(&mut self, percent: f64) {
        self.log.lock().l_progress.push(percent);
    }

    fn close(&mut self) {
        self.log.lock().cnt_close += 1;
    }
}
