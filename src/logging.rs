// src/logging.rs
//
// Telemetry sinks for learning runs.
// - EventSink: trait consumed by the training loop
// - NoopSink:  discards all events
// - FileSink:  one JSON object per epoch, line-oriented, for offline
//   inspection of learning progress

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::policy::EpochStats;

/// One epoch record as written by FileSink.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EpochRecord {
    pub epoch: usize,
    pub seed: u64,
    #[serde(flatten)]
    pub stats: EpochStats,
}

/// Abstract sink for per-epoch telemetry.
pub trait EventSink {
    fn log_epoch(&mut self, record: &EpochRecord);
}

/// Sink that discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn log_epoch(&mut self, _record: &EpochRecord) {
        // intentionally no-op
    }
}

/// JSONL file sink: each epoch is a single JSON object on its own line.
pub struct FileSink {
    writer: BufWriter<File>,
}

impl FileSink {
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl EventSink for FileSink {
    fn log_epoch(&mut self, record: &EpochRecord) {
        let Ok(line) = serde_json::to_string(record) else {
            return;
        };
        // A failed write is not worth aborting a learning run over.
        let _ = writeln!(self.writer, "{line}");
    }
}
