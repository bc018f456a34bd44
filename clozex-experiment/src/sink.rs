use std::fs::File;
use std::io::Write;
use std::path::Path;

use clozex_core::LogRecord;

use crate::error::ExperimentError;

/// Destination for per-trial log rows.
pub trait LogSink: Send {
    fn write(&mut self, record: &LogRecord) -> Result<(), ExperimentError>;
    fn flush(&mut self) -> Result<(), ExperimentError>;
}

/// Writes rows as CSV with a header line.
pub struct CsvLogSink<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl<W: Write> CsvLogSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
            rows: 0,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn into_inner(self) -> Result<W, ExperimentError> {
        self.writer
            .into_inner()
            .map_err(|e| ExperimentError::Io(e.into_error()))
    }
}

impl CsvLogSink<File> {
    pub fn create(path: &Path) -> Result<Self, ExperimentError> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write + Send> LogSink for CsvLogSink<W> {
    fn write(&mut self, record: &LogRecord) -> Result<(), ExperimentError> {
        self.writer.serialize(record)?;
        self.rows += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ExperimentError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps rows in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogSink {
    pub records: Vec<LogRecord>,
    pub flushes: usize,
}

impl LogSink for MemoryLogSink {
    fn write(&mut self, record: &LogRecord) -> Result<(), ExperimentError> {
        self.records.push(record.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ExperimentError> {
        self.flushes += 1;
        Ok(())
    }
}
