//! Append-only result rows.
//!
//! Each record kind writes to its own [`OutputSink`]; the CSV sink flushes
//! after every row so an interrupted run still leaves a usable file.
use crate::outcome::InteractionOutcome;
use sitewalk_common::SinkError;
use std::fs::File;
use std::io::Write;
use std::marker::PhantomData;
use std::path::Path;
use tracing::trace;

/// Text fields longer than this many characters are cut.
pub const TRUNCATE_AT: usize = 100;
pub const TRUNCATION_MARKER: &str = "...";

/// Cut `text` to [`TRUNCATE_AT`] characters plus the marker.
pub fn truncate_text(text: &str) -> String {
    match text.char_indices().nth(TRUNCATE_AT) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &text[..cut]),
        None => text.to_string(),
    }
}

/// A field of a result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    /// Free text taken from the page; truncated before persisting.
    Text(String),
    /// Ids, locations, flags and timestamps; persisted as-is.
    Raw(String),
}

impl Cell {
    fn render(self) -> String {
        match self {
            Self::Text(text) => truncate_text(&text),
            Self::Raw(raw) => raw,
        }
    }
}

/// A kind of row with a fixed header.
pub trait Record {
    fn header() -> &'static [&'static str];

    /// Fields in header order; `row` is the recorder's 1-based row number.
    fn cells(&self, row: u64) -> Vec<Cell>;
}

pub trait OutputSink: Send + Sync {
    fn append(&mut self, fields: &[String]) -> Result<(), SinkError>;
}

pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    width: usize,
}

impl<W: Write + Send + Sync> CsvSink<W> {
    /// Wrap `inner` and write `header` immediately.
    pub fn new(inner: W, header: &[&str]) -> Result<Self, SinkError> {
        let mut writer = csv::WriterBuilder::new().flexible(false).from_writer(inner);
        writer.write_record(header).map_err(csv_error)?;
        writer.flush()?;
        Ok(Self {
            writer,
            width: header.len(),
        })
    }
}

impl CsvSink<File> {
    pub fn create(path: &Path, header: &[&str]) -> Result<Self, SinkError> {
        Self::new(File::create(path)?, header)
    }
}

impl<W: Write + Send + Sync> OutputSink for CsvSink<W> {
    fn append(&mut self, fields: &[String]) -> Result<(), SinkError> {
        if fields.len() != self.width {
            return Err(SinkError::Width {
                expected: self.width,
                got: fields.len(),
            });
        }
        self.writer.write_record(fields).map_err(csv_error)?;
        self.writer.flush()?;
        Ok(())
    }
}

fn csv_error(err: csv::Error) -> SinkError {
    match err.into_kind() {
        csv::ErrorKind::Io(io) => SinkError::Io(io),
        other => SinkError::Csv(format!("{other:?}")),
    }
}

/// Renders records of one kind into rows and appends them to a sink.
pub struct ExtractionRecorder<R> {
    sink: Box<dyn OutputSink>,
    rows: u64,
    failures: u64,
    _kind: PhantomData<fn(&R)>,
}

impl<R: Record> ExtractionRecorder<R> {
    pub fn new(sink: Box<dyn OutputSink>) -> Self {
        Self {
            sink,
            rows: 0,
            failures: 0,
            _kind: PhantomData,
        }
    }

    /// Append one row; returns its row number.
    pub fn record(&mut self, record: &R) -> Result<u64, SinkError> {
        let row = self.rows + 1;
        let fields: Vec<String> = record.cells(row).into_iter().map(Cell::render).collect();
        match self.sink.append(&fields) {
            Ok(()) => {
                self.rows = row;
                trace!(target: "sitewalk.record", row, "row written");
                Ok(row)
            }
            Err(err) => {
                self.failures += 1;
                Err(err)
            }
        }
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }
}

impl Record for InteractionOutcome {
    fn header() -> &'static [&'static str] {
        &[
            "test_id",
            "category",
            "action",
            "element_text",
            "result",
            "mechanism",
            "success",
            "error_message",
            "current_url",
            "timestamp",
        ]
    }

    fn cells(&self, _row: u64) -> Vec<Cell> {
        vec![
            Cell::Raw(self.attempt_id.to_string()),
            Cell::Raw(self.category.as_str().to_string()),
            Cell::Text(self.label.clone()),
            Cell::Text(self.subject_text.clone()),
            Cell::Text(self.result.clone()),
            Cell::Raw(
                self.mechanism
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
            ),
            Cell::Raw(self.succeeded.to_string()),
            Cell::Text(self.error_detail.clone()),
            Cell::Raw(self.location_before.clone()),
            Cell::Raw(self.timestamp.clone()),
        ]
    }
}
