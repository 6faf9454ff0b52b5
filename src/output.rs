//! Writing poll results to stdout or a file.

use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use fdbwatch_check::MetricRecord;
use serde::{Deserialize, Serialize};

/// How records are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON object per line
    Json,
    /// One human-readable line per record
    #[default]
    Text,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Text => "text",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Renders each poll's records to an underlying writer.
pub struct RecordWriter<W: Write> {
    writer: W,
    format: OutputFormat,
}

impl RecordWriter<Box<dyn Write + Send>> {
    /// Open stdout, or append to `path` when one is given.
    pub fn open(path: Option<&Path>, format: OutputFormat) -> Result<Self> {
        let writer: Box<dyn Write + Send> = match path {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("Failed to open output file {}", path.display()))?;
                Box::new(io::BufWriter::new(file))
            }
            None => Box::new(io::stdout()),
        };
        Ok(Self::new(writer, format))
    }
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self { writer, format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Write one batch of records and flush.
    pub fn write_records(&mut self, records: &[MetricRecord]) -> Result<()> {
        for record in records {
            match self.format {
                OutputFormat::Json => {
                    serde_json::to_writer(&mut self.writer, record)?;
                    writeln!(self.writer)?;
                }
                OutputFormat::Text => writeln!(self.writer, "{record}")?,
            }
        }
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> fmt::Debug for RecordWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordWriter")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}
