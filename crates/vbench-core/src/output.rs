//! Result persistence.
//!
//! Every completed combination produces two effects: the raw model response
//! written verbatim to its own file, and one row appended to the CSV results
//! table. An optional JSON-lines mirror receives the same rows.

use crate::error::{BenchError, Result};
use crate::types::{Combination, InvocationOutcome, ResultRecord};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Create `path` and every missing parent. Existing directories are fine.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|source| BenchError::Output {
        path: path.to_path_buf(),
        source,
    })
}

/// `<root>/<test>/<model>/<format>/output_<count>.<format>`
pub fn content_path(output_root: &Path, combination: &Combination<'_>) -> PathBuf {
    let format = combination.format.as_str();
    output_root
        .join(&combination.test.name)
        .join(combination.model)
        .join(format)
        .join(format!("output_{}.{format}", combination.count))
}

/// A writer that serializes one JSON object per line.
pub struct JsonLinesWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write a single item on its own line.
    pub fn write<T: Serialize>(&mut self, item: &T) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
        writeln!(self.writer)
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Owns the results table for the duration of a run.
pub struct ResultRecorder {
    output_root: PathBuf,
    table: csv::Writer<File>,
    stats: Option<(PathBuf, JsonLinesWriter<BufWriter<File>>)>,
    records_written: usize,
}

impl ResultRecorder {
    /// Open the results table (and stats mirror) for writing, truncating any
    /// previous run's files. The header row is written immediately.
    pub fn create(
        output_root: &Path,
        results_file: &Path,
        stats_file: Option<&Path>,
    ) -> Result<Self> {
        let table_file = create_file(results_file)?;
        let stats = match stats_file {
            Some(path) => {
                let file = create_file(path)?;
                Some((
                    path.to_path_buf(),
                    JsonLinesWriter::new(BufWriter::new(file)),
                ))
            }
            None => None,
        };
        let mut table = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(table_file);
        table.write_record(ResultRecord::HEADERS)?;
        table.flush()?;
        tracing::debug!("Recording results to {:?}", results_file);

        Ok(Self {
            output_root: output_root.to_path_buf(),
            table,
            stats,
            records_written: 0,
        })
    }

    /// Where the raw response for `combination` is written.
    pub fn content_path(&self, combination: &Combination<'_>) -> PathBuf {
        content_path(&self.output_root, combination)
    }

    /// Persist one completed combination. Returns the raw content path.
    pub fn record(
        &mut self,
        combination: &Combination<'_>,
        outcome: &InvocationOutcome,
    ) -> Result<PathBuf> {
        let path = self.content_path(combination);
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        std::fs::write(&path, &outcome.raw_content).map_err(|source| BenchError::Output {
            path: path.clone(),
            source,
        })?;

        let record = ResultRecord::new(combination, outcome);
        self.table.serialize(&record)?;
        self.table.flush()?;

        if let Some((stats_path, stats)) = self.stats.as_mut() {
            stats
                .write(&record)
                .and_then(|()| stats.flush())
                .map_err(|source| BenchError::Output {
                    path: stats_path.clone(),
                    source,
                })?;
        }

        self.records_written += 1;
        Ok(path)
    }

    /// Flush and close every writer. Returns the number of rows written.
    pub fn finish(mut self) -> Result<usize> {
        self.table.flush()?;
        if let Some((stats_path, mut stats)) = self.stats.take() {
            stats.flush().map_err(|source| BenchError::Output {
                path: stats_path,
                source,
            })?;
        }
        Ok(self.records_written)
    }
}

fn create_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    File::create(path).map_err(|source| BenchError::Output {
        path: path.to_path_buf(),
        source,
    })
}
