use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::formats::BookRecord;

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("refusing to append an empty batch to {}", .0.display())]
    EmptyBatch(PathBuf),
    #[error("open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("write rows to {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// The header row is written only when the file is missing or empty; an
/// existing file is appended to without being read.
pub fn append(batch: &[BookRecord], path: &Path) -> Result<(), WriteError> {
    if batch.is_empty() {
        return Err(WriteError::EmptyBatch(path.to_owned()));
    }

    let io_err = |source: std::io::Error| WriteError::Io {
        path: path.to_owned(),
        source,
    };
    let csv_err = |source: csv::Error| WriteError::Csv {
        path: path.to_owned(),
        source,
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)?;
    let write_header = file.metadata().map_err(io_err)?.len() == 0;
    if write_header {
        tracing::info!(path = %path.display(), "creating csv file");
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(write_header)
        .from_writer(file);
    for record in batch {
        writer.serialize(record).map_err(csv_err)?;
    }
    let mut file = writer
        .into_inner()
        .map_err(|err| io_err(err.into_error()))?;
    file.flush().map_err(io_err)?;
    file.sync_data().map_err(io_err)?;

    tracing::debug!(path = %path.display(), rows = batch.len(), "appended batch");
    Ok(())
}

pub trait BatchSink {
    fn accept(&mut self, page: u32, batch: &[BookRecord]) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct CsvAppender {
    path: PathBuf,
}

impl CsvAppender {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BatchSink for CsvAppender {
    fn accept(&mut self, page: u32, batch: &[BookRecord]) -> anyhow::Result<()> {
        append(batch, &self.path)?;
        tracing::debug!(page, rows = batch.len(), "page stored");
        Ok(())
    }
}
