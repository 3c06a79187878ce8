//! Table source backed by three CSV files on local disk.

use std::path::{Path, PathBuf};

use tally_core::{
  source::TableSource,
  table::{RawTable, RawTables},
};
use thiserror::Error;

/// A failure to read or decode one of the source files.
#[derive(Debug, Error)]
pub enum SourceError {
  #[error("failed to read {path:?}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("malformed CSV in {path:?}: {source}")]
  Csv {
    path:   PathBuf,
    #[source]
    source: tally_csv::Error,
  },
}

/// Reads the confirmed, deaths, and recovered tables from disk on every
/// fetch, so edits to the files are picked up by the next refresh.
#[derive(Debug, Clone)]
pub struct FileSource {
  confirmed: PathBuf,
  deaths:    PathBuf,
  recovered: PathBuf,
}

impl FileSource {
  pub fn new(
    confirmed: impl Into<PathBuf>,
    deaths: impl Into<PathBuf>,
    recovered: impl Into<PathBuf>,
  ) -> Self {
    Self {
      confirmed: confirmed.into(),
      deaths:    deaths.into(),
      recovered: recovered.into(),
    }
  }
}

async fn read_table(path: &Path) -> Result<RawTable, SourceError> {
  let text = tokio::fs::read_to_string(path)
    .await
    .map_err(|source| SourceError::Io { path: path.to_owned(), source })?;
  tally_csv::parse_table(&text)
    .map_err(|source| SourceError::Csv { path: path.to_owned(), source })
}

impl TableSource for FileSource {
  type Error = SourceError;

  async fn fetch(&self) -> Result<RawTables, Self::Error> {
    let (confirmed, deaths, recovered) = tokio::try_join!(
      read_table(&self.confirmed),
      read_table(&self.deaths),
      read_table(&self.recovered),
    )?;
    tracing::debug!(
      confirmed_rows = confirmed.rows.len(),
      deaths_rows = deaths.rows.len(),
      recovered_rows = recovered.rows.len(),
      "source files read"
    );
    Ok(RawTables { confirmed, deaths, recovered })
  }

  fn describe(&self) -> String {
    format!(
      "files {:?}, {:?}, {:?}",
      self.confirmed, self.deaths, self.recovered
    )
  }
}
