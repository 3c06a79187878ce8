//! Error types for the tally-csv codec.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
  #[error("CSV input has no header row")]
  Empty,

  #[error("header has {found} columns; at least 4 identity columns required")]
  MissingIdentityColumns { found: usize },

  #[error("line {line}: expected {expected} fields, found {found}")]
  RaggedRow {
    line:     usize,
    expected: usize,
    found:    usize,
  },

  #[error("line {line}: unterminated quoted field")]
  UnterminatedQuote { line: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
