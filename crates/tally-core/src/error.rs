//! Error types for `tally-core`.
//!
//! Load-time and query-time failures are kept in separate enums: a load error
//! aborts building a snapshot, while a query error only ever affects the one
//! query that raised it.

use chrono::NaiveDate;
use thiserror::Error;

use crate::observation::Metric;

/// A failure while turning three raw tables into a snapshot.
#[derive(Debug, Error)]
pub enum LoadError {
  #[error("malformed date column header: {column:?}")]
  MalformedDateColumn { column: String },

  #[error(
    "non-numeric measurement {value:?} in column {column:?} for {}",
    describe(.region, .sub_region)
  )]
  NonNumericMeasurement {
    region:     String,
    sub_region: Option<String>,
    column:     String,
    value:      String,
  },

  /// A confirmed row without a deaths counterpart, or the reverse.
  #[error(
    "{missing} missing for {} on {date}",
    describe(.region, .sub_region)
  )]
  JoinIntegrityFault {
    region:     String,
    sub_region: Option<String>,
    date:       NaiveDate,
    missing:    Metric,
  },

  #[error("table source error: {0}")]
  Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A query that cannot produce a value against the current snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
  #[error("unknown region: {0:?}")]
  UnknownRegion(String),

  #[error("insufficient history: need {required} dates, have {available}")]
  InsufficientHistory { required: usize, available: usize },
}

fn describe(region: &str, sub_region: &Option<String>) -> String {
  match sub_region {
    Some(sub) => format!("{region:?} / {sub:?}"),
    None => format!("{region:?}"),
  }
}
