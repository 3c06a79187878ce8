//! The `TableSource` trait — where raw tables come from.
//!
//! Acquisition (reading files, downloading, caching) lives outside the engine.
//! The engine's refresh path only needs something that can hand it a fresh
//! set of [`RawTables`] on demand.

use std::future::Future;

use crate::table::RawTables;

/// Supplier of the three raw tables for a load or refresh.
///
/// Returns a `Send` future so that refreshes can run on a multi-threaded
/// runtime (e.g. a tokio interval task).
pub trait TableSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Produce the current confirmed, deaths, and recovered tables.
  fn fetch(
    &self,
  ) -> impl Future<Output = Result<RawTables, Self::Error>> + Send + '_;

  /// Human-readable description used in log lines.
  fn describe(&self) -> String { std::any::type_name::<Self>().to_owned() }
}
