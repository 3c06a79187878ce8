//! Reconciliation and query engine for outbreak time series.
//!
//! Pipeline, run once per load:
//!   RawTable ×3
//!     └─ reshape()    → Reshaped ×3     (long form, per-cell validation)
//!          └─ reconcile() → ObservationSet (join, zero-fill, derive active)
//!               └─ Index::build()          (by date, by location, by region)
//!
//! The result is an immutable [`Snapshot`]; [`query`] functions read from it
//! and [`SnapshotHandle`] publishes replacements atomically.

pub mod index;
pub mod query;
pub mod reconcile;
pub mod reshape;
pub mod snapshot;

pub use snapshot::{Snapshot, SnapshotHandle, load, load_tables};
pub use tally_core::{LoadError, QueryError};
