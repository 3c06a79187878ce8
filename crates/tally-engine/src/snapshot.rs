//! Snapshots and their publication.
//!
//! A [`Snapshot`] is one fully-built observation set and its index. It is
//! never mutated. The [`SnapshotHandle`] owns the currently published
//! snapshot and swaps it for a new one on refresh; readers holding an older
//! `Arc<Snapshot>` keep using it undisturbed until they drop it.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tally_core::{
  LoadError,
  observation::ObservationSet,
  source::TableSource,
  table::{RawTable, RawTables},
};

use crate::{index::Index, reconcile::reconcile, reshape::reshape};

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// An immutable observation set plus its index, representing one load.
#[derive(Debug)]
pub struct Snapshot {
  set:        ObservationSet,
  index:      Index,
  loaded_at:  DateTime<Utc>,
  generation: u64,
}

impl Snapshot {
  /// Index `set` and wrap both into a snapshot.
  pub fn new(set: ObservationSet) -> Self {
    let index = Index::build(&set);
    Self { set, index, loaded_at: Utc::now(), generation: 0 }
  }

  pub fn set(&self) -> &ObservationSet { &self.set }

  pub fn index(&self) -> &Index { &self.index }

  /// When this snapshot was built.
  pub fn loaded_at(&self) -> DateTime<Utc> { self.loaded_at }

  /// Position of this snapshot in its handle's publication sequence,
  /// starting at 1. Zero until published.
  pub fn generation(&self) -> u64 { self.generation }
}

// ─── Load ────────────────────────────────────────────────────────────────────

/// Reshape, reconcile, and index three raw tables.
pub fn load(
  confirmed: &RawTable,
  deaths: &RawTable,
  recovered: &RawTable,
) -> Result<Snapshot, LoadError> {
  let confirmed = reshape(confirmed)?;
  let deaths = reshape(deaths)?;
  let recovered = reshape(recovered)?;
  let set = reconcile(&confirmed, &deaths, &recovered)?;
  let snapshot = Snapshot::new(set);

  tracing::info!(
    locations = snapshot.set.locations().len(),
    regions = snapshot.index.regions().len(),
    dates = snapshot.index.dates().len(),
    observations = snapshot.set.len(),
    "snapshot built"
  );
  Ok(snapshot)
}

/// [`load`] over a bundled [`RawTables`].
pub fn load_tables(tables: &RawTables) -> Result<Snapshot, LoadError> {
  load(&tables.confirmed, &tables.deaths, &tables.recovered)
}

// ─── Handle ──────────────────────────────────────────────────────────────────

/// The single shared reference to the published snapshot.
///
/// The lock guards only the `Arc` pointer: [`current`](Self::current) holds
/// it for the duration of a reference-count increment, and queries then run
/// against the returned snapshot without any lock. Refreshes are serialised
/// so that at most one load runs at a time.
#[derive(Debug)]
pub struct SnapshotHandle {
  current:    RwLock<Arc<Snapshot>>,
  refreshing: tokio::sync::Mutex<()>,
}

impl SnapshotHandle {
  pub fn new(mut snapshot: Snapshot) -> Self {
    snapshot.generation = 1;
    Self {
      current:    RwLock::new(Arc::new(snapshot)),
      refreshing: tokio::sync::Mutex::new(()),
    }
  }

  /// Fetch tables from `source`, load them, and wrap the result in a handle.
  pub async fn bootstrap<S: TableSource>(source: &S) -> Result<Self, LoadError> {
    let snapshot = fetch_and_load(source).await?;
    Ok(Self::new(snapshot))
  }

  /// The currently published snapshot.
  pub fn current(&self) -> Arc<Snapshot> {
    // The guarded value is a plain pointer, always valid; a panic elsewhere
    // while holding the lock cannot leave it half-written.
    self
      .current
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  /// Generation of the currently published snapshot. To describe a snapshot
  /// already in hand, use [`Snapshot::generation`] instead.
  pub fn generation(&self) -> u64 { self.current().generation() }

  /// Replace the published snapshot, numbering it one past the one it
  /// replaces. Readers see either the old or the new one, never a mix.
  pub fn publish(&self, mut snapshot: Snapshot) -> Arc<Snapshot> {
    let (next, previous) = {
      let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
      snapshot.generation = guard.generation + 1;
      let next = Arc::new(snapshot);
      (next.clone(), std::mem::replace(&mut *guard, next))
    };
    tracing::info!(
      generation = next.generation(),
      observations = next.set().len(),
      replaced_loaded_at = %previous.loaded_at(),
      "snapshot published"
    );
    next
  }

  /// Re-load from `source` and publish the result.
  ///
  /// On any failure the previously published snapshot stays in place and the
  /// error is returned.
  pub async fn refresh<S: TableSource>(
    &self,
    source: &S,
  ) -> Result<Arc<Snapshot>, LoadError> {
    let _guard = self.refreshing.lock().await;
    match fetch_and_load(source).await {
      Ok(snapshot) => Ok(self.publish(snapshot)),
      Err(e) => {
        tracing::warn!(
          source = %source.describe(),
          error = %e,
          "refresh failed; keeping current snapshot"
        );
        Err(e)
      }
    }
  }
}

/// Fetch from `source` and build a snapshot off the async executor.
async fn fetch_and_load<S: TableSource>(source: &S) -> Result<Snapshot, LoadError> {
  let tables = source
    .fetch()
    .await
    .map_err(|e| LoadError::Source(Box::new(e)))?;
  tokio::task::spawn_blocking(move || load_tables(&tables))
    .await
    .map_err(|e| LoadError::Source(Box::new(e)))?
}
