//! Locations — the reporting units rows of a source table describe.
//!
//! A location is identified by its region (country) name and an optional
//! sub-region (province or state). Several locations may share a region;
//! region-level figures are always the sum over those locations.

use serde::{Deserialize, Serialize};

/// Identity of a reporting location. Comparison is case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocationKey {
  pub region:     String,
  /// `None` when the source row carries no province/state.
  pub sub_region: Option<String>,
}

impl LocationKey {
  pub fn new(region: impl Into<String>, sub_region: Option<String>) -> Self {
    Self { region: region.into(), sub_region }
  }
}

/// Latitude/longitude pair, used verbatim from the source table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
  pub lat:  f64,
  pub long: f64,
}

/// Compact handle for a [`Location`] inside one observation set.
///
/// Only meaningful together with the set that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationId(pub u32);

impl LocationId {
  pub fn index(self) -> usize { self.0 as usize }
}

/// A location together with its attributes for one load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
  pub key:         LocationKey,
  /// Last non-empty coordinates seen for this location in source row order.
  pub coordinates:      Option<Coordinates>,
  /// Confirmed-table row `coordinates` were taken from. Regions take their
  /// coordinates from the highest such row across their locations.
  #[serde(skip)]
  pub coordinates_from: Option<usize>,
}
