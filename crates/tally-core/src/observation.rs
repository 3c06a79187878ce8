//! Observations — one reconciled record per (location, date).

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::location::{Location, LocationId, LocationKey};

// ─── Metric ──────────────────────────────────────────────────────────────────

/// The four per-observation measures. Three are reported by the source
/// tables; `Active` is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
  Confirmed,
  Deaths,
  Recovered,
  Active,
}

impl Metric {
  pub const ALL: [Metric; 4] =
    [Metric::Confirmed, Metric::Deaths, Metric::Recovered, Metric::Active];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Confirmed => "confirmed",
      Self::Deaths => "deaths",
      Self::Recovered => "recovered",
      Self::Active => "active",
    }
  }
}

impl fmt::Display for Metric {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Metric {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Metric::ALL
      .into_iter()
      .find(|m| m.as_str() == s)
      .ok_or_else(|| format!("unknown metric: {s:?}"))
  }
}

// ─── Counts ──────────────────────────────────────────────────────────────────

/// Cumulative counts for one location or one aggregate on one date.
///
/// Signed so that inconsistent source data (e.g. a negative correction, or
/// `deaths + recovered > confirmed`) is carried through rather than clamped.
/// Arithmetic saturates at the `i64` bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
  pub confirmed: i64,
  pub deaths:    i64,
  pub recovered: i64,
  /// Always `confirmed - deaths - recovered`, saturating.
  pub active:    i64,
}

impl Counts {
  /// Build counts from the three reported measures, deriving `active`.
  pub fn new(confirmed: i64, deaths: i64, recovered: i64) -> Self {
    Self {
      confirmed,
      deaths,
      recovered,
      active: confirmed.saturating_sub(deaths).saturating_sub(recovered),
    }
  }

  pub fn get(&self, metric: Metric) -> i64 {
    match metric {
      Metric::Confirmed => self.confirmed,
      Metric::Deaths => self.deaths,
      Metric::Recovered => self.recovered,
      Metric::Active => self.active,
    }
  }

  /// Field-wise sum. Sums of consistent counts stay consistent.
  pub fn add(&mut self, other: &Counts) {
    self.confirmed = self.confirmed.saturating_add(other.confirmed);
    self.deaths = self.deaths.saturating_add(other.deaths);
    self.recovered = self.recovered.saturating_add(other.recovered);
    self.active = self.active.saturating_add(other.active);
  }

  /// Field-wise maximum. Each metric is maximised independently, so the
  /// result's `active` is not in general derivable from the other three.
  pub fn max_each(&self, other: &Counts) -> Counts {
    Counts {
      confirmed: self.confirmed.max(other.confirmed),
      deaths:    self.deaths.max(other.deaths),
      recovered: self.recovered.max(other.recovered),
      active:    self.active.max(other.active),
    }
  }
}

// ─── Observation ─────────────────────────────────────────────────────────────

/// One reconciled row of the observation set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
  pub location: LocationId,
  pub date:     NaiveDate,
  pub counts:   Counts,
}

// ─── ObservationSet ──────────────────────────────────────────────────────────

/// The reconciled dataset of one load: every location once, and exactly one
/// observation per (location, date).
///
/// Observations are held date-major — ordered by date, then by location id —
/// so that all observations for one date form a contiguous run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationSet {
  locations:    Vec<Location>,
  observations: Vec<Observation>,
}

impl ObservationSet {
  /// Assemble a set. Every observation's `location` must index `locations`,
  /// and (location, date) pairs must be unique.
  pub fn new(locations: Vec<Location>, mut observations: Vec<Observation>) -> Self {
    observations.sort_unstable_by_key(|o| (o.date, o.location));
    Self { locations, observations }
  }

  pub fn locations(&self) -> &[Location] { &self.locations }

  pub fn location(&self, id: LocationId) -> &Location {
    &self.locations[id.index()]
  }

  pub fn observations(&self) -> &[Observation] { &self.observations }

  pub fn len(&self) -> usize { self.observations.len() }

  pub fn is_empty(&self) -> bool { self.observations.is_empty() }

  /// Iterate observations with their location keys resolved.
  pub fn keyed(
    &self,
  ) -> impl Iterator<Item = (&LocationKey, &Observation)> + '_ {
    self
      .observations
      .iter()
      .map(|o| (&self.locations[o.location.index()].key, o))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn active_is_derived_without_clamping() {
    let c = Counts::new(5, 3, 4);
    assert_eq!(c.active, -2);
  }

  #[test]
  fn arithmetic_saturates_at_bounds() {
    assert_eq!(Counts::new(i64::MAX, -1, 0).active, i64::MAX);
    assert_eq!(Counts::new(i64::MIN, 1, 1).active, i64::MIN);

    let mut total = Counts::new(9_000_000_000_000_000_000, 0, 0);
    total.add(&Counts::new(9_000_000_000_000_000_000, 0, 0));
    assert_eq!(total.confirmed, i64::MAX);
    assert_eq!(total.active, i64::MAX);
  }

  #[test]
  fn add_keeps_active_consistent() {
    let mut total = Counts::new(10, 1, 2);
    total.add(&Counts::new(4, 0, 1));
    assert_eq!(total, Counts::new(14, 1, 3));
  }

  #[test]
  fn set_is_laid_out_date_major() {
    let day = |d| NaiveDate::from_ymd_opt(2020, 1, d).unwrap();
    let locations = vec![
      Location { key: LocationKey::new("A", None), coordinates: None, coordinates_from: None },
      Location { key: LocationKey::new("B", None), coordinates: None, coordinates_from: None },
    ];
    let obs = |loc, d| Observation {
      location: LocationId(loc),
      date:     day(d),
      counts:   Counts::default(),
    };
    let set = ObservationSet::new(
      locations,
      vec![obs(1, 23), obs(0, 23), obs(1, 22), obs(0, 22)],
    );
    let order: Vec<_> = set
      .keyed()
      .map(|(k, o)| (k.region.as_str(), o.date.format("%d").to_string()))
      .collect();
    assert_eq!(
      order,
      vec![
        ("A", "22".to_string()),
        ("B", "22".to_string()),
        ("A", "23".to_string()),
        ("B", "23".to_string()),
      ]
    );
  }

  #[test]
  fn metric_parses_lowercase_names() {
    assert_eq!("deaths".parse::<Metric>().unwrap(), Metric::Deaths);
    assert!("Deaths".parse::<Metric>().is_err());
    assert_eq!(
      serde_json::to_string(&Metric::Recovered).unwrap(),
      "\"recovered\""
    );
  }
}
