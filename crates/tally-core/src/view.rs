//! Derived views returned by queries.
//!
//! None of these are stored; each is computed from a snapshot on request and
//! handed to the caller as a plain value.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  location::Coordinates,
  observation::{Counts, Metric},
};

// ─── Time series ─────────────────────────────────────────────────────────────

/// Summed counts for one date (globally or within one region).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotals {
  pub date:   NaiveDate,
  #[serde(flatten)]
  pub counts: Counts,
}

/// Day-over-day change of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaPoint {
  pub date:  NaiveDate,
  pub value: i64,
}

/// Trailing mean of daily deltas ending at `date`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingPoint {
  pub date:  NaiveDate,
  pub value: f64,
}

/// One bar (daily delta) plus one line point (rolling mean) of the daily
/// cases chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyCasePoint {
  pub date:        NaiveDate,
  pub delta:       i64,
  /// `None` until a full window of deltas is available.
  pub rolling_avg: Option<f64>,
}

// ─── Headline counters ───────────────────────────────────────────────────────

/// Latest value of a metric and its change against the previous date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadlineCounter {
  pub latest:     i64,
  pub previous:   i64,
  pub change:     i64,
  /// `change / latest * 100`, rounded to two decimals; `None` if `latest`
  /// is zero.
  pub change_pct: Option<f64>,
}

impl HeadlineCounter {
  pub fn new(latest: i64, previous: i64) -> Self {
    let change = latest.saturating_sub(previous);
    let change_pct = (latest != 0).then(|| {
      let pct = change as f64 / latest as f64 * 100.0;
      (pct * 100.0).round() / 100.0
    });
    Self { latest, previous, change, change_pct }
  }
}

/// The four global counters, all taken from the newest date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Headline {
  pub date:      NaiveDate,
  pub confirmed: HeadlineCounter,
  pub deaths:    HeadlineCounter,
  pub recovered: HeadlineCounter,
  pub active:    HeadlineCounter,
}

/// A region's newest daily change of one metric, with the change one day
/// earlier for reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCases {
  pub region:   String,
  pub metric:   Metric,
  pub date:     NaiveDate,
  pub latest:   i64,
  pub previous: i64,
}

// ─── Per-location views ──────────────────────────────────────────────────────

/// Figures for one location within a region, placed at its own coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPoint {
  pub sub_region:  Option<String>,
  pub coordinates: Option<Coordinates>,
  #[serde(flatten)]
  pub counts:      Counts,
}

/// A region on its newest date: region-wide totals plus per-location values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSnapshot {
  pub region:    String,
  pub date:      NaiveDate,
  pub totals:    Counts,
  pub locations: Vec<LocationPoint>,
}

/// Map placement for a region: a centre and one point per location carrying
/// that location's historical maxima.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionMap {
  pub region: String,
  pub center: Option<Coordinates>,
  pub points: Vec<LocationPoint>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn headline_counter_percentage() {
    let c = HeadlineCounter::new(200, 150);
    assert_eq!(c.change, 50);
    assert_eq!(c.change_pct, Some(25.0));
  }

  #[test]
  fn headline_counter_zero_latest_has_no_percentage() {
    let c = HeadlineCounter::new(0, 3);
    assert_eq!(c.change, -3);
    assert_eq!(c.change_pct, None);
  }

  #[test]
  fn daily_totals_serialise_flat() {
    let t = DailyTotals {
      date:   NaiveDate::from_ymd_opt(2020, 1, 22).unwrap(),
      counts: Counts::new(3, 1, 1),
    };
    let json = serde_json::to_value(t).unwrap();
    assert_eq!(json["date"], "2020-01-22");
    assert_eq!(json["confirmed"], 3);
    assert_eq!(json["active"], 1);
  }
}
