//! Query engine — read-only views over a [`Snapshot`].
//!
//! Every function here is a pure function of a snapshot and its parameters.
//! Region lookups are case-sensitive exact matches; an unknown name yields
//! [`QueryError::UnknownRegion`], which is distinct from a known region that
//! simply has no rows for a date.

use chrono::NaiveDate;
use tally_core::{
  QueryError,
  location::Coordinates,
  observation::{Counts, Metric},
  view::{
    DailyCasePoint, DailyTotals, DeltaPoint, Headline, HeadlineCounter,
    LocationPoint, NewCases, RegionMap, RegionSnapshot, RollingPoint,
  },
};

use crate::{index::RegionEntry, snapshot::Snapshot};

/// Window used for the daily-cases rolling average.
pub const ROLLING_WINDOW: usize = 7;

fn region_entry<'a>(
  snapshot: &'a Snapshot,
  region: &str,
) -> Result<&'a RegionEntry, QueryError> {
  snapshot
    .index()
    .region(region)
    .ok_or_else(|| QueryError::UnknownRegion(region.to_owned()))
}

fn require(available: usize, required: usize) -> Result<(), QueryError> {
  if available < required {
    return Err(QueryError::InsufficientHistory { required, available });
  }
  Ok(())
}

// ─── Catalogue ───────────────────────────────────────────────────────────────

/// Region names in source order, for populating a selection control.
pub fn regions(snapshot: &Snapshot) -> Vec<&str> {
  snapshot.index().regions().iter().map(|r| r.name.as_str()).collect()
}

/// The newest date in the snapshot.
pub fn last_updated(snapshot: &Snapshot) -> Option<NaiveDate> {
  snapshot.index().dates().last().copied()
}

/// A region's coordinates, or `Ok(None)` if it exists but no row gave any.
pub fn region_coordinates(
  snapshot: &Snapshot,
  region: &str,
) -> Result<Option<Coordinates>, QueryError> {
  Ok(region_entry(snapshot, region)?.coordinates)
}

// ─── Daily totals ────────────────────────────────────────────────────────────

fn totals_on(snapshot: &Snapshot, date_pos: usize) -> DailyTotals {
  let index = snapshot.index();
  let observations = &snapshot.set().observations()[index.date_range(date_pos)];
  let mut counts = Counts::default();
  for obs in observations {
    counts.add(&obs.counts);
  }
  DailyTotals { date: index.dates()[date_pos], counts }
}

/// Totals across all locations for each date, ascending.
pub fn global_daily_totals(snapshot: &Snapshot) -> Vec<DailyTotals> {
  (0..snapshot.index().dates().len())
    .map(|pos| totals_on(snapshot, pos))
    .collect()
}

/// Totals across one region's locations for each date on which any of them
/// reported, ascending.
pub fn region_daily_totals(
  snapshot: &Snapshot,
  region: &str,
) -> Result<Vec<DailyTotals>, QueryError> {
  let entry = region_entry(snapshot, region)?;
  let index = snapshot.index();
  let observations = snapshot.set().observations();

  let mut slots: Vec<Option<Counts>> = vec![None; index.dates().len()];
  for &location in &entry.locations {
    for e in index.location_series(location) {
      slots[e.date_pos]
        .get_or_insert_with(Counts::default)
        .add(&observations[e.obs].counts);
    }
  }

  Ok(
    slots
      .into_iter()
      .zip(index.dates())
      .filter_map(|(counts, &date)| counts.map(|counts| DailyTotals { date, counts }))
      .collect(),
  )
}

// ─── Windowing ───────────────────────────────────────────────────────────────

/// Day-over-day change of `metric`. Position 0 has no predecessor and yields
/// nothing, so the result is one shorter than `series` (or empty).
pub fn daily_delta(series: &[DailyTotals], metric: Metric) -> Vec<DeltaPoint> {
  series
    .windows(2)
    .map(|w| DeltaPoint {
      date:  w[1].date,
      value: w[1].counts.get(metric).saturating_sub(w[0].counts.get(metric)),
    })
    .collect()
}

/// `series[i] - series[i - 1]` for one position.
pub fn delta_at(
  series: &[DailyTotals],
  metric: Metric,
  i: usize,
) -> Result<i64, QueryError> {
  if i == 0 || i >= series.len() {
    return Err(QueryError::InsufficientHistory {
      required:  (i + 1).max(2),
      available: series.len(),
    });
  }
  Ok(series[i].counts.get(metric).saturating_sub(series[i - 1].counts.get(metric)))
}

/// Trailing arithmetic mean over `window` deltas. The first `window - 1`
/// positions are absent from the output; a zero window yields nothing.
pub fn rolling_average(deltas: &[DeltaPoint], window: usize) -> Vec<RollingPoint> {
  if window == 0 {
    return Vec::new();
  }
  deltas
    .windows(window)
    .map(|w| {
      let sum: i128 = w.iter().map(|d| i128::from(d.value)).sum();
      RollingPoint {
        date:  w[window - 1].date,
        value: sum as f64 / window as f64,
      }
    })
    .collect()
}

/// A region's daily change of `metric` with its [`ROLLING_WINDOW`]-day
/// average, optionally limited to the last `tail` points.
pub fn daily_cases(
  snapshot: &Snapshot,
  region: &str,
  metric: Metric,
  tail: Option<usize>,
) -> Result<Vec<DailyCasePoint>, QueryError> {
  let series = region_daily_totals(snapshot, region)?;
  let deltas = daily_delta(&series, metric);
  let rolling = rolling_average(&deltas, ROLLING_WINDOW);

  let points: Vec<DailyCasePoint> = deltas
    .iter()
    .enumerate()
    .map(|(i, d)| DailyCasePoint {
      date:        d.date,
      delta:       d.value,
      rolling_avg: (i + 1)
        .checked_sub(ROLLING_WINDOW)
        .and_then(|j| rolling.get(j))
        .map(|r| r.value),
    })
    .collect();

  let skip = tail.map_or(0, |n| points.len().saturating_sub(n));
  Ok(points.into_iter().skip(skip).collect())
}

// ─── Headline counters ───────────────────────────────────────────────────────

/// Global counters for the newest date against the date before it. All four
/// metrics use the same latest-by-date rule.
pub fn headline(snapshot: &Snapshot) -> Result<Headline, QueryError> {
  let n = snapshot.index().dates().len();
  require(n, 2)?;
  let latest = totals_on(snapshot, n - 1);
  let previous = totals_on(snapshot, n - 2);
  let counter =
    |m: Metric| HeadlineCounter::new(latest.counts.get(m), previous.counts.get(m));

  Ok(Headline {
    date:      latest.date,
    confirmed: counter(Metric::Confirmed),
    deaths:    counter(Metric::Deaths),
    recovered: counter(Metric::Recovered),
    active:    counter(Metric::Active),
  })
}

/// A region's newest daily change of `metric`, with the previous day's change
/// for reference. Needs three dates of history.
pub fn new_cases(
  snapshot: &Snapshot,
  region: &str,
  metric: Metric,
) -> Result<NewCases, QueryError> {
  let series = region_daily_totals(snapshot, region)?;
  let n = series.len();
  require(n, 3)?;
  Ok(NewCases {
    region: region.to_owned(),
    metric,
    date: series[n - 1].date,
    latest: delta_at(&series, metric, n - 1)?,
    previous: delta_at(&series, metric, n - 2)?,
  })
}

// ─── Per-location views ──────────────────────────────────────────────────────

/// A region on its newest reporting date: totals summed across its locations
/// and one point per location that reported on that date.
pub fn latest_snapshot(
  snapshot: &Snapshot,
  region: &str,
) -> Result<RegionSnapshot, QueryError> {
  let entry = region_entry(snapshot, region)?;
  let index = snapshot.index();
  let set = snapshot.set();

  let latest_pos = entry
    .locations
    .iter()
    .filter_map(|&id| index.location_series(id).last())
    .map(|e| e.date_pos)
    .max()
    .ok_or(QueryError::InsufficientHistory { required: 1, available: 0 })?;

  let mut totals = Counts::default();
  let mut locations = Vec::new();
  for &id in &entry.locations {
    let Some(last) = index.location_series(id).last() else { continue };
    if last.date_pos != latest_pos {
      continue;
    }
    let obs = &set.observations()[last.obs];
    let location = set.location(id);
    totals.add(&obs.counts);
    locations.push(LocationPoint {
      sub_region:  location.key.sub_region.clone(),
      coordinates: location.coordinates,
      counts:      obs.counts,
    });
  }

  Ok(RegionSnapshot {
    region: entry.name.clone(),
    date: index.dates()[latest_pos],
    totals,
    locations,
  })
}

/// Per-location maxima across all history, each metric maximised on its own.
/// Sparse reporters are therefore placed with their best-known figures rather
/// than whatever the region's newest date shows for them.
pub fn location_peaks(
  snapshot: &Snapshot,
  region: &str,
) -> Result<Vec<LocationPoint>, QueryError> {
  let entry = region_entry(snapshot, region)?;
  let index = snapshot.index();
  let set = snapshot.set();

  Ok(
    entry
      .locations
      .iter()
      .filter_map(|&id| {
        let peak = index
          .location_series(id)
          .iter()
          .map(|e| set.observations()[e.obs].counts)
          .reduce(|a, b| a.max_each(&b))?;
        let location = set.location(id);
        Some(LocationPoint {
          sub_region:  location.key.sub_region.clone(),
          coordinates: location.coordinates,
          counts:      peak,
        })
      })
      .collect(),
  )
}

/// Map centre plus per-location peaks for a region.
pub fn region_map(snapshot: &Snapshot, region: &str) -> Result<RegionMap, QueryError> {
  let entry = region_entry(snapshot, region)?;
  Ok(RegionMap {
    region: entry.name.clone(),
    center: entry.coordinates,
    points: location_peaks(snapshot, region)?,
  })
}
