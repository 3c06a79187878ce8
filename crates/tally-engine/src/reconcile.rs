//! Reconciler — joins the three reshaped metric streams into one
//! [`ObservationSet`].
//!
//! Confirmed and deaths must line up exactly; recovered reporting is known to
//! lag or be missing for some locations, so gaps there default to zero.

use std::collections::HashMap;

use chrono::NaiveDate;
use tally_core::{
  LoadError,
  location::{Location, LocationId, LocationKey},
  observation::{Counts, Metric, Observation, ObservationSet},
};

use crate::reshape::Reshaped;

type Key<'a> = (&'a LocationKey, NaiveDate);

/// Collapse a stream into a key → value map. Later records overwrite earlier
/// ones, so duplicate source rows resolve last-write-wins.
fn index_stream(stream: &Reshaped) -> HashMap<Key<'_>, i64> {
  let mut map = HashMap::with_capacity(stream.records.len());
  for record in &stream.records {
    map.insert((stream.key(record), record.date), record.value);
  }
  map
}

fn fault(key: &LocationKey, date: NaiveDate, missing: Metric) -> LoadError {
  LoadError::JoinIntegrityFault {
    region: key.region.clone(),
    sub_region: key.sub_region.clone(),
    date,
    missing,
  }
}

/// Join `confirmed`, `deaths`, and `recovered` on (location, date).
///
/// Locations are numbered in order of first appearance in the confirmed
/// table. A location's coordinates are the last non-empty pair seen for it in
/// that table.
pub fn reconcile(
  confirmed: &Reshaped,
  deaths: &Reshaped,
  recovered: &Reshaped,
) -> Result<ObservationSet, LoadError> {
  // ── Locations ────────────────────────────────────────────────────────────
  let mut locations: Vec<Location> = Vec::new();
  let mut location_ids: HashMap<&LocationKey, LocationId> = HashMap::new();
  let mut row_ids: Vec<LocationId> = Vec::with_capacity(confirmed.rows.len());

  for (row_idx, row) in confirmed.rows.iter().enumerate() {
    let id = *location_ids.entry(&row.key).or_insert_with(|| {
      locations.push(Location {
        key:              row.key.clone(),
        coordinates:      None,
        coordinates_from: None,
      });
      LocationId((locations.len() - 1) as u32)
    });
    if row.coordinates.is_some() {
      let location = &mut locations[id.index()];
      location.coordinates = row.coordinates;
      location.coordinates_from = Some(row_idx);
    }
    row_ids.push(id);
  }

  // ── Confirmed, deduplicated in first-seen order ──────────────────────────
  let mut confirmed_slots: HashMap<(LocationId, NaiveDate), usize> =
    HashMap::with_capacity(confirmed.records.len());
  let mut confirmed_values: Vec<(LocationId, NaiveDate, i64)> =
    Vec::with_capacity(confirmed.records.len());

  for record in &confirmed.records {
    let id = row_ids[record.row];
    match confirmed_slots.get(&(id, record.date)) {
      Some(&slot) => confirmed_values[slot].2 = record.value,
      None => {
        confirmed_slots.insert((id, record.date), confirmed_values.len());
        confirmed_values.push((id, record.date, record.value));
      }
    }
  }

  // ── Confirmed ⟗ deaths: both sides must match ────────────────────────────
  let deaths_by_key = index_stream(deaths);
  let recovered_by_key = index_stream(recovered);

  let mut observations = Vec::with_capacity(confirmed_values.len());
  let mut recovered_gaps = 0usize;

  for &(id, date, confirmed_value) in &confirmed_values {
    let key = &locations[id.index()].key;
    let deaths_value = *deaths_by_key
      .get(&(key, date))
      .ok_or_else(|| fault(key, date, Metric::Deaths))?;

    // ── ⟕ recovered: absent means zero ─────────────────────────────────────
    let recovered_value = match recovered_by_key.get(&(key, date)) {
      Some(&v) => v,
      None => {
        recovered_gaps += 1;
        0
      }
    };

    observations.push(Observation {
      location: id,
      date,
      counts: Counts::new(confirmed_value, deaths_value, recovered_value),
    });
  }

  for record in &deaths.records {
    let key = deaths.key(record);
    let matched = location_ids
      .get(key)
      .is_some_and(|id| confirmed_slots.contains_key(&(*id, record.date)));
    if !matched {
      return Err(fault(key, record.date, Metric::Confirmed));
    }
  }

  if recovered_gaps > 0 {
    tracing::debug!(recovered_gaps, "recovered counts defaulted to zero");
  }

  Ok(ObservationSet::new(locations, observations))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    reshape::reshape,
    tests::{day, table},
  };

  fn run(
    confirmed: &tally_core::table::RawTable,
    deaths: &tally_core::table::RawTable,
    recovered: &tally_core::table::RawTable,
  ) -> Result<ObservationSet, LoadError> {
    reconcile(
      &reshape(confirmed).unwrap(),
      &reshape(deaths).unwrap(),
      &reshape(recovered).unwrap(),
    )
  }

  #[test]
  fn joins_three_streams_and_derives_active() {
    let dates = ["1/22/20", "1/23/20"];
    let c = table(&dates, &[(None, "A", "1", "2", "10,20")]);
    let d = table(&dates, &[(None, "A", "1", "2", "1,2")]);
    let r = table(&dates, &[(None, "A", "1", "2", "3,4")]);
    let set = run(&c, &d, &r).unwrap();

    let counts: Vec<_> = set.observations().iter().map(|o| o.counts).collect();
    assert_eq!(counts, vec![Counts::new(10, 1, 3), Counts::new(20, 2, 4)]);
    assert_eq!(counts[1].active, 14);
  }

  #[test]
  fn missing_recovered_defaults_to_zero() {
    let dates = ["1/22/20", "1/23/20"];
    let c = table(&dates, &[(None, "A", "0", "0", "5,6"), (None, "B", "0", "0", "1,1")]);
    let d = table(&dates, &[(None, "A", "0", "0", "0,1"), (None, "B", "0", "0", "0,0")]);
    // Recovered only reports A, and only on the first date.
    let r = table(&["1/22/20"], &[(None, "A", "0", "0", "2")]);
    let set = run(&c, &d, &r).unwrap();

    let rows: Vec<_> = set
      .keyed()
      .map(|(k, o)| (k.region.as_str(), o.date, o.counts.recovered, o.counts.active))
      .collect();
    assert_eq!(
      rows,
      vec![
        ("A", day(2020, 1, 22), 2, 3),
        ("B", day(2020, 1, 22), 0, 1),
        ("A", day(2020, 1, 23), 0, 5),
        ("B", day(2020, 1, 23), 0, 1),
      ]
    );
  }

  #[test]
  fn confirmed_without_deaths_is_a_fault() {
    let c = table(&["1/22/20", "1/23/20"], &[(None, "A", "0", "0", "1,2")]);
    let d = table(&["1/22/20"], &[(None, "A", "0", "0", "0")]);
    let r = table(&[], &[]);
    match run(&c, &d, &r) {
      Err(LoadError::JoinIntegrityFault { region, sub_region, date, missing }) => {
        assert_eq!(region, "A");
        assert_eq!(sub_region, None);
        assert_eq!(date, day(2020, 1, 23));
        assert_eq!(missing, Metric::Deaths);
      }
      other => panic!("expected JoinIntegrityFault, got {other:?}"),
    }
  }

  #[test]
  fn deaths_without_confirmed_is_a_fault() {
    let c = table(&["1/22/20"], &[(None, "A", "0", "0", "1")]);
    let d = table(
      &["1/22/20"],
      &[(None, "A", "0", "0", "0"), (Some("Isle"), "A", "0", "0", "0")],
    );
    let r = table(&[], &[]);
    match run(&c, &d, &r) {
      Err(LoadError::JoinIntegrityFault { sub_region, missing, .. }) => {
        assert_eq!(sub_region.as_deref(), Some("Isle"));
        assert_eq!(missing, Metric::Confirmed);
      }
      other => panic!("expected JoinIntegrityFault, got {other:?}"),
    }
  }

  #[test]
  fn unmatched_recovered_rows_are_ignored() {
    let c = table(&["1/22/20"], &[(None, "A", "0", "0", "1")]);
    let d = table(&["1/22/20"], &[(None, "A", "0", "0", "0")]);
    let r = table(&["1/22/20"], &[(None, "Elsewhere", "0", "0", "9")]);
    let set = run(&c, &d, &r).unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set.locations().len(), 1);
  }

  #[test]
  fn duplicate_rows_resolve_last_write_wins() {
    let dates = ["1/22/20"];
    let c = table(
      &dates,
      &[(None, "A", "1", "1", "5"), (None, "B", "0", "0", "1"), (None, "A", "", "", "7")],
    );
    let d = table(&dates, &[(None, "A", "0", "0", "1"), (None, "B", "0", "0", "0"), (None, "A", "0", "0", "2")]);
    let r = table(&dates, &[]);
    let set = run(&c, &d, &r).unwrap();

    assert_eq!(set.len(), 2);
    let a = set.keyed().find(|(k, _)| k.region == "A").unwrap().1;
    assert_eq!(a.counts, Counts::new(7, 2, 0));
    // The later row had no coordinates, so the earlier pair is kept.
    assert_eq!(set.locations()[0].coordinates.map(|c| c.lat), Some(1.0));
  }

  #[test]
  fn coordinates_last_seen_wins() {
    let dates = ["1/22/20"];
    let c = table(&dates, &[(None, "A", "1", "1", "0"), (None, "A", "2", "3", "0")]);
    let d = table(&dates, &[(None, "A", "0", "0", "0")]);
    let set = run(&c, &d, &table(&dates, &[])).unwrap();
    let coords = set.locations()[0].coordinates.unwrap();
    assert_eq!((coords.lat, coords.long), (2.0, 3.0));
  }
}
