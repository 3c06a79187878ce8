//! Indexer — access paths over an [`ObservationSet`].
//!
//! The set stores observations date-major, so the by-date path is a list of
//! ranges into that storage. The by-location path holds observation positions
//! per location, ordered by date. Regions map to their locations; their
//! figures are summed on access so that one index serves both region- and
//! location-level queries. No observation payload is copied.

use std::{collections::HashMap, ops::Range};

use chrono::NaiveDate;
use tally_core::{
  location::{Coordinates, LocationId},
  observation::ObservationSet,
};

/// Position of one observation in a location's date-ordered series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesEntry {
  /// Index into [`Index::dates`].
  pub date_pos: usize,
  /// Index into [`ObservationSet::observations`].
  pub obs:      usize,
}

/// A region and the locations reporting under its name.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionEntry {
  pub name:        String,
  /// In location-id order.
  pub locations:   Vec<LocationId>,
  /// Coordinates from the region's last source row that carried any.
  pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Index {
  dates:           Vec<NaiveDate>,
  date_ranges:     Vec<Range<usize>>,
  location_series: Vec<Vec<SeriesEntry>>,
  regions:         Vec<RegionEntry>,
  region_by_name:  HashMap<String, usize>,
}

impl Index {
  /// Build all access paths in a single pass over the set.
  pub fn build(set: &ObservationSet) -> Self {
    let observations = set.observations();
    let mut dates: Vec<NaiveDate> = Vec::new();
    let mut date_ranges: Vec<Range<usize>> = Vec::new();
    let mut location_series = vec![Vec::new(); set.locations().len()];

    for (i, obs) in observations.iter().enumerate() {
      if dates.last() != Some(&obs.date) {
        if let Some(prev) = date_ranges.last_mut() {
          prev.end = i;
        }
        dates.push(obs.date);
        date_ranges.push(i..observations.len());
      }
      location_series[obs.location.index()].push(SeriesEntry {
        date_pos: dates.len() - 1,
        obs:      i,
      });
    }

    let mut regions: Vec<RegionEntry> = Vec::new();
    let mut region_by_name: HashMap<String, usize> = HashMap::new();
    let mut coordinates_from: Vec<Option<usize>> = Vec::new();
    for (i, location) in set.locations().iter().enumerate() {
      let slot = *region_by_name
        .entry(location.key.region.clone())
        .or_insert_with(|| {
          regions.push(RegionEntry {
            name:        location.key.region.clone(),
            locations:   Vec::new(),
            coordinates: None,
          });
          coordinates_from.push(None);
          regions.len() - 1
        });
      let region = &mut regions[slot];
      region.locations.push(LocationId(i as u32));
      if location.coordinates.is_some()
        && location.coordinates_from >= coordinates_from[slot]
      {
        region.coordinates = location.coordinates;
        coordinates_from[slot] = location.coordinates_from;
      }
    }

    Self { dates, date_ranges, location_series, regions, region_by_name }
  }

  /// Distinct dates, ascending.
  pub fn dates(&self) -> &[NaiveDate] { &self.dates }

  /// Observation positions for the date at `date_pos`.
  pub fn date_range(&self, date_pos: usize) -> Range<usize> {
    self.date_ranges[date_pos].clone()
  }

  /// Observation positions for `date`, if any observation carries it.
  pub fn range_for(&self, date: NaiveDate) -> Option<Range<usize>> {
    let pos = self.dates.binary_search(&date).ok()?;
    Some(self.date_range(pos))
  }

  /// A location's observations, ordered by date.
  pub fn location_series(&self, id: LocationId) -> &[SeriesEntry] {
    &self.location_series[id.index()]
  }

  /// Regions in order of first appearance in the source.
  pub fn regions(&self) -> &[RegionEntry] { &self.regions }

  /// Case-sensitive exact lookup.
  pub fn region(&self, name: &str) -> Option<&RegionEntry> {
    self.region_by_name.get(name).map(|&i| &self.regions[i])
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    reconcile::reconcile,
    reshape::reshape,
    tests::{day, table},
  };

  fn fixture() -> ObservationSet {
    let dates = ["1/22/20", "1/23/20", "1/24/20"];
    let rows = [
      (Some("Ontario"), "Canada", "51", "-85", "1,2,3"),
      (None, "Testland", "", "", "4,5,6"),
      (Some("Quebec"), "Canada", "52", "-72", "7,8,9"),
    ];
    let c = reshape(&table(&dates, &rows)).unwrap();
    let d = reshape(&table(&dates, &rows)).unwrap();
    let r = reshape(&table(&dates, &[])).unwrap();
    reconcile(&c, &d, &r).unwrap()
  }

  #[test]
  fn by_date_ranges_cover_each_date() {
    let set = fixture();
    let index = Index::build(&set);
    assert_eq!(index.dates(), &[day(2020, 1, 22), day(2020, 1, 23), day(2020, 1, 24)]);
    for (pos, date) in index.dates().iter().enumerate() {
      let range = index.date_range(pos);
      assert_eq!(range.len(), 3);
      assert!(set.observations()[range].iter().all(|o| o.date == *date));
    }
    assert_eq!(index.range_for(day(2020, 1, 23)), Some(3..6));
    assert_eq!(index.range_for(day(2021, 1, 1)), None);
  }

  #[test]
  fn location_series_is_date_ordered() {
    let set = fixture();
    let index = Index::build(&set);
    let series = index.location_series(LocationId(2));
    let values: Vec<_> = series
      .iter()
      .map(|e| set.observations()[e.obs].counts.confirmed)
      .collect();
    assert_eq!(values, vec![7, 8, 9]);
    let positions: Vec<_> = series.iter().map(|e| e.date_pos).collect();
    assert_eq!(positions, vec![0, 1, 2]);
  }

  #[test]
  fn regions_keep_insertion_order_and_last_coordinates() {
    let set = fixture();
    let index = Index::build(&set);
    let names: Vec<_> = index.regions().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Canada", "Testland"]);

    let canada = index.region("Canada").unwrap();
    assert_eq!(canada.locations, vec![LocationId(0), LocationId(2)]);
    assert_eq!(canada.coordinates, Some(Coordinates { lat: 52.0, long: -72.0 }));
    assert_eq!(index.region("Testland").unwrap().coordinates, None);
    assert!(index.region("canada").is_none());
  }

  #[test]
  fn empty_set_builds_empty_index() {
    let index = Index::build(&ObservationSet::default());
    assert!(index.dates().is_empty());
    assert!(index.regions().is_empty());
  }
}
