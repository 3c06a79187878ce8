//! Long-form CSV encoder.
//!
//! One line per observation; dates in ISO-8601; LF line endings.

use std::fmt::Write as _;

use tally_core::observation::ObservationSet;

const LONG_HEADER: &str =
  "region,sub_region,lat,long,date,confirmed,deaths,recovered,active";

/// Quote a field only when it contains a delimiter, quote, or line break.
fn escape_field(s: &str) -> String {
  if s.contains([',', '"', '\n', '\r']) {
    format!("\"{}\"", s.replace('"', "\"\""))
  } else {
    s.to_owned()
  }
}

pub(crate) fn write_long(set: &ObservationSet) -> String {
  let mut out = String::with_capacity(64 * (set.len() + 1));
  out.push_str(LONG_HEADER);
  out.push('\n');

  for obs in set.observations() {
    let location = set.location(obs.location);
    let (lat, long) = location
      .coordinates
      .map(|c| (c.lat.to_string(), c.long.to_string()))
      .unwrap_or_default();
    let c = &obs.counts;
    // Writing to a String cannot fail.
    let _ = writeln!(
      out,
      "{},{},{},{},{},{},{},{},{}",
      escape_field(&location.key.region),
      escape_field(location.key.sub_region.as_deref().unwrap_or("")),
      lat,
      long,
      obs.date,
      c.confirmed,
      c.deaths,
      c.recovered,
      c.active,
    );
  }

  out
}
