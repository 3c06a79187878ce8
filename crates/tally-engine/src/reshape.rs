//! Reshaper — wide raw tables into long-form metric records.
//!
//! Each source row is interned once as a [`RowIdentity`]; the per-date records
//! refer back to it by position so the identity strings are not repeated for
//! every date column.

use chrono::NaiveDate;
use tally_core::{
  LoadError,
  location::{Coordinates, LocationKey},
  table::RawTable,
};

/// Header formats accepted for date columns, tried in order. Two-digit years
/// must be tried first: `%Y` would happily read `20` as the year 20 AD.
const DATE_FORMATS: &[&str] = &["%m/%d/%y", "%m/%d/%Y", "%Y-%m-%d"];

// ─── Output types ────────────────────────────────────────────────────────────

/// Identity columns of one source row, interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct RowIdentity {
  pub key:         LocationKey,
  pub coordinates: Option<Coordinates>,
}

/// One (row, date, value) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricRecord {
  /// Index into [`Reshaped::rows`].
  pub row:   usize,
  pub date:  NaiveDate,
  pub value: i64,
}

/// A raw table in long form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reshaped {
  /// Source rows in source order.
  pub rows:    Vec<RowIdentity>,
  /// Records in source row order, then date column order.
  pub records: Vec<MetricRecord>,
}

impl Reshaped {
  pub fn key(&self, record: &MetricRecord) -> &LocationKey {
    &self.rows[record.row].key
  }
}

// ─── Cell parsing ────────────────────────────────────────────────────────────

/// Parse a date column header.
pub fn parse_date_column(header: &str) -> Result<NaiveDate, LoadError> {
  let trimmed = header.trim();
  DATE_FORMATS
    .iter()
    .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
    .ok_or_else(|| LoadError::MalformedDateColumn { column: header.to_owned() })
}

/// Parse a count cell. Integral decimals such as `12.0` are accepted since
/// some exporters write every number as a float; anything else, including an
/// empty cell, is rejected.
pub fn parse_count(cell: &str) -> Option<i64> {
  let cell = cell.trim();
  if let Ok(n) = cell.parse::<i64>() {
    return Some(n);
  }
  let f = cell.parse::<f64>().ok()?;
  let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
  (f.is_finite() && f.fract() == 0.0 && in_range).then_some(f as i64)
}

/// Coordinates are optional: a row with an empty or unparseable latitude or
/// longitude simply has none.
fn parse_coordinates(lat: &str, long: &str) -> Option<Coordinates> {
  let lat = lat.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
  let long = long.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
  Some(Coordinates { lat, long })
}

// ─── Reshape ─────────────────────────────────────────────────────────────────

/// Convert `table` into long form. Fails on the first malformed date header
/// (checked before any cell) or non-numeric cell. Negative counts pass
/// through.
pub fn reshape(table: &RawTable) -> Result<Reshaped, LoadError> {
  let dates = table
    .date_columns
    .iter()
    .map(|column| parse_date_column(column))
    .collect::<Result<Vec<_>, _>>()?;

  let mut out = Reshaped {
    rows:    Vec::with_capacity(table.rows.len()),
    records: Vec::with_capacity(table.rows.len() * dates.len()),
  };

  for (row_idx, row) in table.rows.iter().enumerate() {
    out.rows.push(RowIdentity {
      key:         LocationKey::new(row.region.clone(), row.sub_region.clone()),
      coordinates: parse_coordinates(&row.lat, &row.long),
    });

    for (col, (column, date)) in table.date_columns.iter().zip(&dates).enumerate() {
      let cell = row.cells.get(col).map(String::as_str).unwrap_or("");
      let value =
        parse_count(cell).ok_or_else(|| LoadError::NonNumericMeasurement {
          region:     row.region.clone(),
          sub_region: row.sub_region.clone(),
          column:     column.clone(),
          value:      cell.to_owned(),
        })?;
      out.records.push(MetricRecord { row: row_idx, date: *date, value });
    }
  }

  Ok(out)
}
