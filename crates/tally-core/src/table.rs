//! Raw tables — the wide-format input as supplied by a table source.
//!
//! Every cell is kept as the verbatim source string. Parsing dates, counts,
//! and coordinates is the reshaper's job, so that the reshaper alone decides
//! what counts as malformed input.

/// One source row: a location's identity columns followed by one cell per
/// date column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
  /// Province/State; `None` when the source cell was empty.
  pub sub_region: Option<String>,
  /// Country/Region.
  pub region:     String,
  pub lat:        String,
  pub long:       String,
  /// Parallel to [`RawTable::date_columns`].
  pub cells:      Vec<String>,
}

/// A wide-format table: identity columns, then one column per reporting date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
  /// Header names of the date-valued columns, in source order.
  pub date_columns: Vec<String>,
  pub rows:         Vec<RawRow>,
}

impl RawTable {
  pub fn new(date_columns: Vec<String>) -> Self {
    Self { date_columns, rows: Vec::new() }
  }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }
}

/// The three tables one load consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTables {
  pub confirmed: RawTable,
  pub deaths:    RawTable,
  pub recovered: RawTable,
}
