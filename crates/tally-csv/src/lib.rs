//! CSV codec for Tally.
//!
//! Decodes wide-format time-series CSV (identity columns followed by one
//! column per reporting date) into [`RawTable`]s, and encodes a reconciled
//! [`ObservationSet`] as long-form CSV. Pure synchronous; no I/O.
//!
//! # Quick start
//!
//! ```no_run
//! let csv = "Province/State,Country/Region,Lat,Long,1/22/20,1/23/20\n\
//!            ,Testland,1.5,2.5,0,1\n";
//! let table = tally_csv::parse_table(csv).unwrap();
//! assert_eq!(table.date_columns, vec!["1/22/20", "1/23/20"]);
//! ```

pub mod error;
mod parse;
mod serialize;

pub use error::{Error, Result};
use tally_core::{observation::ObservationSet, table::RawTable};

/// Number of leading identity columns: Province/State, Country/Region, Lat,
/// Long.
pub const IDENTITY_COLUMNS: usize = 4;

/// Decode one wide-format table.
///
/// Identity columns are matched by position, not by header name. Every data
/// row must have as many fields as the header.
pub fn parse_table(input: &str) -> Result<RawTable> { parse::parse_table(input) }

/// Encode `set` as long-form CSV, one line per observation.
pub fn write_long(set: &ObservationSet) -> String { serialize::write_long(set) }
