//! Wide-format CSV decoder.
//!
//! Pipeline:
//!   raw &str
//!     └─ split_records()   → Vec<Record>   (RFC 4180 quoting, CRLF/LF)
//!          └─ parse_table() → RawTable     (header split, width check)

use tally_core::table::{RawRow, RawTable};

use crate::{
  IDENTITY_COLUMNS,
  error::{Error, Result},
};

// ─── Records ─────────────────────────────────────────────────────────────────

/// One logical CSV record and the line it started on (1-based).
struct Record {
  line:   usize,
  fields: Vec<String>,
}

impl Record {
  fn is_blank(&self) -> bool {
    self.fields.len() == 1 && self.fields[0].trim().is_empty()
  }
}

/// Split `s` into records, honouring double-quoted fields (which may contain
/// commas, doubled quotes, and line breaks). Blank lines are dropped.
fn split_records(s: &str) -> Result<Vec<Record>> {
  let mut records = Vec::new();
  let mut fields = Vec::new();
  let mut field = String::new();
  let mut in_quotes = false;
  let mut line = 1usize;
  let mut start_line = 1usize;
  let mut chars = s.chars().peekable();

  while let Some(c) = chars.next() {
    if in_quotes {
      match c {
        '"' if chars.peek() == Some(&'"') => {
          chars.next();
          field.push('"');
        }
        '"' => in_quotes = false,
        '\n' => {
          line += 1;
          field.push('\n');
        }
        _ => field.push(c),
      }
      continue;
    }

    match c {
      '"' => in_quotes = true,
      ',' => fields.push(std::mem::take(&mut field)),
      '\r' if chars.peek() == Some(&'\n') => {}
      '\n' => {
        fields.push(std::mem::take(&mut field));
        let record = Record { line: start_line, fields: std::mem::take(&mut fields) };
        if !record.is_blank() {
          records.push(record);
        }
        line += 1;
        start_line = line;
      }
      _ => field.push(c),
    }
  }

  if in_quotes {
    return Err(Error::UnterminatedQuote { line: start_line });
  }

  // Final record without a trailing newline.
  if !field.is_empty() || !fields.is_empty() {
    fields.push(field);
    let record = Record { line: start_line, fields };
    if !record.is_blank() {
      records.push(record);
    }
  }

  Ok(records)
}

// ─── Table ───────────────────────────────────────────────────────────────────

pub(crate) fn parse_table(input: &str) -> Result<RawTable> {
  let input = input.strip_prefix('\u{feff}').unwrap_or(input);
  let mut records = split_records(input)?.into_iter();

  let header = records.next().ok_or(Error::Empty)?;
  let width = header.fields.len();
  if width < IDENTITY_COLUMNS {
    return Err(Error::MissingIdentityColumns { found: width });
  }

  let date_columns = header.fields[IDENTITY_COLUMNS..]
    .iter()
    .map(|h| h.trim().to_owned())
    .collect();
  let mut table = RawTable::new(date_columns);

  for record in records {
    if record.fields.len() != width {
      return Err(Error::RaggedRow {
        line:     record.line,
        expected: width,
        found:    record.fields.len(),
      });
    }

    let mut fields = record.fields.into_iter();
    // Width was checked above, so the identity columns are present.
    let mut next = || fields.next().unwrap_or_default();
    let sub_region = next();
    let region = next();
    let lat = next();
    let long = next();
    let cells = fields.collect();

    let sub_region = sub_region.trim();
    table.rows.push(RawRow {
      sub_region: (!sub_region.is_empty()).then(|| sub_region.to_owned()),
      region: region.trim().to_owned(),
      lat,
      long,
      cells,
    });
  }

  Ok(table)
}
