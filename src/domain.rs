use serde::{Deserialize, Serialize};

/// one published sensor reading, built from a single spreadsheet row.
/// field order here is the key order of the json the dashboard reads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// iso-8601 reading time, e.g. "2024-05-01T10:00:00"
    pub timestamp: String,
    pub ph: f64,
    /// nephelometric turbidity units
    pub turbidity: f64,
    /// degrees celsius
    pub temperature: f64,
    /// total dissolved solids in ppm
    pub tds: f64,
    /// microsiemens per centimetre
    pub conductivity: f64,
}

/// persisted read position into the spreadsheet rows
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorState {
    /// next row to publish; may exceed the row count or be negative, it is
    /// wrapped into range on use
    pub cursor: i64,
}

impl CursorState {
    /// row index for a table of `rows` rows. `rows` must be non-zero.
    pub fn index(&self, rows: usize) -> usize {
        self.cursor.rem_euclid(rows as i64) as usize
    }

    /// move past `index`, the row that was just published
    pub fn advance_past(&mut self, index: usize) {
        self.cursor = index as i64 + 1;
    }
}
