//! row -> Sample mapping. no defaulting or clamping: a cell that is not a
//! finite number fails the whole extraction.

use crate::domain::Sample;
use crate::source::{Row, SourceError, Table};

impl Table {
    /// build the Sample for the row at `index` (must be < `len()`)
    pub fn sample_at(&self, index: usize) -> Result<Sample, SourceError> {
        extract(self, &self.rows[index])
    }
}

pub fn extract(table: &Table, row: &Row) -> Result<Sample, SourceError> {
    let cols = &table.columns;
    let number = |index: usize| {
        let cell = row.cell(index);
        cell.as_f64().ok_or_else(|| SourceError::NotNumeric {
            column: table.headers[index].clone(),
            row: row.line,
            value: cell.to_string(),
        })
    };

    Ok(Sample {
        timestamp: row.timestamp.to_iso(),
        ph: number(cols.ph)?,
        turbidity: number(cols.turbidity)?,
        temperature: number(cols.temperature)?,
        tds: number(cols.tds)?,
        conductivity: number(cols.conductivity)?,
    })
}
