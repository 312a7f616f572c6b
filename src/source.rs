//! ==============================================================================
//! source.rs - spreadsheet reader
//! ==============================================================================
//!
//! purpose:
//!     loads the whole spreadsheet on every poll so edits made between cycles
//!     are picked up, checks that every required column is present and drops
//!     rows whose timestamp cannot be parsed.
//!
//! formats:
//!     - xlsx / xlsm / xlsb / xls / ods: first worksheet, via calamine
//!     - csv: comma separated text, via the csv crate
//!
//! ```text
//!     the first row is always the header row.
//! ```
//!
//! relationships:
//!     - used by: feed.rs (once per cycle)
//!     - feeds: sample.rs (turns one Row into a Sample)
//!
//! ==============================================================================

use crate::config::ColumnsConfig;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Timelike};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read csv {path}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to open workbook {path}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("workbook {path} has no worksheets")]
    NoWorksheet { path: PathBuf },

    #[error("unsupported spreadsheet format: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("Missing column in spreadsheet: {column}")]
    MissingColumn { column: String },

    #[error("row {row}: column {column} is not numeric ({value})")]
    NotNumeric { column: String, row: usize, value: String },
}

/// a single spreadsheet cell, normalized across csv and workbook sources
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Bool(bool),
    Text(String),
    DateTime(NaiveDateTime),
}

impl Cell {
    /// numeric value of the cell; None when it has no finite float reading
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Cell::Number(n) => *n,
            Cell::Bool(b) => f64::from(u8::from(*b)),
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
            Cell::Empty | Cell::DateTime(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Cell::DateTime(dt) => Some(Timestamp::Naive(*dt)),
            Cell::Text(s) => Timestamp::parse(s),
            _ => None,
        }
    }

    fn header_name(&self) -> String {
        match self {
            Cell::Text(s) => s.trim().to_string(),
            Cell::Empty => String::new(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => f.write_str("empty"),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Text(s) => write!(f, "{:?}", s),
            Cell::DateTime(dt) => write!(f, "{}", dt),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(n) => Cell::Number(*n),
            Data::Bool(b) => Cell::Bool(*b),
            Data::String(s) => Cell::Text(s.clone()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(naive) => Cell::DateTime(naive),
                None => Cell::Number(dt.as_f64()),
            },
            Data::Error(e) => Cell::Text(e.to_string()),
        }
    }
}

/// parsed reading time, with the source offset when there was one
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timestamp {
    Naive(NaiveDateTime),
    Zoned(DateTime<FixedOffset>),
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

impl Timestamp {
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if let Ok(zoned) = DateTime::parse_from_rfc3339(text) {
            return Some(Timestamp::Zoned(zoned));
        }
        DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
            .or_else(|| {
                DATE_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
            .map(Timestamp::Naive)
    }

    /// `YYYY-MM-DDTHH:MM:SS[.ffffff][+HH:MM]`
    pub fn to_iso(&self) -> String {
        match self {
            Timestamp::Naive(dt) => dt.format(Self::time_format(dt.nanosecond())).to_string(),
            Timestamp::Zoned(dt) => {
                let base = dt.format(Self::time_format(dt.nanosecond()));
                format!("{}{}", base, dt.format("%:z"))
            }
        }
    }

    fn time_format(nanos: u32) -> &'static str {
        if nanos == 0 {
            "%Y-%m-%dT%H:%M:%S"
        } else {
            "%Y-%m-%dT%H:%M:%S%.6f"
        }
    }
}

/// position of every required column in the header row
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnIndex {
    pub timestamp: usize,
    pub ph: usize,
    pub turbidity: usize,
    pub temperature: usize,
    pub tds: usize,
    pub conductivity: usize,
}

impl ColumnIndex {
    fn resolve(headers: &[String], columns: &ColumnsConfig) -> Result<Self, SourceError> {
        let find = |name: &str| {
            let wanted = name.trim();
            headers
                .iter()
                .position(|h| h.as_str() == wanted)
                .ok_or_else(|| SourceError::MissingColumn { column: wanted.to_string() })
        };
        Ok(Self {
            timestamp: find(columns.timestamp.as_str())?,
            ph: find(columns.ph.as_str())?,
            turbidity: find(columns.turbidity.as_str())?,
            temperature: find(columns.temperature.as_str())?,
            tds: find(columns.tds.as_str())?,
            conductivity: find(columns.conductivity.as_str())?,
        })
    }
}

/// a data row that survived timestamp parsing
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    /// 1-based row number in the sheet, header included
    pub line: usize,
    pub timestamp: Timestamp,
    pub cells: Vec<Cell>,
}

static EMPTY: Cell = Cell::Empty;

impl Row {
    /// cell at `index`; rows shorter than the header read as empty
    pub fn cell(&self, index: usize) -> &Cell {
        self.cells.get(index).unwrap_or(&EMPTY)
    }
}

/// the usable part of the spreadsheet, in sheet order
#[derive(Clone, Debug)]
pub struct Table {
    pub headers: Vec<String>,
    pub columns: ColumnIndex,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// build from raw sheet rows; the first row is the header
    pub fn from_cells(raw: Vec<Vec<Cell>>, columns: &ColumnsConfig) -> Result<Self, SourceError> {
        Self::from_sheet(raw, 1, columns)
    }

    /// like `from_cells`, for a header sitting on 1-based sheet row `header_line`
    pub fn from_sheet(
        raw: Vec<Vec<Cell>>,
        header_line: usize,
        columns: &ColumnsConfig,
    ) -> Result<Self, SourceError> {
        let mut raw = raw.into_iter();
        let headers: Vec<String> = raw
            .next()
            .unwrap_or_default()
            .iter()
            .map(Cell::header_name)
            .collect();
        let index = ColumnIndex::resolve(&headers, columns)?;

        let rows = raw
            .enumerate()
            .filter_map(|(i, cells)| {
                let timestamp = cells.get(index.timestamp)?.as_timestamp()?;
                Some(Row { line: header_line + 1 + i, timestamp, cells })
            })
            .collect();

        Ok(Self { headers, columns: index, rows })
    }
}

/// read the spreadsheet at `path` and keep the rows with a valid timestamp
pub fn read_table(path: &Path, columns: &ColumnsConfig) -> Result<Table, SourceError> {
    let (raw, header_line) = match extension(path).as_deref() {
        Some("csv") => (read_csv(path)?, 1),
        Some("xlsx" | "xlsm" | "xlsb" | "xls" | "xla" | "ods") => read_workbook(path)?,
        _ => return Err(SourceError::UnsupportedFormat { path: path.to_path_buf() }),
    };
    Table::from_sheet(raw, header_line, columns)
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn read_csv(path: &Path) -> Result<Vec<Vec<Cell>>, SourceError> {
    let csv_err = |source: csv::Error| SourceError::Csv { path: path.to_path_buf(), source };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.trim().is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }
    Ok(rows)
}

/// first worksheet's rows plus the sheet row its header sits on. the range
/// starts at the first non-empty cell, so leading blank rows are skipped.
fn read_workbook(path: &Path) -> Result<(Vec<Vec<Cell>>, usize), SourceError> {
    let workbook_err = |source: calamine::Error| SourceError::Workbook { path: path.to_path_buf(), source };

    let mut workbook = open_workbook_auto(path).map_err(workbook_err)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SourceError::NoWorksheet { path: path.to_path_buf() })?
        .map_err(workbook_err)?;

    let header_line = range.start().map_or(1, |(row, _)| row as usize + 1);
    let rows = range
        .rows()
        .map(|row| row.iter().map(Cell::from).collect())
        .collect();
    Ok((rows, header_line))
}
