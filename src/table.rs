use crate::datetime::{format_input, parse_datetime};
use crate::error::{ChartError, ChartResult};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDateTime;
use csv::ReaderBuilder;
use serde::{Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extensions accepted by [`FileKind::from_path`].
pub const ALLOWED_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods", "csv"];

/// A single cell as handed over by the spreadsheet parser.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Interpret the cell as a point in time.
    ///
    /// Only cells the workbook marks as dates and text accepted by
    /// [`parse_datetime`] qualify. Plain numbers are not dates.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::DateTime(dt) => Some(*dt),
            CellValue::Text(s) => parse_datetime(s),
            CellValue::Number(_) | CellValue::Empty | CellValue::Bool(_) => None,
        }
    }

    /// Numeric value for plotting. Numeric text counts; everything else is a gap.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    fn from_text(text: &str) -> Self {
        if text.is_empty() {
            CellValue::Empty
        } else if let Ok(n) = text.trim().parse::<f64>() {
            CellValue::Number(n)
        } else {
            CellValue::Text(text.to_string())
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::DateTime(dt) => f.write_str(&format_input(dt)),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Empty => serializer.serialize_none(),
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::DateTime(dt) => serializer.serialize_str(&format_input(dt)),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty => CellValue::Empty,
            Data::String(s) if s.is_empty() => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(value) => CellValue::DateTime(value),
                None => CellValue::Number(dt.as_f64()),
            },
            Data::DateTimeIso(s) => match parse_datetime(s) {
                Some(value) => CellValue::DateTime(value),
                None => CellValue::Text(s.clone()),
            },
            other => CellValue::Text(other.to_string()),
        }
    }
}

/// Rows of one sheet, keyed by the header row's column names.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    /// Build a dataset; rejects zero rows since the axis choices hang off the columns.
    pub fn new(
        source: impl Into<PathBuf>,
        columns: Vec<String>,
        mut rows: Vec<Vec<CellValue>>,
    ) -> ChartResult<Self> {
        if rows.is_empty() {
            return Err(ChartError::EmptyDataset { path: source.into() });
        }
        for row in &mut rows {
            row.resize(columns.len(), CellValue::Empty);
        }
        Ok(Dataset { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column index by exact name, falling back to a case-insensitive match.
    pub fn column_index(&self, name: &str) -> ChartResult<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .or_else(|| self.columns.iter().position(|c| c.eq_ignore_ascii_case(name)))
            .ok_or_else(|| ChartError::UnknownColumn {
                name: name.to_string(),
                available: self.columns.join(", "),
            })
    }

    /// All cells of one column in row order.
    pub fn column(&self, name: &str) -> ChartResult<Vec<CellValue>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| row[idx].clone()).collect())
    }

    /// Resolve a selector to the canonical column name.
    pub fn resolve(&self, selector: &ColumnSelector) -> ChartResult<String> {
        match selector {
            ColumnSelector::Name(name) => Ok(self.columns[self.column_index(name)?].clone()),
            ColumnSelector::Index(idx) => {
                self.columns
                    .get(*idx)
                    .cloned()
                    .ok_or_else(|| ChartError::UnknownColumn {
                        name: format!("#{} (out of bounds)", idx),
                        available: self.columns.join(", "),
                    })
            }
        }
    }

    /// Column name for user input: an exact or case-insensitive name, else a 0-based index.
    pub fn find_column(&self, input: &str) -> ChartResult<String> {
        match self.column_index(input) {
            Ok(idx) => Ok(self.columns[idx].clone()),
            Err(err) => match parse_column_selector(input) {
                selector @ ColumnSelector::Index(_) => self.resolve(&selector),
                ColumnSelector::Name(_) => Err(err),
            },
        }
    }

    /// Same columns, only the rows for which `keep` holds.
    pub(crate) fn retain_rows<F>(&self, mut keep: F) -> Vec<Vec<CellValue>>
    where
        F: FnMut(&[CellValue]) -> bool,
    {
        self.rows.iter().filter(|row| keep(row.as_slice())).cloned().collect()
    }

    pub(crate) fn with_rows(&self, rows: Vec<Vec<CellValue>>) -> Dataset {
        Dataset {
            columns: self.columns.clone(),
            rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSelector {
    Index(usize),
    Name(String),
}

pub fn parse_column_selector(input: &str) -> ColumnSelector {
    match input.parse::<usize>() {
        Ok(index) => ColumnSelector::Index(index),
        Err(_) => ColumnSelector::Name(input.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Workbook,
    Csv,
}

impl FileKind {
    /// Classify a path by extension against [`ALLOWED_EXTENSIONS`].
    pub fn from_path(path: &Path) -> ChartResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(FileKind::Csv),
            ext if ALLOWED_EXTENSIONS.contains(&ext) => Ok(FileKind::Workbook),
            _ => Err(ChartError::InvalidFileType {
                extension,
                allowed: ALLOWED_EXTENSIONS.join(", "),
            }),
        }
    }
}

/// Load the first sheet of a workbook or a CSV file. `-` reads CSV from stdin.
pub fn load_dataset(path: &Path) -> ChartResult<Dataset> {
    if path == Path::new("-") {
        return read_csv(io::stdin(), path);
    }

    let kind = FileKind::from_path(path)?;
    debug!(path = %path.display(), ?kind, "loading dataset");

    let dataset = match kind {
        FileKind::Workbook => read_workbook(path)?,
        FileKind::Csv => {
            let file = File::open(path).map_err(|source| ChartError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            read_csv(file, path)?
        }
    };

    info!(
        path = %path.display(),
        rows = dataset.len(),
        columns = dataset.columns().len(),
        "dataset loaded"
    );
    Ok(dataset)
}

/// First sheet of a workbook; the first row holds the column names.
pub fn read_workbook(path: &Path) -> ChartResult<Dataset> {
    let mut workbook = open_workbook_auto(path)?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => return Err(ChartError::EmptyDataset { path: path.to_path_buf() }),
    };

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header_row) => header_names(header_row.iter().map(|c| c.to_string())),
        None => return Err(ChartError::EmptyDataset { path: path.to_path_buf() }),
    };

    let data: Vec<Vec<CellValue>> = rows
        .map(|row| row.iter().map(CellValue::from).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|c| *c != CellValue::Empty))
        .collect();

    Dataset::new(path, headers, data)
}

pub fn read_csv<R: Read>(input: R, source: &Path) -> ChartResult<Dataset> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(input);

    let headers = header_names(reader.headers()?.iter().map(|s| s.to_string()));

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(CellValue::from_text).collect());
    }

    Dataset::new(source, headers, rows)
}

// Blank header cells become `__EMPTY` and repeated names get `_1`, `_2`, ...
// suffixes, so every column keeps its own name.
fn header_names<I: Iterator<Item = String>>(raw: I) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut repeats: HashMap<String, usize> = HashMap::new();
    raw.map(|name| {
        let trimmed = name.trim();
        let base = if trimmed.is_empty() { "__EMPTY" } else { trimmed }.to_string();
        let mut unique = base.clone();
        while taken.contains(&unique) {
            let n = repeats.entry(base.clone()).or_insert(0);
            *n += 1;
            unique = format!("{}_{}", base, n);
        }
        taken.insert(unique.clone());
        unique
    })
    .collect()
}
