use std::path::PathBuf;
use thiserror::Error;

/// Every condition a user can run into while loading, charting or exporting.
///
/// None of these are fatal: the shell reports them and keeps the previous state.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("unsupported file type '{extension}' (expected one of: {allowed})")]
    InvalidFileType { extension: String, allowed: String },

    #[error("'{}' contains no data rows", path.display())]
    EmptyDataset { path: PathBuf },

    #[error("both a start and an end date/time are required")]
    MissingRangeInput,

    #[error("could not parse '{input}' as a date/time")]
    InvalidDateTime { input: String },

    #[error("start {start} is after end {end}")]
    InvalidRangeOrder { start: String, end: String },

    #[error("no rows fall between {start} and {end}")]
    EmptyRangeResult { start: String, end: String },

    #[error("no X-axis column selected")]
    MissingXAxis,

    #[error("column '{name}' not found. Available columns: {available}")]
    UnknownColumn { name: String, available: String },

    #[error("column '{column}' has no date/time values")]
    NoDateValues { column: String },

    #[error("no file loaded")]
    NoDataset,

    #[error("no axes selected")]
    NoSelection,

    #[error("no chart displayed")]
    NoChart,

    #[error("failed to export chart image to '{}'", path.display())]
    ExportFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read workbook")]
    Workbook(#[from] calamine::Error),

    #[error("failed to read CSV data")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Render(#[from] anyhow::Error),
}

pub type ChartResult<T> = Result<T, ChartError>;
