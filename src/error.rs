use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop a run before the chart is shown.
#[derive(Error, Debug)]
pub enum RpmError {
    #[error("csv file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// `row` is the 1-based line number in the csv file
    #[error("row {row} has {fields} field(s), expected at least 2 (time, rpm)")]
    MalformedRow { row: u64, fields: usize },

    #[error("row {row}: could not parse rpm value {value:?}")]
    NumericParse {
        row: u64,
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unsupported output file {}, use .svg or .png", .0.display())]
    UnsupportedOutput(PathBuf),

    #[error("could not draw the chart: {0}")]
    Render(String),

    #[error("could not open the chart window: {0}")]
    Window(String),
}
