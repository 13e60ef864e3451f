use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("empty CSV file: {}", .0.display())]
    EmptyData(PathBuf),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: invalid {column} value {value:?}")]
    Malformed {
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("{analysis} requires missing columns: {}", .columns.join(", "))]
    MissingColumns {
        analysis: &'static str,
        columns: Vec<&'static str>,
    },

    #[error("{analysis}: {operation} called before the analysis was run")]
    NotComputed {
        analysis: &'static str,
        operation: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
