use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("CSV error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("spreadsheet error: {source}")]
    Xlsx {
        #[from]
        source: rust_xlsxwriter::XlsxError,
    },

    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ReportError>;
