//! Error taxonomy for loading, transforming, and writing flight tables.
//!
//! Only source and destination failures are errors. Cells that fail to parse
//! and roles that bind to no column are reported through
//! [`PreprocessReport`](crate::preprocess::PreprocessReport) instead.

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlightDelayError {
    #[error("Input file {path:?} is unavailable")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read workbook {path:?}: {message}")]
    Workbook { path: PathBuf, message: String },

    #[error("Failed to read delimited input {path:?}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Line {line} of {path:?} has {found} fields but the header has {expected}")]
    WideRecord {
        path: PathBuf,
        line: u64,
        found: usize,
        expected: usize,
    },

    #[error("Input {path:?} is not valid {encoding} text")]
    Decode { path: PathBuf, encoding: String },

    #[error("Unknown encoding '{0}'")]
    UnknownEncoding(String),

    #[error("Output format of {0:?} is not supported (use .xlsx, .csv or .tsv)")]
    UnsupportedOutput(PathBuf),

    #[error("Failed to write output {path:?}")]
    DestinationWriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write workbook {path:?}: {message}")]
    Xlsx { path: PathBuf, message: String },

    #[error("Invalid role configuration {path:?}: {message}")]
    RolesConfig { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, FlightDelayError>;
