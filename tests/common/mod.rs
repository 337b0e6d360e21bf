#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Flight sheet used across tests: one regular row, one sentinel row, and one
/// row with an unparseable actual departure.
pub const FLIGHTS_CSV: &str = "\
Flight,STD,ATD,STA,ATA,data
AI101,08:00:00,08:15:00,10:00:00,09:55:00,12:30:00
AI102,07:00:00,07:05:00,09:00:00,09:01:00,00:00:00
AI103,09:00:00,N/A,11:00:00,10:50:00,13:00:00
";

/// Scratch directory that is removed when dropped.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Writes `contents` to `name` inside the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.join(name);
        fs::write(&path, contents).expect("write temp file");
        path
    }
}

/// Reads a delimited file back as a header row plus string rows.
pub fn read_delimited(path: &Path, delimiter: u8) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .expect("open output");
    let headers = reader
        .headers()
        .expect("headers")
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|record| {
            record
                .expect("record")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect();
    (headers, rows)
}
