use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::depth::model::StatisticsRecord;
use crate::error::PersistenceError;

/// Column names of the run log, in order.
pub const COLUMNS: [&str; 5] = ["filename", "Quantile05", "Quantile95", "Mean", "Median"];

// ---------------------------------------------------------------------------
// LogRow – one CSV record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRow {
    pub filename: String,
    #[serde(rename = "Quantile05")]
    pub quantile05: f64,
    #[serde(rename = "Quantile95")]
    pub quantile95: f64,
    #[serde(rename = "Mean")]
    pub mean: f64,
    #[serde(rename = "Median")]
    pub median: f64,
}

impl LogRow {
    pub fn new(filename: impl Into<String>, stats: &StatisticsRecord) -> Self {
        LogRow {
            filename: filename.into(),
            quantile05: stats.quantile05,
            quantile95: stats.quantile95,
            mean: stats.mean,
            median: stats.median,
        }
    }
}

// ---------------------------------------------------------------------------
// RunLog – append-only CSV shared across runs
// ---------------------------------------------------------------------------

/// Append-only CSV log of per-image statistics.
///
/// The file is never truncated; history accumulates across runs. There is no
/// locking, so two processes appending to the same path can interleave rows.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
    columns: Vec<String>,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_columns(path, COLUMNS)
    }

    pub fn with_columns<I, S>(path: impl Into<PathBuf>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RunLog {
            path: path.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the log (and its parent folders) if it does not exist yet.
    pub fn touch(&self) -> Result<(), PersistenceError> {
        self.open().map(drop)
    }

    fn open(&self) -> Result<File, PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| PersistenceError::io(&self.path, e))
    }

    /// Append one row, writing the header first if the file is new or empty.
    pub fn append(&self, row: &LogRow) -> Result<(), PersistenceError> {
        let needs_header = fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let file = self.open()?;

        let csv_err = |source| PersistenceError::Log {
            path: self.path.clone(),
            source,
        };
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(&self.columns).map_err(csv_err)?;
        }
        writer.serialize(row).map_err(csv_err)?;
        writer
            .flush()
            .map_err(|e| PersistenceError::io(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, v: f64) -> LogRow {
        LogRow {
            filename: name.to_string(),
            quantile05: v,
            quantile95: v + 1.0,
            mean: v + 0.5,
            median: v + 0.25,
        }
    }

    #[test]
    fn header_written_once_on_fresh_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = RunLog::new(dir.path().join("nested/log.csv"));
        log.append(&row("a.jpg", 1.0)).unwrap();
        log.append(&row("b.jpg", 2.0)).unwrap();

        let text = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "filename,Quantile05,Quantile95,Mean,Median");
        assert_eq!(lines[1], "a.jpg,1.0,2.0,1.5,1.25");
        assert_eq!(lines.len(), 3);
        assert_eq!(text.matches("filename").count(), 1);
    }

    #[test]
    fn existing_file_is_appended_without_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        fs::write(&path, "filename,Quantile05,Quantile95,Mean,Median\nold.png,0,0,0,0\n").unwrap();

        RunLog::new(&path).append(&row("new.png", 3.0)).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("filename,"));
        assert!(text.contains("old.png"));
        assert!(text.ends_with("new.png,3.0,4.0,3.5,3.25\n"));
        assert_eq!(text.matches("filename").count(), 1);
    }

    #[test]
    fn empty_existing_file_gets_a_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        fs::write(&path, "").unwrap();
        RunLog::new(&path).append(&row("a.png", 0.0)).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("filename,Quantile05"));
    }

    #[test]
    fn filenames_with_commas_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let log = RunLog::new(dir.path().join("log.csv"));
        log.append(&row("a,b.png", 0.0)).unwrap();

        let mut reader = csv::Reader::from_path(log.path()).unwrap();
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[0], "a,b.png");
    }
}
