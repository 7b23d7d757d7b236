use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Errors that can occur when reading or writing sheets.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid sheet name '{0}'")]
    InvalidSheetName(String),

    #[error("row {row}: expected {expected} cells, found {found}")]
    ShortRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("row {row}: invalid tax amount '{value}'")]
    InvalidAmount { row: usize, value: String },
}

/// A directory of CSV sheets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spreadsheet {
    dir: PathBuf,
}

impl Spreadsheet {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the CSV file backing `sheet`.
    pub fn sheet_path(
        &self,
        sheet: &str,
    ) -> Result<PathBuf, ExportError> {
        let valid = !sheet.is_empty()
            && sheet
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'));
        if !valid {
            return Err(ExportError::InvalidSheetName(sheet.to_string()));
        }
        Ok(self.dir.join(format!("{sheet}.csv")))
    }

    /// Every row of `sheet`, header included. A missing sheet has no rows.
    pub fn read_sheet(
        &self,
        sheet: &str,
    ) -> Result<Vec<Vec<String>>, ExportError> {
        let path = self.sheet_path(sheet)?;
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(rows)
    }

    /// True when `sheet` is missing or zero bytes long. The contents are
    /// never read, so a sheet with undecodable rows still reports correctly.
    pub fn is_blank(
        &self,
        sheet: &str,
    ) -> Result<bool, ExportError> {
        let path = self.sheet_path(sheet)?;
        match fs::metadata(&path) {
            Ok(meta) => Ok(meta.len() == 0),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
            Err(source) => Err(ExportError::Io { path, source }),
        }
    }

    /// Rows of `sheet` whose first cell equals `key`, each paired with its
    /// 1-based row number. Rows are compared as raw bytes and only matches
    /// are decoded, so undecodable rows elsewhere in the sheet are skipped.
    pub fn find_rows(
        &self,
        sheet: &str,
        key: &str,
    ) -> Result<Vec<(usize, Vec<String>)>, ExportError> {
        let path = self.sheet_path(sheet)?;
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)?;

        let mut found = Vec::new();
        for (i, record) in reader.byte_records().enumerate() {
            let record = record?;
            if record.get(0) != Some(key.as_bytes()) {
                continue;
            }
            let cells: Vec<String> = record
                .iter()
                .map(|cell| String::from_utf8_lossy(cell).into_owned())
                .collect();
            found.push((i + 1, cells));
        }
        debug!(sheet, key, matches = found.len(), "scanned sheet");
        Ok(found)
    }

    /// Appends `rows` after the last row of `sheet`, creating the sheet
    /// (and the directory) when missing. Returns the number of rows written.
    pub fn append_rows(
        &self,
        sheet: &str,
        rows: &[Vec<String>],
    ) -> Result<usize, ExportError> {
        let path = self.sheet_path(sheet)?;
        fs::create_dir_all(&self.dir).map_err(|source| ExportError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| ExportError::Io {
                path: path.clone(),
                source,
            })?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(file);
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush().map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(sheet, rows = rows.len(), path = %path.display(), "appended rows");
        Ok(rows.len())
    }
}
