//! Roll id lists.
//!
//! Ids come either from plain text files (one per line) or from CSV exports
//! of the catalog, which list them in the `Druid` column.

use crate::error::IdListError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::error;

/// CSV column holding roll ids.
pub const ID_COLUMN: &str = "Druid";

/// Reads one id per line, ignoring blank lines.
pub fn read_ids_txt<P: AsRef<Path>>(path: P) -> Result<Vec<String>, IdListError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| IdListError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// Reads the `Druid` column of a CSV file.
pub fn read_ids_csv<P: AsRef<Path>>(path: P) -> Result<Vec<String>, IdListError> {
    let path = path.as_ref();
    let csv_error = |source: csv::Error| IdListError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;
    let column = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .position(|header| header.trim() == ID_COLUMN)
        .ok_or_else(|| IdListError::MissingColumn {
            path: path.to_path_buf(),
        })?;

    let mut ids = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        if let Some(id) = record.get(column).map(str::trim).filter(|id| !id.is_empty()) {
            ids.push(id.to_string());
        }
    }
    Ok(ids)
}

/// Collects ids from every `*.csv` and then every `*.txt` file in `dir`.
/// Unreadable files are logged and skipped.
pub fn read_ids_dir<P: AsRef<Path>>(dir: P) -> Vec<String> {
    let dir = dir.as_ref();
    let mut ids = Vec::new();
    for path in files_with_extension(dir, "csv") {
        match read_ids_csv(&path) {
            Ok(found) => ids.extend(found),
            Err(e) => error!("{e}"),
        }
    }
    for path in files_with_extension(dir, "txt") {
        match read_ids_txt(&path) {
            Ok(found) => ids.extend(found),
            Err(e) => error!("{e}"),
        }
    }
    ids
}

/// Ids from an explicit list file, CSV taking precedence over text. Falls
/// back to every list in `ids_dir` when no file is given or the file
/// yields no ids.
pub fn select_ids(
    csv_file: Option<&Path>,
    txt_file: Option<&Path>,
    ids_dir: &Path,
) -> Result<Vec<String>, IdListError> {
    let ids = match (csv_file, txt_file) {
        (Some(path), _) => read_ids_csv(path)?,
        (None, Some(path)) => read_ids_txt(path)?,
        (None, None) => Vec::new(),
    };
    if !ids.is_empty() {
        return Ok(ids);
    }
    Ok(read_ids_dir(ids_dir))
}

fn files_with_extension(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        error!("Unable to read id list folder {}", dir.display());
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == extension))
        .collect();
    paths.sort();
    paths
}
