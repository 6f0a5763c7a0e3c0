//! Batch configuration.
//!
//! Loaded from an optional JSON file; every field has a default so a
//! partial file (or none at all) is valid.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A roll left out of the batch, with the reason it's excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipEntry {
    pub id: String,
    #[serde(default)]
    pub reason: String,
}

/// Input and output locations and batch switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hole reports, `<id>.txt`.
    pub analysis_dir: PathBuf,
    /// MIDI files: `note/<id>_note.mid` and `exp/<id>_exp.mid`.
    pub midi_dir: PathBuf,
    /// Roll metadata, `<id>.json`.
    pub metadata_dir: PathBuf,
    /// Roll id lists (`*.txt`, `*.csv`) used when no ids are given.
    pub ids_dir: PathBuf,
    /// Destination for `json/`, `midi/` and `catalog.json`.
    pub output_dir: PathBuf,
    /// Include `tempoMap` in roll documents.
    pub write_tempo_maps: bool,
    /// Write `catalog.json` at the end of the batch.
    pub write_catalog: bool,
    /// Rolls that are never processed.
    pub skip: Vec<SkipEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            analysis_dir: PathBuf::from("input/txt"),
            midi_dir: PathBuf::from("midi"),
            metadata_dir: PathBuf::from("input/metadata"),
            ids_dir: PathBuf::from("input/druids"),
            output_dir: PathBuf::from("output"),
            write_tempo_maps: false,
            write_catalog: true,
            skip: Vec::new(),
        }
    }
}

impl Config {
    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not valid JSON.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Returns the exclusion for a roll, if it's on the skip list.
    pub fn skip_entry(&self, id: &str) -> Option<&SkipEntry> {
        self.skip.iter().find(|entry| entry.id == id)
    }
}
