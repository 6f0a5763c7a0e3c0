//! Output folder layout.
//!
//! ```text
//! output/
//!   catalog.json
//!   json/<id>.json
//!   midi/note/<id>.mid
//!   midi/exp/<id>.mid
//! ```

use crate::catalog::Catalog;
use crate::error::RollError;
use crate::pipeline::ProcessedRoll;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes roll documents, MIDI copies and the catalog under one root.
#[derive(Debug, Clone)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn document_path(&self, id: &str) -> PathBuf {
        self.root.join("json").join(format!("{id}.json"))
    }

    pub fn note_midi_path(&self, id: &str) -> PathBuf {
        self.root.join("midi").join("note").join(format!("{id}.mid"))
    }

    pub fn performance_midi_path(&self, id: &str) -> PathBuf {
        self.root.join("midi").join("exp").join(format!("{id}.mid"))
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.root.join("catalog.json")
    }

    /// Writes a processed roll's document and MIDI files.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or file writing fails
    pub fn write_roll(&self, roll: &ProcessedRoll) -> Result<(), RollError> {
        let json = serde_json::to_string(&roll.document)?;
        write_file(&self.document_path(&roll.id), json.as_bytes())?;
        if let Some(data) = &roll.note_midi {
            write_file(&self.note_midi_path(&roll.id), data)?;
        }
        if let Some(data) = &roll.performance_midi {
            write_file(&self.performance_midi_path(&roll.id), data)?;
        }
        Ok(())
    }

    /// Writes `catalog.json`.
    pub fn write_catalog(&self, catalog: &Catalog) -> Result<(), RollError> {
        let path = self.catalog_path();
        let json = catalog.to_json()?;
        write_file(&path, json.as_bytes())
    }
}

fn write_file(path: &Path, data: &[u8]) -> Result<(), RollError> {
    let io_error = |source: std::io::Error| RollError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    fs::write(path, data).map_err(io_error)
}
