//! Per-roll inputs.
//!
//! The pipeline reads everything for a roll through [`RollSource`], so it
//! has no knowledge of where files live. Every input is optional: a missing
//! hole report means the roll has no hole data, a missing performance MIDI
//! means no velocities.

use crate::roll::RollType;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Supplies the raw artifacts for a roll.
pub trait RollSource {
    /// Raw hole-detection report. Decoding is left to the pipeline so that
    /// a report which isn't UTF-8 fails the roll.
    fn hole_report(&self, id: &str) -> Option<Vec<u8>>;

    /// Note MIDI file, used for timing resolution and tempo map.
    fn note_midi(&self, id: &str) -> Option<Vec<u8>>;

    /// Performance MIDI file carrying expression velocities.
    fn performance_midi(&self, id: &str, roll_type: RollType) -> Option<Vec<u8>>;

    /// Roll metadata as a JSON object.
    fn metadata(&self, id: &str) -> Option<String>;
}

/// Reads roll artifacts from the directory layout the hole detector and
/// MIDI generator write.
#[derive(Debug, Clone)]
pub struct FsRollSource {
    analysis_dir: PathBuf,
    midi_dir: PathBuf,
    metadata_dir: PathBuf,
}

impl FsRollSource {
    pub fn new(
        analysis_dir: impl Into<PathBuf>,
        midi_dir: impl Into<PathBuf>,
        metadata_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            analysis_dir: analysis_dir.into(),
            midi_dir: midi_dir.into(),
            metadata_dir: metadata_dir.into(),
        }
    }

    pub fn from_config(config: &crate::Config) -> Self {
        Self::new(&config.analysis_dir, &config.midi_dir, &config.metadata_dir)
    }

    pub fn hole_report_path(&self, id: &str) -> PathBuf {
        self.analysis_dir.join(format!("{id}.txt"))
    }

    pub fn note_midi_path(&self, id: &str) -> PathBuf {
        self.midi_dir.join("note").join(format!("{id}_note.mid"))
    }

    /// Reduced-scale rolls have no separate expression file; their note
    /// file is stored in the expression folder instead.
    pub fn performance_midi_path(&self, id: &str, roll_type: RollType) -> PathBuf {
        let name = if roll_type.is_reduced_scale() {
            format!("{id}_note.mid")
        } else {
            format!("{id}_exp.mid")
        };
        self.midi_dir.join("exp").join(name)
    }

    pub fn metadata_path(&self, id: &str) -> PathBuf {
        self.metadata_dir.join(format!("{id}.json"))
    }
}

/// Reads a file, treating absence as None and logging any other failure.
fn read_optional<T>(path: &Path, read: impl FnOnce(&Path) -> std::io::Result<T>) -> Option<T> {
    match read(path) {
        Ok(data) => Some(data),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("Unable to find {}", path.display());
            None
        }
        Err(e) => {
            warn!("Unable to read {}: {e}", path.display());
            None
        }
    }
}

impl RollSource for FsRollSource {
    fn hole_report(&self, id: &str) -> Option<Vec<u8>> {
        read_optional(&self.hole_report_path(id), |p| fs::read(p))
    }

    fn note_midi(&self, id: &str) -> Option<Vec<u8>> {
        read_optional(&self.note_midi_path(id), |p| fs::read(p))
    }

    fn performance_midi(&self, id: &str, roll_type: RollType) -> Option<Vec<u8>> {
        read_optional(&self.performance_midi_path(id, roll_type), |p| fs::read(p))
    }

    fn metadata(&self, id: &str) -> Option<String> {
        read_optional(&self.metadata_path(id), |p| fs::read_to_string(p))
    }
}

/// Roll artifacts held in memory, keyed by roll id.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    pub reports: HashMap<String, String>,
    pub note_midis: HashMap<String, Vec<u8>>,
    pub performance_midis: HashMap<String, Vec<u8>>,
    pub metadata: HashMap<String, String>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RollSource for InMemorySource {
    fn hole_report(&self, id: &str) -> Option<Vec<u8>> {
        self.reports.get(id).map(|text| text.clone().into_bytes())
    }

    fn note_midi(&self, id: &str) -> Option<Vec<u8>> {
        self.note_midis.get(id).cloned()
    }

    fn performance_midi(&self, id: &str, _roll_type: RollType) -> Option<Vec<u8>> {
        self.performance_midis.get(id).cloned()
    }

    fn metadata(&self, id: &str) -> Option<String> {
        self.metadata.get(id).cloned()
    }
}
