//! Error types for roll processing.
//!
//! Every error here is scoped to a single roll: the batch driver logs it
//! and moves on to the next roll.

use std::path::PathBuf;
use thiserror::Error;

/// Structural violations found while parsing a hole report.
///
/// These mean the report doesn't match the format the detector is supposed
/// to write, so the whole report is rejected rather than partially used.
/// Holes with an impossible duration are not errors; they are dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("line {line}: NOTE_ATTACK {attack} does not match ORIGIN_ROW {origin_row}")]
    AttackMismatch {
        line: usize,
        attack: i64,
        origin_row: i64,
    },

    #[error("line {line}: hole has NOTE_ATTACK but no OFF_TIME")]
    MissingOffTime { line: usize },

    #[error("line {line}: hole has OFF_TIME but no NOTE_ATTACK")]
    UnexpectedOffTime { line: usize },

    #[error("line {line}: hole is missing {field}")]
    MissingField { line: usize, field: &'static str },

    #[error("line {line}: {field} value {value:?} is not an integer")]
    InvalidNumber {
        line: usize,
        field: String,
        value: String,
    },

    #[error("line {line}: {marker} outside of a hole record")]
    UnbalancedHole { line: usize, marker: &'static str },
}

/// Failures reading a MIDI file with midly.
#[derive(Error, Debug)]
pub enum MidiError {
    #[error("MIDI parse error: {0}")]
    Parse(#[from] midly::Error),

    #[error("unsupported MIDI timing: {0}")]
    UnsupportedTiming(String),
}

/// Failures loading the batch configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Failures reading a roll id list.
#[derive(Error, Debug)]
pub enum IdListError {
    #[error("unable to read id list {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid CSV in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("{path} has no Druid column")]
    MissingColumn { path: PathBuf },
}

/// Anything that stops a single roll from being written.
#[derive(Error, Debug)]
pub enum RollError {
    #[error("hole report for {id}: {source}")]
    Report { id: String, source: ReportError },

    #[error("hole report for {id} is not valid UTF-8: {source}")]
    ReportEncoding {
        id: String,
        source: std::string::FromUtf8Error,
    },

    #[error("no metadata available for {0}")]
    MissingMetadata(String),

    #[error("invalid metadata for {id}: {source}")]
    Metadata {
        id: String,
        source: serde_json::Error,
    },

    #[error("note MIDI for {id}: {source}")]
    NoteMidi { id: String, source: MidiError },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for roll processing.
pub type Result<T, E = RollError> = std::result::Result<T, E>;
