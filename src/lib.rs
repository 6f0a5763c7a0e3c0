//! rollcast - builds the per-roll data files a piano-roll playback viewer
//! loads.
//!
//! This library provides the hole-report parser, MIDI velocity alignment,
//! roll-type plausibility check and the batch driver that writes roll
//! documents and the catalog.

pub mod catalog;
pub mod config;
pub mod error;
pub mod ids;
pub mod midi;
pub mod output;
pub mod pipeline;
pub mod roll;
pub mod source;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogEntry, RollMetadata};
pub use config::{Config, SkipEntry};
pub use error::{ConfigError, IdListError, MidiError, ReportError, RollError};
pub use midi::VelocityIndex;
pub use output::OutputDir;
pub use pipeline::{build_hole_data, process_roll, run_batch, BatchSummary, HoleData, ProcessedRoll};
pub use roll::{EncodedHole, HoleCategory, HoleRecord, RollFields, RollType};
pub use source::{FsRollSource, InMemorySource, RollSource};
