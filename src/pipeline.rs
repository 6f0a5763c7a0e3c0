//! Per-roll processing and the batch driver.
//!
//! Each roll is processed on its own: report → holes → velocities →
//! diagnostic → encoded holes, merged with the roll's metadata into one
//! JSON document. A roll that fails is logged and the batch carries on.

use crate::catalog::{Catalog, CatalogEntry, RollMetadata};
use crate::config::Config;
use crate::error::{MidiError, ReportError, Result, RollError};
use crate::midi::{self, merge_midi_velocities};
use crate::output::OutputDir;
use crate::roll::{
    check_profile, encode_holes, parse_hole_report, EncodedHole, ProfileReport, RollFields,
    RollType,
};
use crate::source::RollSource;
use serde_json::{Map, Value};
use tracing::{error, info};

/// Hole-derived part of a roll document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoleData {
    pub fields: RollFields,
    /// None when the roll has no hole report or no usable holes.
    pub holes: Option<Vec<EncodedHole>>,
    pub dropped: usize,
    pub profile: Option<ProfileReport>,
}

/// Runs the hole stages for one roll.
///
/// A missing report gives empty fields and no hole data. A missing or
/// unreadable performance MIDI gives holes without velocities.
///
/// # Errors
///
/// Returns the parser's error when the report is structurally invalid.
pub fn build_hole_data(
    id: &str,
    report: Option<&str>,
    performance_midi: Option<&[u8]>,
    roll_type: RollType,
) -> Result<HoleData, ReportError> {
    let Some(text) = report else {
        info!("Unable to find hole analysis output for {id}");
        return Ok(HoleData::default());
    };

    let report = parse_hole_report(text)?;
    info!("{id}: dropped {} holes", report.dropped);

    let holes = merge_midi_velocities(
        report.holes,
        &report.fields,
        performance_midi,
        roll_type,
        id,
    );
    let profile = check_profile(&holes, &report.fields, roll_type);
    if let Some(profile) = &profile {
        profile.log(id);
    }

    Ok(HoleData {
        holes: (!holes.is_empty()).then(|| encode_holes(&holes)),
        fields: report.fields,
        dropped: report.dropped,
        profile,
    })
}

/// Everything produced for one roll.
#[derive(Debug, Clone)]
pub struct ProcessedRoll {
    pub id: String,
    /// The roll document written to `json/<id>.json`.
    pub document: Map<String, Value>,
    pub note_midi: Option<Vec<u8>>,
    pub performance_midi: Option<Vec<u8>>,
    pub catalog_entry: CatalogEntry,
    pub dropped_holes: usize,
    pub profile: Option<ProfileReport>,
}

/// Processes one roll from its source artifacts.
///
/// # Errors
///
/// Returns error if the roll has no metadata, its metadata or note MIDI
/// can't be parsed, or its hole report is structurally invalid.
pub fn process_roll<S: RollSource + ?Sized>(
    id: &str,
    source: &S,
    config: &Config,
) -> Result<ProcessedRoll> {
    let metadata_json = source
        .metadata(id)
        .ok_or_else(|| RollError::MissingMetadata(id.to_string()))?;
    let metadata = RollMetadata::from_json(&metadata_json).map_err(|source| RollError::Metadata {
        id: id.to_string(),
        source,
    })?;
    let roll_type = metadata.roll_type;
    info!("Roll type is {roll_type}...");

    let mut document = match serde_json::to_value(&metadata)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let note_midi = source.note_midi(id);
    if let Some(data) = &note_midi {
        let note_error = |source: MidiError| RollError::NoteMidi {
            id: id.to_string(),
            source,
        };
        let smf = midi::parse_smf(data).map_err(note_error)?;
        let tpq = midi::ticks_per_quarter(&smf).map_err(note_error)?;
        document.insert("NOTE_MIDI_TPQ".to_string(), Value::from(tpq));
        if config.write_tempo_maps {
            document.insert("tempoMap".to_string(), serde_json::to_value(midi::tempo_map(&smf))?);
        }
    }

    let report = source
        .hole_report(id)
        .map(String::from_utf8)
        .transpose()
        .map_err(|source| RollError::ReportEncoding {
            id: id.to_string(),
            source,
        })?;
    let performance_midi = source.performance_midi(id, roll_type);
    let hole_data = build_hole_data(
        id,
        report.as_deref(),
        performance_midi.as_deref(),
        roll_type,
    )
    .map_err(|source| RollError::Report {
        id: id.to_string(),
        source,
    })?;

    if let Value::Object(fields) = serde_json::to_value(&hole_data.fields)? {
        document.extend(fields);
    }
    document.insert("holeData".to_string(), serde_json::to_value(&hole_data.holes)?);

    Ok(ProcessedRoll {
        id: id.to_string(),
        catalog_entry: CatalogEntry::new(id, &metadata),
        document,
        note_midi,
        performance_midi,
        dropped_holes: hole_data.dropped,
        profile: hole_data.profile,
    })
}

/// Counts for a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Processes rolls in order, writing each one as it finishes, then writes
/// the catalog when enabled.
///
/// # Errors
///
/// Per-roll failures are logged and counted. Only a failure to write the
/// catalog is returned.
pub fn run_batch<S: RollSource + ?Sized>(
    ids: &[String],
    source: &S,
    config: &Config,
    output: &OutputDir,
) -> Result<BatchSummary> {
    let mut summary = BatchSummary::default();
    let mut catalog = Catalog::new();

    for id in ids {
        if let Some(entry) = config.skip_entry(id) {
            info!("Skipping {id}: {}", entry.reason);
            summary.skipped += 1;
            continue;
        }

        info!("Processing {id}...");
        let written = process_roll(id, source, config).and_then(|roll| {
            output.write_roll(&roll)?;
            Ok(roll)
        });
        match written {
            Ok(roll) => {
                catalog.push(roll.catalog_entry);
                summary.processed += 1;
            }
            Err(e) => {
                error!("Unable to process {id}, skipping: {e}");
                summary.failed += 1;
            }
        }
    }

    if config.write_catalog {
        output.write_catalog(&catalog)?;
        info!("Wrote {} rolls to {}", catalog.len(), output.catalog_path().display());
    }

    Ok(summary)
}
