//! Timing information from the note MIDI file.

use super::tempo_to_bpm;
use crate::error::MidiError;
use midly::{MetaMessage, Smf, Timing, TrackEventKind};
use serde::{Deserialize, Serialize};

/// A tempo change: absolute tick and beats per minute. Serializes as a
/// `[tick, bpm]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoChange(pub u64, pub f64);

impl TempoChange {
    pub fn tick(&self) -> u64 {
        self.0
    }

    pub fn bpm(&self) -> f64 {
        self.1
    }
}

/// Returns the metrical resolution (ticks per quarter note) of the file.
///
/// # Errors
///
/// Returns [`MidiError::UnsupportedTiming`] for SMPTE timecode files.
pub fn ticks_per_quarter(smf: &Smf) -> Result<u16, MidiError> {
    match smf.header.timing {
        Timing::Metrical(tpq) => Ok(tpq.as_int()),
        Timing::Timecode(fps, subframes) => Err(MidiError::UnsupportedTiming(format!(
            "SMPTE timecode ({} fps, {subframes} subframes)",
            fps.as_int()
        ))),
    }
}

/// Collects the Tempo meta events of track 0, in order.
pub fn tempo_map(smf: &Smf) -> Vec<TempoChange> {
    let Some(track) = smf.tracks.first() else {
        return Vec::new();
    };

    let mut changes = Vec::new();
    let mut current_tick: u64 = 0;
    for event in track {
        current_tick += event.delta.as_int() as u64;
        if let TrackEventKind::Meta(MetaMessage::Tempo(tempo)) = event.kind {
            changes.push(TempoChange(current_tick, tempo_to_bpm(tempo.as_int())));
        }
    }
    changes
}
