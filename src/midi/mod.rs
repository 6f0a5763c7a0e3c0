//! Reading the MIDI files generated for each roll.
//!
//! Every roll has a note MIDI file and a performance (expression) MIDI file,
//! both SMF Format 1 with the tempo map in track 0 and note events in the
//! tracks after it. The note file supplies the timing resolution and tempo
//! map for the roll document; the performance file supplies per-hole
//! velocities.

mod tempo;
mod velocity;

pub use tempo::{tempo_map, ticks_per_quarter, TempoChange};
pub use velocity::{align_velocities, merge_midi_velocities, note_tracks, VelocityIndex};

use crate::error::MidiError;
use midly::Smf;

/// Parses a Standard MIDI File held in memory.
pub fn parse_smf(data: &[u8]) -> Result<Smf<'_>, MidiError> {
    Ok(Smf::parse(data)?)
}

/// Converts a Tempo meta value (microseconds per quarter note) to beats per
/// minute.
pub fn tempo_to_bpm(usec_per_beat: u32) -> f64 {
    if usec_per_beat == 0 {
        return 0.0;
    }
    60_000_000.0 / usec_per_beat as f64
}
