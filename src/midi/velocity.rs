//! Aligning performance velocities onto detected holes.
//!
//! The performance MIDI is generated from the hole report with tick 0 at the
//! roll's first musical hole and one tick per pixel row, so a hole's note-on
//! sits at `origin_row - FIRST_HOLE` on the hole's MIDI key.

use super::parse_smf;
use crate::error::MidiError;
use crate::roll::{HoleRecord, RollFields, RollType};
use midly::{MidiMessage, Smf, TrackEvent, TrackEventKind};
use std::collections::HashMap;
use std::ops::Range;
use tracing::{debug, info, warn};

/// Note-on velocities keyed by (tick, MIDI key).
///
/// Velocities of 0 and 1 are left out: 0 is a note-off and the MIDI
/// generator writes 1 on events that carry no expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VelocityIndex {
    entries: HashMap<(i64, u8), u8>,
}

impl VelocityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the index from the note tracks used by `roll_type`.
    pub fn from_smf(smf: &Smf, roll_type: RollType) -> Self {
        let mut index = Self::new();
        let tracks = note_tracks(roll_type);
        for track in smf.tracks.iter().skip(tracks.start).take(tracks.len()) {
            index.add_track(track);
        }
        index
    }

    pub fn from_bytes(data: &[u8], roll_type: RollType) -> Result<Self, MidiError> {
        let smf = parse_smf(data)?;
        Ok(Self::from_smf(&smf, roll_type))
    }

    fn add_track(&mut self, track: &[TrackEvent]) {
        let mut current_tick: u64 = 0;
        for event in track {
            current_tick += event.delta.as_int() as u64;
            if let TrackEventKind::Midi {
                message: MidiMessage::NoteOn { key, vel },
                ..
            } = event.kind
            {
                self.insert(current_tick as i64, key.as_int(), vel.as_int());
            }
        }
    }

    /// Records a note-on. A repeated (tick, key) keeps the later velocity.
    pub fn insert(&mut self, tick: i64, key: u8, velocity: u8) {
        if velocity > 1 {
            self.entries.insert((tick, key), velocity);
        }
    }

    /// Looks up the velocity at `tick` for a hole's MIDI key. Keys outside
    /// 0-127 never match.
    pub fn get(&self, tick: i64, midi_key: i64) -> Option<u8> {
        let key = u8::try_from(midi_key).ok().filter(|k| *k <= 127)?;
        self.entries.get(&(tick, key)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Performance MIDI tracks holding note events for a roll type: one for
/// reduced-scale rolls, two (bass and treble) otherwise. Track 0 is the
/// tempo track.
pub fn note_tracks(roll_type: RollType) -> Range<usize> {
    let count = if roll_type.is_reduced_scale() { 1 } else { 2 };
    1..1 + count
}

/// Attaches indexed velocities to holes. Holes without a matching note-on
/// keep whatever velocity they had. Returns the number of holes matched.
pub fn align_velocities(
    holes: &mut [HoleRecord],
    first_hole_row: i64,
    index: &VelocityIndex,
) -> usize {
    let mut matched = 0;
    for hole in holes.iter_mut() {
        if let Some(velocity) = index.get(hole.tick(first_hole_row), hole.midi_key) {
            hole.set_velocity(velocity);
            matched += 1;
        }
    }
    matched
}

/// Enriches holes with velocities from the roll's performance MIDI.
///
/// A missing or unreadable MIDI file, or a report without a usable
/// `FIRST_HOLE`, leaves the holes unchanged.
pub fn merge_midi_velocities(
    mut holes: Vec<HoleRecord>,
    fields: &RollFields,
    midi: Option<&[u8]>,
    roll_type: RollType,
    id: &str,
) -> Vec<HoleRecord> {
    let Some(data) = midi else {
        info!("MIDI file not found for {id}, won't include velocities");
        return holes;
    };
    let Some(first_hole_row) = fields.first_hole_row() else {
        warn!("{id}: report has no usable FIRST_HOLE, won't include velocities");
        return holes;
    };
    let index = match VelocityIndex::from_bytes(data, roll_type) {
        Ok(index) => index,
        Err(e) => {
            warn!("{id}: unable to read performance MIDI, won't include velocities: {e}");
            return holes;
        }
    };

    let matched = align_velocities(&mut holes, first_hole_row, &index);
    debug!(
        "{id}: matched velocities for {matched} of {} holes ({} note-ons indexed)",
        holes.len(),
        index.len()
    );
    holes
}
