//! Hole records and roll-level report fields.
//!
//! All positions are in pixels of the scanned roll image: columns run across
//! the roll, rows run along it in playback direction.

use serde::{Deserialize, Serialize};

/// Tag attached to holes the detector listed in its bad-holes section.
/// Ordinary holes carry no category at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoleCategory {
    Flagged,
}

impl HoleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            HoleCategory::Flagged => "flagged",
        }
    }
}

/// One detected perforation.
///
/// A record only exists once the report parser has checked
/// `origin_row < off_time`; later stages may add a velocity but never
/// change the geometry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoleRecord {
    /// Hole width in columns.
    pub width_col: i64,

    /// Leftmost column of the hole.
    pub origin_col: i64,

    /// Row of the hole's leading edge.
    pub origin_row: i64,

    /// Row of the hole's trailing edge. Always greater than `origin_row`.
    pub off_time: i64,

    /// MIDI key the tracker-bar position maps to. Control and unused
    /// positions may carry values outside 0-127.
    pub midi_key: i64,

    /// Set for holes parsed inside the bad-holes section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<HoleCategory>,

    /// Performance velocity (2-127), attached by the MIDI aligner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<u8>,
}

impl HoleRecord {
    /// Creates an uncategorised hole without velocity.
    pub fn new(
        width_col: i64,
        origin_col: i64,
        origin_row: i64,
        off_time: i64,
        midi_key: i64,
    ) -> Self {
        Self {
            width_col,
            origin_col,
            origin_row,
            off_time,
            midi_key,
            category: None,
            velocity: None,
        }
    }

    /// Length of the hole along the roll, in rows.
    pub fn duration(&self) -> i64 {
        self.off_time - self.origin_row
    }

    /// Performance tick of the hole's leading edge, given the row of the
    /// roll's first musical hole.
    pub fn tick(&self, first_hole_row: i64) -> i64 {
        self.origin_row - first_hole_row
    }

    /// Attaches a velocity. Values of 0 and 1 are not real attack
    /// velocities and are ignored.
    pub fn set_velocity(&mut self, velocity: u8) {
        if velocity > 1 {
            self.velocity = Some(velocity.min(127));
        }
    }

    pub fn is_flagged(&self) -> bool {
        self.category == Some(HoleCategory::Flagged)
    }
}

/// Roll-level values read from a report header. Values are kept as the
/// report wrote them, minus the pixel suffix, and are merged verbatim into
/// the roll document under their report key names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollFields {
    #[serde(rename = "AVG_HOLE_WIDTH", default, skip_serializing_if = "Option::is_none")]
    pub avg_hole_width: Option<String>,

    #[serde(rename = "FIRST_HOLE", default, skip_serializing_if = "Option::is_none")]
    pub first_hole: Option<String>,

    #[serde(rename = "IMAGE_WIDTH", default, skip_serializing_if = "Option::is_none")]
    pub image_width: Option<String>,

    #[serde(rename = "IMAGE_LENGTH", default, skip_serializing_if = "Option::is_none")]
    pub image_length: Option<String>,
}

impl RollFields {
    /// Report keys collected into roll fields. Any other header key is ignored.
    pub const KEYS: [&'static str; 4] =
        ["AVG_HOLE_WIDTH", "FIRST_HOLE", "IMAGE_WIDTH", "IMAGE_LENGTH"];

    /// Stores a value under its report key. Returns false for keys that
    /// aren't roll fields.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> bool {
        let slot = match key {
            "AVG_HOLE_WIDTH" => &mut self.avg_hole_width,
            "FIRST_HOLE" => &mut self.first_hole,
            "IMAGE_WIDTH" => &mut self.image_width,
            "IMAGE_LENGTH" => &mut self.image_length,
            _ => return false,
        };
        *slot = Some(value.into());
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "AVG_HOLE_WIDTH" => self.avg_hole_width.as_deref(),
            "FIRST_HOLE" => self.first_hole.as_deref(),
            "IMAGE_WIDTH" => self.image_width.as_deref(),
            "IMAGE_LENGTH" => self.image_length.as_deref(),
            _ => None,
        }
    }

    /// Row of the first musical hole, which is tick 0 of the performance MIDI.
    pub fn first_hole_row(&self) -> Option<i64> {
        self.first_hole.as_deref()?.trim().parse().ok()
    }

    pub fn is_empty(&self) -> bool {
        Self::KEYS.iter().all(|key| self.get(key).is_none())
    }
}
