//! Compact hole encoding for roll documents.
//!
//! A roll can carry tens of thousands of holes, so the stored form uses
//! one-letter keys and leaves out optional values that aren't set.

use super::hole::{HoleCategory, HoleRecord};
use serde::{Deserialize, Serialize};

/// Stored form of a [`HoleRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedHole {
    /// Leftmost column.
    pub x: i64,
    /// Leading-edge row.
    pub y: i64,
    /// Width in columns.
    pub w: i64,
    /// Length in rows.
    pub h: i64,
    /// MIDI key.
    pub m: i64,
    /// Velocity, when the performance MIDI has one for this hole.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<u8>,
    /// Category, when the hole has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c: Option<HoleCategory>,
}

impl From<&HoleRecord> for EncodedHole {
    fn from(hole: &HoleRecord) -> Self {
        Self {
            x: hole.origin_col,
            y: hole.origin_row,
            w: hole.width_col,
            h: hole.duration(),
            m: hole.midi_key,
            v: hole.velocity.filter(|v| *v > 1),
            c: hole.category,
        }
    }
}

/// Encodes holes in order.
pub fn encode_holes(holes: &[HoleRecord]) -> Vec<EncodedHole> {
    holes.iter().map(EncodedHole::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_hole_has_no_optional_keys() {
        let encoded = encode_holes(&[HoleRecord::new(5, 2, 100, 150, 40)]);
        assert_eq!(
            serde_json::to_value(&encoded).unwrap(),
            json!([{"x": 2, "y": 100, "w": 5, "h": 50, "m": 40}])
        );
    }

    #[test]
    fn test_velocity_and_category_are_encoded() {
        let mut hole = HoleRecord::new(5, 2, 100, 150, 40);
        hole.set_velocity(80);
        hole.category = Some(HoleCategory::Flagged);
        let value = serde_json::to_value(EncodedHole::from(&hole)).unwrap();
        assert_eq!(
            value,
            json!({"x": 2, "y": 100, "w": 5, "h": 50, "m": 40, "v": 80, "c": "flagged"})
        );
    }

    #[test]
    fn test_meaningless_velocity_is_never_encoded() {
        let mut hole = HoleRecord::new(5, 2, 100, 150, 40);
        hole.velocity = Some(1);
        let encoded = EncodedHole::from(&hole);
        assert_eq!(encoded.v, None);
        let value = serde_json::to_value(encoded).unwrap();
        assert!(value.get("v").is_none());
    }

    #[test]
    fn test_only_flagged_holes_carry_a_category() {
        let report = crate::roll::parse_hole_report(
            "@@BEGIN: HOLES\n@@BEGIN: HOLE\n@NOTE_ATTACK: 100px\n@ORIGIN_ROW: 100px\n\
             @ORIGIN_COL: 2px\n@WIDTH_COL: 5px\n@OFF_TIME: 150px\n@MIDI_KEY: 40\n@@END: HOLE\n\
             @@END: HOLES\n",
        )
        .unwrap();
        let value = serde_json::to_value(encode_holes(&report.holes)).unwrap();
        assert_eq!(value, json!([{"x": 2, "y": 100, "w": 5, "h": 50, "m": 40}]));
        assert_eq!(HoleCategory::Flagged.as_str(), "flagged");
    }

    #[test]
    fn test_order_is_preserved() {
        let holes = vec![
            HoleRecord::new(5, 2, 300, 350, 40),
            HoleRecord::new(5, 9, 100, 120, 52),
        ];
        let ys: Vec<_> = encode_holes(&holes).iter().map(|h| h.y).collect();
        assert_eq!(ys, vec![300, 100]);
    }
}
