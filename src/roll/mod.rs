//! Roll domain types and the hole-report processing stages.
//!
//! A roll arrives as a hole-detection text report. The report parser turns
//! it into roll-level fields and hole records, the MIDI aligner enriches the
//! holes with velocities, the profile checker produces a diagnostic and the
//! encoder shrinks the holes for storage.

mod encode;
mod hole;
mod profile;
mod report;

pub use encode::{encode_holes, EncodedHole};
pub use hole::{HoleCategory, HoleRecord, RollFields};
pub use profile::{check_profile, ProfileReport, RollProfile, Severity};
pub use report::{parse_hole_report, HoleReport, ReportState};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mechanical roll type, as classified from the roll's catalog record.
///
/// The type selects the MIDI track layout used for velocity alignment and
/// the tracker-bar profile used by the diagnostic checker.
///
/// Deserializing accepts both short tags and raw catalog labels; anything
/// unrecognised becomes [`RollType::Unknown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum RollType {
    #[serde(rename = "88-note")]
    Standard88,
    #[serde(rename = "65-note")]
    Standard65,
    #[serde(rename = "welte-red")]
    WelteRed,
    #[serde(rename = "welte-green")]
    WelteGreen,
    #[serde(rename = "welte-licensee")]
    WelteLicensee,
    #[serde(rename = "duo-art")]
    DuoArt,
    #[default]
    #[serde(rename = "NA")]
    Unknown,
}

/// Raw catalog labels and the roll type each one denotes.
///
/// Labels arrive with and without trailing periods, so both spellings are
/// listed where the catalog has been seen to use them.
const ROLL_TYPE_LABELS: &[(&str, RollType)] = &[
    ("Welte-Mignon red roll (T-100)", RollType::WelteRed),
    ("Welte-Mignon red roll (T-100).", RollType::WelteRed),
    ("Welte-Mignon red roll (T-100)..", RollType::WelteRed),
    ("Scale: 88n", RollType::Standard88),
    ("Scale: 88n.", RollType::Standard88),
    ("Scale: 65n.", RollType::Standard65),
    ("88n", RollType::Standard88),
    ("65n", RollType::Standard65),
    ("standard", RollType::Standard88),
    ("non-reproducing", RollType::Standard88),
    ("Welte-Mignon green roll (T-98)", RollType::WelteGreen),
    ("Welte-Mignon green roll (T-98).", RollType::WelteGreen),
    ("Welte-Mignon licensee roll", RollType::WelteLicensee),
    ("Welte-Mignon licensee roll.", RollType::WelteLicensee),
    ("Welte-Mignon licensee roll (T-98).", RollType::WelteLicensee),
    ("Duo-Art piano rolls", RollType::DuoArt),
    ("Duo-Art piano rolls.", RollType::DuoArt),
];

impl RollType {
    /// All classified roll types, in catalog order.
    pub const ALL: [RollType; 6] = [
        RollType::Standard88,
        RollType::Standard65,
        RollType::WelteRed,
        RollType::WelteGreen,
        RollType::WelteLicensee,
        RollType::DuoArt,
    ];

    /// Returns the short tag used in output documents ("welte-red", ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            RollType::Standard88 => "88-note",
            RollType::Standard65 => "65-note",
            RollType::WelteRed => "welte-red",
            RollType::WelteGreen => "welte-green",
            RollType::WelteLicensee => "welte-licensee",
            RollType::DuoArt => "duo-art",
            RollType::Unknown => "NA",
        }
    }

    /// Parses a short tag. Returns None for anything that isn't one.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == tag)
    }

    /// Classifies a catalog label or a short tag.
    ///
    /// # Examples
    ///
    /// ```
    /// use rollcast::roll::RollType;
    ///
    /// assert_eq!(RollType::from_label("Scale: 65n."), RollType::Standard65);
    /// assert_eq!(RollType::from_label("welte-red"), RollType::WelteRed);
    /// assert_eq!(RollType::from_label("cylinder"), RollType::Unknown);
    /// ```
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        ROLL_TYPE_LABELS
            .iter()
            .find(|(known, _)| *known == label)
            .map(|(_, roll_type)| *roll_type)
            .or_else(|| Self::from_tag(label))
            .unwrap_or(RollType::Unknown)
    }

    /// Reduced-scale rolls carry a single note track in their performance MIDI.
    pub fn is_reduced_scale(&self) -> bool {
        matches!(self, RollType::Standard65)
    }
}

impl From<String> for RollType {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl fmt::Display for RollType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
