//! Roll-type plausibility check.
//!
//! Each mechanical roll type has a tracker bar with a fixed set of note and
//! control positions. Holes that land outside those positions, or a roll
//! that doesn't end on its rewind hole, usually mean the roll was
//! classified as the wrong type or the hole detector misread the scan. The
//! result is only logged; it never changes the roll document.

use super::hole::{HoleRecord, RollFields};
use super::RollType;
use std::fmt;
use std::ops::RangeInclusive;
use tracing::{info, warn};

/// Suspicious-hole ratio above which a roll gets a warning marker.
pub const WARN_RATIO: f64 = 0.01;

/// Suspicious-hole ratio above which a roll gets a double marker.
pub const ALERT_RATIO: f64 = 0.05;

/// Tracker-bar layout for one roll type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollProfile {
    /// MIDI keys no hole on this roll type should map to.
    pub suspicious: &'static [RangeInclusive<i64>],
    /// Keys of the rewind hole. Empty when the type has no rewind check.
    pub rewind: &'static [i64],
}

const STANDARD_88: RollProfile = RollProfile {
    suspicious: &[0..=15, 114..=127],
    rewind: &[],
};

const WELTE_RED: RollProfile = RollProfile {
    suspicious: &[0..=13, 114..=127],
    rewind: &[104, 14],
};

const WELTE_GREEN: RollProfile = RollProfile {
    suspicious: &[0..=15, 114..=127],
    rewind: &[16],
};

/// Profiles by roll type. Types not listed (65-note, Duo-Art) are not checked.
const PROFILES: &[(RollType, &RollProfile)] = &[
    (RollType::Standard88, &STANDARD_88),
    (RollType::WelteRed, &WELTE_RED),
    (RollType::WelteGreen, &WELTE_GREEN),
    (RollType::WelteLicensee, &WELTE_GREEN),
];

impl RollProfile {
    pub fn for_roll_type(roll_type: RollType) -> Option<&'static RollProfile> {
        PROFILES
            .iter()
            .find(|(t, _)| *t == roll_type)
            .map(|(_, profile)| *profile)
    }

    pub fn is_suspicious(&self, midi_key: i64) -> bool {
        self.suspicious.iter().any(|range| range.contains(&midi_key))
    }

    pub fn is_rewind(&self, midi_key: i64) -> bool {
        self.rewind.contains(&midi_key)
    }
}

/// Tier of the suspicious-hole ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Normal,
    Warning,
    Alert,
}

impl Severity {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > ALERT_RATIO {
            Severity::Alert
        } else if ratio > WARN_RATIO {
            Severity::Warning
        } else {
            Severity::Normal
        }
    }

    pub fn marker(&self) -> &'static str {
        match self {
            Severity::Normal => "",
            Severity::Warning => "!",
            Severity::Alert => "!!",
        }
    }
}

/// Diagnostic summary for one roll.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileReport {
    pub roll_type: RollType,
    pub total: usize,
    pub suspicious: usize,
    /// `suspicious / total`, or 0 for a roll without holes.
    pub ratio: f64,
    pub severity: Severity,
    /// Whether the last hole is the rewind hole; None when the type has no
    /// rewind check or the roll has no holes.
    pub rewind_found: Option<bool>,
    /// MIDI key of the last hole.
    pub last_hole_key: Option<i64>,
    /// Length in rows of the last hole.
    pub last_hole_duration: Option<i64>,
    /// Performance tick of the last hole, when the first-hole row is known.
    pub last_hole_tick: Option<i64>,
}

impl ProfileReport {
    /// Severity markers for the log line: the ratio tier followed by one
    /// more `!` when the rewind hole is missing.
    pub fn markers(&self) -> String {
        let mut markers = self.severity.marker().to_string();
        if self.rewind_found == Some(false) {
            markers.push('!');
        }
        markers
    }

    pub fn is_escalated(&self) -> bool {
        !self.markers().is_empty()
    }

    /// Writes the report to the log, as a warning when escalated.
    pub fn log(&self, id: &str) {
        if self.is_escalated() {
            warn!("{id}: {self}");
        } else {
            info!("{id}: {self}");
        }
    }
}

impl fmt::Display for ProfileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} roll, {} holes, {} suspicious ({:.2}%)",
            self.roll_type,
            self.total,
            self.suspicious,
            self.ratio * 100.0
        )?;
        match self.rewind_found {
            Some(true) => write!(f, ", ends on rewind hole")?,
            Some(false) => write!(
                f,
                ", rewind hole not found (last key {})",
                self.last_hole_key.unwrap_or_default()
            )?,
            None => {}
        }
        if let Some(duration) = self.last_hole_duration {
            write!(f, ", last hole {duration} rows")?;
        }
        if let Some(tick) = self.last_hole_tick {
            write!(f, " at tick {tick}")?;
        }
        let markers = self.markers();
        if !markers.is_empty() {
            write!(f, " {markers}")?;
        }
        Ok(())
    }
}

/// Checks a finished hole list against its roll type's tracker profile.
///
/// Returns None for roll types without a profile.
pub fn check_profile(
    holes: &[HoleRecord],
    fields: &RollFields,
    roll_type: RollType,
) -> Option<ProfileReport> {
    let profile = RollProfile::for_roll_type(roll_type)?;

    let total = holes.len();
    let suspicious = holes
        .iter()
        .filter(|hole| profile.is_suspicious(hole.midi_key))
        .count();
    let ratio = if total == 0 {
        0.0
    } else {
        suspicious as f64 / total as f64
    };

    // max_by_key keeps the later hole on ties, matching report order
    let last = holes.iter().max_by_key(|hole| hole.origin_row);
    let rewind_found = match last {
        Some(hole) if !profile.rewind.is_empty() => Some(profile.is_rewind(hole.midi_key)),
        _ => None,
    };
    let first_hole_row = fields.first_hole_row();

    Some(ProfileReport {
        roll_type,
        total,
        suspicious,
        ratio,
        severity: Severity::from_ratio(ratio),
        rewind_found,
        last_hole_key: last.map(|hole| hole.midi_key),
        last_hole_duration: last.map(HoleRecord::duration),
        last_hole_tick: last.zip(first_hole_row).map(|(hole, row)| hole.tick(row)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hole(row: i64, key: i64) -> HoleRecord {
        HoleRecord::new(10, 100, row, row + 30, key)
    }

    #[test]
    fn test_unprofiled_types_are_skipped() {
        let holes = vec![hole(0, 50)];
        let fields = RollFields::default();
        assert!(check_profile(&holes, &fields, RollType::Standard65).is_none());
        assert!(check_profile(&holes, &fields, RollType::DuoArt).is_none());
        assert!(check_profile(&holes, &fields, RollType::Unknown).is_none());
    }

    #[test]
    fn test_empty_roll_is_not_escalated() {
        let report = check_profile(&[], &RollFields::default(), RollType::WelteRed).unwrap();
        assert_eq!(report.total, 0);
        assert_eq!(report.ratio, 0.0);
        assert_eq!(report.severity, Severity::Normal);
        assert_eq!(report.rewind_found, None);
        assert!(!report.is_escalated());
    }

    #[test]
    fn test_severity_tiers() {
        assert_eq!(Severity::from_ratio(0.01), Severity::Normal);
        assert_eq!(Severity::from_ratio(0.02), Severity::Warning);
        assert_eq!(Severity::from_ratio(0.05), Severity::Warning);
        assert_eq!(Severity::from_ratio(0.051), Severity::Alert);
    }

    #[test]
    fn test_welte_red_rewind_found() {
        let holes = vec![hole(0, 50), hole(100, 60), hole(500, 104)];
        let report = check_profile(&holes, &RollFields::default(), RollType::WelteRed).unwrap();
        assert_eq!(report.rewind_found, Some(true));
        assert_eq!(report.markers(), "");
        assert_eq!(report.last_hole_duration, Some(30));
    }

    #[test]
    fn test_welte_red_missing_rewind_escalates() {
        // last by row, not by list position
        let holes = vec![hole(500, 60), hole(0, 104), hole(100, 14)];
        let mut fields = RollFields::default();
        fields.set("FIRST_HOLE", "200");
        let report = check_profile(&holes, &fields, RollType::WelteRed).unwrap();
        assert_eq!(report.rewind_found, Some(false));
        assert_eq!(report.last_hole_key, Some(60));
        assert_eq!(report.last_hole_tick, Some(300));
        assert_eq!(report.markers(), "!");
        assert!(report.to_string().contains("rewind hole not found"));
    }

    #[test]
    fn test_suspicious_ratio() {
        // 3 of 50 holes outside the tracker bar: 6%
        let mut holes: Vec<_> = (0..47).map(|i| hole(i * 10, 40 + (i % 20))).collect();
        holes.extend([hole(1000, 5), hole(1010, 120), hole(1020, 0)]);
        let report = check_profile(&holes, &RollFields::default(), RollType::Standard88).unwrap();
        assert_eq!(report.total, 50);
        assert_eq!(report.suspicious, 3);
        assert_eq!(report.severity, Severity::Alert);
        assert_eq!(report.rewind_found, None);
        assert_eq!(report.markers(), "!!");
    }

    #[test]
    fn test_licensee_shares_green_profile() {
        assert_eq!(
            RollProfile::for_roll_type(RollType::WelteLicensee),
            RollProfile::for_roll_type(RollType::WelteGreen)
        );
    }
}
