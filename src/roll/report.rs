//! Hole-detection report parser.
//!
//! The report is line oriented. Scalar values are written as `@KEY: VALUE`
//! and sections are delimited by `@@BEGIN: NAME` / `@@END: NAME`. A report
//! looks like:
//!
//! ```text
//! @IMAGE_WIDTH:    3000px
//! @FIRST_HOLE:     512px
//! @@BEGIN: HOLES
//! @@BEGIN: HOLE
//! @NOTE_ATTACK:    600px
//! @ORIGIN_ROW:     600px
//! @OFF_TIME:       640px
//! ...
//! @@END: HOLE
//! @@END: HOLES
//! @@BEGIN: BADHOLES
//! ...
//! @@END: BADHOLES
//! @@BEGIN: TEARS
//! ```
//!
//! Header values are collected until the `HOLES` section starts. Holes are
//! then read from `HOLES` and from a `BADHOLES` section, whether it follows
//! `HOLES` or is nested in it. Scanning stops at the end of `BADHOLES`, at
//! the start of any other section (reports without `BADHOLES` go straight
//! to `TEARS`), or at the end of input.

use super::hole::{HoleCategory, HoleRecord, RollFields};
use crate::error::ReportError;
use tracing::debug;

const HOLES: &str = "HOLES";
const HOLE: &str = "HOLE";
const BADHOLES: &str = "BADHOLES";

/// Where the parser is in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportState {
    /// Before `@@BEGIN: HOLES`; roll fields are collected here.
    Header,
    /// Inside the `HOLES` section.
    InHoles,
    /// Between `@@END: HOLES` and a following `BADHOLES` section.
    AfterHoles,
    /// Inside the `BADHOLES` section; holes read here are flagged.
    InBadholes,
    /// Nothing more is read.
    Done,
}

impl ReportState {
    /// State after a `@@BEGIN:` marker for `section`.
    pub fn begin(self, section: &str) -> Self {
        match (self, section) {
            (ReportState::Header, HOLES) => ReportState::InHoles,
            (ReportState::Header, _) => ReportState::Header,
            (ReportState::InHoles | ReportState::InBadholes, HOLE) => self,
            (ReportState::InHoles | ReportState::AfterHoles, BADHOLES) => ReportState::InBadholes,
            (ReportState::Done, _) => ReportState::Done,
            // TEARS, or anything else, ends the hole listing
            _ => ReportState::Done,
        }
    }

    /// State after an `@@END:` marker for `section`.
    pub fn end(self, section: &str) -> Self {
        match (self, section) {
            (ReportState::InHoles, HOLES) => ReportState::AfterHoles,
            (ReportState::InBadholes, BADHOLES | HOLES) => ReportState::Done,
            _ => self,
        }
    }

    /// Whether hole records are read in this state.
    pub fn reads_holes(&self) -> bool {
        matches!(self, ReportState::InHoles | ReportState::InBadholes)
    }

    /// Category given to holes completed in this state.
    fn category(&self) -> Option<HoleCategory> {
        match self {
            ReportState::InBadholes => Some(HoleCategory::Flagged),
            _ => None,
        }
    }
}

/// Parsed contents of one report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HoleReport {
    pub fields: RollFields,
    /// Retained holes, in report order.
    pub holes: Vec<HoleRecord>,
    /// Hole records that were started but not retained.
    pub dropped: usize,
}

impl HoleReport {
    /// Total hole records encountered, retained or not.
    pub fn seen(&self) -> usize {
        self.holes.len() + self.dropped
    }
}

/// One classified report line.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Begin(&'a str),
    End(&'a str),
    Value { key: &'a str, value: &'a str },
    Other,
}

fn classify(line: &str) -> Line<'_> {
    let line = line.trim_end();
    if let Some(section) = line.strip_prefix("@@BEGIN:") {
        return Line::Begin(section.trim());
    }
    if let Some(section) = line.strip_prefix("@@END:") {
        return Line::End(section.trim());
    }
    let Some(rest) = line.strip_prefix('@') else {
        return Line::Other;
    };
    match rest.split_once(':') {
        Some((key, value))
            if !key.is_empty() && !key.contains(|c: char| c == '@' || c.is_whitespace()) =>
        {
            Line::Value {
                key,
                value: value.trim(),
            }
        }
        _ => Line::Other,
    }
}

/// Removes the pixel unit from a value, e.g. `"  512px "` becomes `"512"`.
fn strip_px(value: &str) -> &str {
    let value = value.trim();
    value.strip_suffix("px").unwrap_or(value).trim()
}

/// Hole fields as read so far, before the record is checked.
#[derive(Debug, Default)]
struct PendingHole {
    line: usize,
    note_attack: Option<i64>,
    width_col: Option<i64>,
    origin_col: Option<i64>,
    origin_row: Option<i64>,
    off_time: Option<i64>,
    midi_key: Option<i64>,
}

impl PendingHole {
    fn new(line: usize) -> Self {
        Self {
            line,
            ..Default::default()
        }
    }

    fn set(&mut self, key: &str, value: &str, line: usize) -> Result<(), ReportError> {
        let slot = match key {
            "NOTE_ATTACK" => &mut self.note_attack,
            "WIDTH_COL" => &mut self.width_col,
            "ORIGIN_COL" => &mut self.origin_col,
            "ORIGIN_ROW" => &mut self.origin_row,
            "OFF_TIME" => &mut self.off_time,
            "MIDI_KEY" => &mut self.midi_key,
            _ => return Ok(()),
        };
        let number = strip_px(value)
            .parse()
            .map_err(|_| ReportError::InvalidNumber {
                line,
                field: key.to_string(),
                value: value.to_string(),
            })?;
        *slot = Some(number);
        Ok(())
    }

    /// Checks the finished record. `Ok(None)` means the hole is dropped.
    fn finish(self, category: Option<HoleCategory>) -> Result<Option<HoleRecord>, ReportError> {
        let line = self.line;
        let Some(attack) = self.note_attack else {
            if self.off_time.is_some() {
                return Err(ReportError::UnexpectedOffTime { line });
            }
            return Ok(None);
        };
        let off_time = self.off_time.ok_or(ReportError::MissingOffTime { line })?;
        let origin_row = self.origin_row.ok_or(ReportError::MissingField {
            line,
            field: "ORIGIN_ROW",
        })?;
        if attack != origin_row {
            return Err(ReportError::AttackMismatch {
                line,
                attack,
                origin_row,
            });
        }
        if origin_row >= off_time {
            debug!(line, origin_row, off_time, "dropping hole with invalid duration");
            return Ok(None);
        }

        let require =
            |value: Option<i64>, field| value.ok_or(ReportError::MissingField { line, field });
        let mut hole = HoleRecord::new(
            require(self.width_col, "WIDTH_COL")?,
            require(self.origin_col, "ORIGIN_COL")?,
            origin_row,
            off_time,
            require(self.midi_key, "MIDI_KEY")?,
        );
        hole.category = category;
        Ok(Some(hole))
    }
}

/// Parses a hole report into roll fields and retained holes.
///
/// # Errors
///
/// Returns a [`ReportError`] when a hole record is structurally
/// inconsistent (attack row differing from origin row, attack without close
/// row and vice versa, missing geometry, non-numeric values) or when a hole
/// record end marker has no matching start. Holes whose close row does not
/// exceed their origin row are dropped and counted instead.
pub fn parse_hole_report(text: &str) -> Result<HoleReport, ReportError> {
    let mut report = HoleReport::default();
    let mut state = ReportState::Header;
    let mut pending: Option<PendingHole> = None;

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        match classify(raw) {
            Line::Begin(section) => {
                let next = state.begin(section);
                if section == HOLE
                    && next.reads_holes()
                    && pending.replace(PendingHole::new(line)).is_some()
                {
                    debug!(line, "hole record restarted before its end marker");
                    report.dropped += 1;
                }
                state = next;
            }
            Line::End(section) if section == HOLE && state.reads_holes() => {
                let hole = pending.take().ok_or(ReportError::UnbalancedHole {
                    line,
                    marker: "@@END: HOLE",
                })?;
                match hole.finish(state.category())? {
                    Some(hole) => report.holes.push(hole),
                    None => report.dropped += 1,
                }
            }
            Line::End(section) => state = state.end(section),
            Line::Value { key, value } => match state {
                ReportState::Header => {
                    report.fields.set(key, strip_px(value));
                }
                _ => {
                    if let Some(hole) = pending.as_mut() {
                        hole.set(key, value, line)?;
                    }
                }
            },
            Line::Other => {}
        }

        if state == ReportState::Done {
            break;
        }
    }

    if pending.is_some() {
        debug!("hole record left open at end of listing");
        report.dropped += 1;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hole_block(attack: i64, row: i64, off: i64, key: i64) -> String {
        format!(
            "@@BEGIN: HOLE\n@ORIGIN_ROW:\t{row}px\n@ORIGIN_COL:\t2px\n@WIDTH_COL:\t5px\n\
             @OFF_TIME:\t{off}px\n@NOTE_ATTACK:\t{attack}px\n@MIDI_KEY:\t{key}\n@@END: HOLE\n"
        )
    }

    fn report(header: &str, holes: &str, badholes: Option<&str>) -> String {
        let mut text = format!("{header}@@BEGIN: HOLES\n{holes}@@END: HOLES\n");
        if let Some(bad) = badholes {
            text.push_str(&format!("@@BEGIN: BADHOLES\n{bad}@@END: BADHOLES\n"));
        }
        text
    }

    #[test]
    fn test_classify_lines() {
        assert_eq!(classify("@@BEGIN: HOLES\n"), Line::Begin("HOLES"));
        assert_eq!(classify("@@END: HOLE\r\n"), Line::End("HOLE"));
        assert_eq!(
            classify("@FIRST_HOLE:\t 512px"),
            Line::Value {
                key: "FIRST_HOLE",
                value: "512px"
            }
        );
        assert_eq!(classify("@BAD KEY: 1"), Line::Other);
        assert_eq!(classify("plain text"), Line::Other);
    }

    #[test]
    fn test_state_transitions() {
        use ReportState::*;
        assert_eq!(Header.begin("TRACKER"), Header);
        assert_eq!(Header.begin("HOLES"), InHoles);
        assert_eq!(InHoles.begin("HOLE"), InHoles);
        assert_eq!(InHoles.end("HOLES"), AfterHoles);
        assert_eq!(AfterHoles.begin("BADHOLES"), InBadholes);
        assert_eq!(InHoles.begin("BADHOLES"), InBadholes);
        assert_eq!(InBadholes.end("BADHOLES"), Done);
        assert_eq!(AfterHoles.begin("TEARS"), Done);
        assert_eq!(InHoles.begin("TEARS"), Done);
        assert_eq!(Done.begin("HOLES"), Done);
    }

    #[test]
    fn test_header_fields_are_whitelisted_and_stripped() {
        let text = report(
            "@AVG_HOLE_WIDTH:  17.5px\n@FIRST_HOLE:\t512px\n@TRACKER_HOLES: 100\n@IMAGE_LENGTH:  40000px \n",
            "",
            None,
        );
        let parsed = parse_hole_report(&text).unwrap();
        assert_eq!(parsed.fields.avg_hole_width.as_deref(), Some("17.5"));
        assert_eq!(parsed.fields.first_hole.as_deref(), Some("512"));
        assert_eq!(parsed.fields.image_length.as_deref(), Some("40000"));
        assert_eq!(parsed.fields.image_width, None);
        assert!(parsed.holes.is_empty());
    }

    #[test]
    fn test_single_valid_hole() {
        let text = report("", &hole_block(100, 100, 150, 40), None);
        let parsed = parse_hole_report(&text).unwrap();
        assert_eq!(parsed.holes, vec![HoleRecord::new(5, 2, 100, 150, 40)]);
        assert_eq!(parsed.dropped, 0);
    }

    #[test]
    fn test_invalid_duration_is_dropped() {
        let holes = format!("{}{}", hole_block(200, 200, 150, 40), hole_block(300, 300, 300, 41));
        let parsed = parse_hole_report(&report("", &holes, None)).unwrap();
        assert!(parsed.holes.is_empty());
        assert_eq!(parsed.dropped, 2);
        assert_eq!(parsed.seen(), 2);
    }

    #[test]
    fn test_hole_without_attack_is_dropped() {
        let holes = "@@BEGIN: HOLE\n@ORIGIN_ROW: 10px\n@ORIGIN_COL: 1px\n@WIDTH_COL: 3px\n@@END: HOLE\n";
        let parsed = parse_hole_report(&report("", holes, None)).unwrap();
        assert!(parsed.holes.is_empty());
        assert_eq!(parsed.dropped, 1);
    }

    #[test]
    fn test_attack_mismatch_is_an_error() {
        let text = report("", &hole_block(101, 100, 150, 40), None);
        let err = parse_hole_report(&text).unwrap_err();
        assert_eq!(
            err,
            ReportError::AttackMismatch {
                line: 2,
                attack: 101,
                origin_row: 100
            }
        );
    }

    #[test]
    fn test_off_time_without_attack_is_an_error() {
        let holes = "@@BEGIN: HOLE\n@ORIGIN_ROW: 10px\n@OFF_TIME: 20px\n@@END: HOLE\n";
        let err = parse_hole_report(&report("", holes, None)).unwrap_err();
        assert!(matches!(err, ReportError::UnexpectedOffTime { .. }));
    }

    #[test]
    fn test_non_numeric_value_is_an_error() {
        let holes = "@@BEGIN: HOLE\n@ORIGIN_ROW: tenpx\n@@END: HOLE\n";
        let err = parse_hole_report(&report("", holes, None)).unwrap_err();
        assert!(matches!(err, ReportError::InvalidNumber { line: 3, .. }));
    }

    #[test]
    fn test_badholes_are_flagged() {
        let text = report(
            "",
            &hole_block(100, 100, 150, 40),
            Some(&hole_block(200, 200, 260, 41)),
        );
        let parsed = parse_hole_report(&text).unwrap();
        assert_eq!(parsed.holes.len(), 2);
        assert_eq!(parsed.holes[0].category, None);
        assert_eq!(parsed.holes[1].category, Some(HoleCategory::Flagged));
        assert_eq!(parsed.holes[1].midi_key, 41);
    }

    #[test]
    fn test_nested_badholes_are_flagged() {
        let text = format!(
            "@@BEGIN: HOLES\n{}@@BEGIN: BADHOLES\n{}@@END: BADHOLES\n@@END: HOLES\n",
            hole_block(100, 100, 150, 40),
            hole_block(200, 200, 260, 41)
        );
        let parsed = parse_hole_report(&text).unwrap();
        assert_eq!(parsed.holes.len(), 2);
        assert!(parsed.holes[1].is_flagged());
    }

    #[test]
    fn test_tears_stops_scanning_without_badholes() {
        let text = format!(
            "{}@@BEGIN: TEARS\n{}@@END: TEARS\n",
            report("", &hole_block(100, 100, 150, 40), None),
            hole_block(500, 500, 600, 50)
        );
        let parsed = parse_hole_report(&text).unwrap();
        assert_eq!(parsed.holes.len(), 1);
        assert_eq!(parsed.holes[0].midi_key, 40);
    }

    #[test]
    fn test_nothing_after_badholes_is_read() {
        let text = format!(
            "{}@@BEGIN: HOLE\n@NOTE_ATTACK: 1\n@@END: HOLE\n",
            report("", "", Some(&hole_block(100, 100, 150, 40)))
        );
        let parsed = parse_hole_report(&text).unwrap();
        assert_eq!(parsed.holes.len(), 1);
        assert_eq!(parsed.dropped, 0);
    }

    #[test]
    fn test_retained_plus_dropped_equals_seen() {
        let holes: String = (0..10)
            .map(|i| {
                let row = 100 * i;
                let off = if i % 3 == 0 { row } else { row + 40 };
                hole_block(row, row, off, 30 + i)
            })
            .collect();
        let parsed = parse_hole_report(&report("", &holes, None)).unwrap();
        assert_eq!(parsed.seen(), 10);
        assert_eq!(parsed.dropped, 4);
        assert!(parsed.holes.iter().all(|h| h.origin_row < h.off_time));
    }

    #[test]
    fn test_report_order_is_preserved() {
        let holes = format!("{}{}", hole_block(300, 300, 350, 40), hole_block(100, 100, 150, 41));
        let parsed = parse_hole_report(&report("", &holes, None)).unwrap();
        let rows: Vec<_> = parsed.holes.iter().map(|h| h.origin_row).collect();
        assert_eq!(rows, vec![300, 100]);
    }

    #[test]
    fn test_restarted_hole_is_dropped() {
        let text = format!(
            "@@BEGIN: HOLES\n@@BEGIN: HOLE\n@ORIGIN_ROW: 5px\n{}@@END: HOLES\n",
            hole_block(100, 100, 150, 40)
        );
        let parsed = parse_hole_report(&text).unwrap();
        assert_eq!(parsed.holes.len(), 1);
        assert_eq!(parsed.holes[0].origin_row, 100);
        assert_eq!(parsed.dropped, 1);
        assert_eq!(parsed.seen(), 2);
    }

    #[test]
    fn test_hole_open_at_tears_is_dropped() {
        let text = format!(
            "@@BEGIN: HOLES\n@@BEGIN: HOLE\n@ORIGIN_ROW: 5px\n{}\
             @@BEGIN: HOLE\n@NOTE_ATTACK: 300px\n@@BEGIN: TEARS\n{}",
            hole_block(100, 100, 150, 40),
            hole_block(500, 500, 600, 50)
        );
        let parsed = parse_hole_report(&text).unwrap();
        assert_eq!(parsed.holes.len(), 1);
        assert_eq!(parsed.dropped, 2);
        assert_eq!(parsed.seen(), 3);
    }

    #[test]
    fn test_hole_open_at_end_of_input_is_dropped() {
        let text = format!(
            "@@BEGIN: HOLES\n{}@@BEGIN: HOLE\n@NOTE_ATTACK: 300px\n@ORIGIN_ROW: 300px\n",
            hole_block(100, 100, 150, 40)
        );
        let parsed = parse_hole_report(&text).unwrap();
        assert_eq!(parsed.holes.len(), 1);
        assert_eq!(parsed.dropped, 1);
        assert_eq!(parsed.seen(), 2);
    }

    #[test]
    fn test_stray_end_marker_is_an_error() {
        let err = parse_hole_report("@@BEGIN: HOLES\n@@END: HOLE\n@@END: HOLES\n").unwrap_err();
        assert_eq!(
            err,
            ReportError::UnbalancedHole {
                line: 2,
                marker: "@@END: HOLE"
            }
        );
    }

    #[test]
    fn test_end_marker_after_closed_hole_is_an_error() {
        let text = format!(
            "@@BEGIN: HOLES\n{}@@END: HOLE\n@@END: HOLES\n",
            hole_block(100, 100, 150, 40)
        );
        let err = parse_hole_report(&text).unwrap_err();
        assert!(matches!(err, ReportError::UnbalancedHole { line: 10, .. }));
    }

    #[test]
    fn test_empty_input() {
        let parsed = parse_hole_report("").unwrap();
        assert!(parsed.fields.is_empty());
        assert!(parsed.holes.is_empty());
    }
}
