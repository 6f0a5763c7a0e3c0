//! Roll metadata and the catalog of processed rolls.
//!
//! Metadata for each roll is extracted from the library's bibliographic
//! records by a separate tool and handed over as a JSON object. Only the
//! fields the catalog needs are named here; everything else is carried into
//! the roll document untouched. Named fields that are unset are written as
//! `null`, the way the extractor writes them.

use crate::roll::RollType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Bibliographic metadata for one roll.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RollMetadata {
    #[serde(default)]
    pub title: String,

    /// Composer/performer summary used by the viewer's search bar.
    #[serde(default)]
    pub searchtitle: Option<String>,

    #[serde(default)]
    pub composer: Option<String>,

    #[serde(default)]
    pub performer: Option<String>,

    #[serde(default)]
    pub arranger: Option<String>,

    /// Work title, when it differs from the display title.
    #[serde(default)]
    pub work: Option<String>,

    #[serde(default)]
    pub image_url: Option<String>,

    #[serde(rename = "type", default)]
    pub roll_type: RollType,

    #[serde(default)]
    pub number: Option<String>,

    #[serde(default)]
    pub publisher: Option<String>,

    /// Any other fields, passed through to the roll document.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RollMetadata {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Title shown in the catalog: the search title when there is one.
    pub fn display_title(&self) -> &str {
        self.searchtitle.as_deref().unwrap_or(&self.title)
    }
}

/// One catalog row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub druid: String,
    pub title: String,
    pub composer: String,
    pub performer: String,
    pub arranger: String,
    pub work: String,
    pub image_url: String,
    #[serde(rename = "type")]
    pub roll_type: RollType,
    pub number: String,
    pub publisher: String,
}

impl CatalogEntry {
    pub fn new(id: &str, metadata: &RollMetadata) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            druid: id.to_string(),
            title: metadata.display_title().to_string(),
            composer: text(&metadata.composer),
            performer: text(&metadata.performer),
            arranger: text(&metadata.arranger),
            work: metadata.work.clone().unwrap_or_else(|| metadata.title.clone()),
            image_url: text(&metadata.image_url),
            roll_type: metadata.roll_type,
            number: metadata.number.clone().unwrap_or_else(|| "----".to_string()),
            publisher: text(&metadata.publisher),
        }
    }
}

/// Accumulates entries over a batch.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: CatalogEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by title. Rolls with equal titles keep batch order.
    pub fn sorted(&self) -> Vec<&CatalogEntry> {
        let mut sorted: Vec<_> = self.entries.iter().collect();
        sorted.sort_by(|a, b| a.title.cmp(&b.title));
        sorted
    }

    /// Renders the catalog as pretty-printed JSON with keys in sorted order
    /// and a trailing newline.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        // serde_json's Map is ordered by key, which sorts each entry's fields
        let value = serde_json::to_value(self.sorted())?;
        let mut json = serde_json::to_string_pretty(&value)?;
        json.push('\n');
        Ok(json)
    }
}
