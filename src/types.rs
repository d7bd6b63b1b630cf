use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConvertError, Result};

// Placeholder used in log lines when a record carries no `ID`
const UNKNOWN_RECORD_ID: &str = "<no id>";

// One exported item of a Labelbox JSON export
#[derive(Debug, Clone, Deserialize)]
pub struct SourceRecord {
    #[serde(rename = "ID", default)]
    pub id: Option<String>,
    #[serde(rename = "External ID", default)]
    pub external_id: Option<String>,
    #[serde(rename = "Labeled Data", default)]
    pub labeled_data: Option<String>,
    #[serde(rename = "Project Name", default)]
    pub project_name: Option<String>,
    #[serde(rename = "Created By", default)]
    pub created_by: Option<String>,
    #[serde(rename = "Label", default)]
    pub label: Label,
}

impl SourceRecord {
    /// Identifier used when reporting problems with this record
    pub fn display_id(&self) -> &str {
        self.id
            .as_deref()
            .or(self.external_id.as_deref())
            .unwrap_or(UNKNOWN_RECORD_ID)
    }

    /// The image reference, trimmed of surrounding whitespace
    pub fn image_reference(&self) -> Result<&str> {
        match self.external_id.as_deref().map(str::trim) {
            Some(reference) if !reference.is_empty() => Ok(reference),
            _ => Err(ConvertError::MissingField {
                record: self.display_id().to_string(),
                field: "External ID",
            }),
        }
    }
}

/// Label payload of a record.
///
/// Labelbox writes `"Skip"`, `{}`, `""` or nothing at all for items that were
/// never labeled, so anything other than an object with an `objects` list is
/// treated as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Label {
    Present(Vec<SourceObject>),
    #[default]
    Absent,
}

impl Label {
    pub fn objects(&self) -> Option<&[SourceObject]> {
        match self {
            Label::Present(objects) => Some(objects),
            Label::Absent => None,
        }
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Object(mut map) => match map.remove("objects") {
                Some(Value::Array(objects)) => Ok(Label::Present(
                    objects.into_iter().map(SourceObject::from_value).collect(),
                )),
                _ => Ok(Label::Absent),
            },
            _ => Ok(Label::Absent),
        }
    }
}

/// A single labeled object; only bounding-box tools carry `bbox`.
///
/// A title that is not a string reads as empty and a `bbox` of the wrong
/// shape reads as `None`, so one malformed object never rejects the export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceObject {
    #[serde(default, deserialize_with = "lenient_title")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_bbox")]
    pub bbox: Option<BoundingBox>,
}

impl SourceObject {
    fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or(SourceObject {
            title: String::new(),
            bbox: None,
        })
    }
}

fn lenient_title<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(title) => Ok(title),
        _ => Ok(String::new()),
    }
}

fn lenient_bbox<'de, D>(deserializer: D) -> std::result::Result<Option<BoundingBox>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(serde_json::from_value(Value::deserialize(deserializer)?).ok())
}

// Axis-aligned box anchored at its top-left corner, in image pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn is_valid(&self) -> bool {
        [self.left, self.top, self.width, self.height]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Run-scoped sink for per-record and per-object problems.
///
/// Every skipped record or object is logged here with its context and
/// counted, so the caller gets a summary of what did not make it into the
/// exported datasets.
#[derive(Debug, Default, Clone)]
pub struct ProcessingStats {
    pub total_records: usize,
    pub ingested_records: usize,
    pub train_records: usize,
    pub val_records: usize,
    pub skipped_unlabeled: usize,
    pub skipped_missing_field: usize,
    pub skipped_unreadable_image: usize,
    pub skipped_copy_failed: usize,
    pub skipped_unknown_category: usize,
    pub skipped_unsupported_geometry: usize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_total(&mut self) {
        self.total_records += 1;
    }

    pub fn increment_unlabeled(&mut self, record: &SourceRecord) {
        log::debug!("Skipping unlabeled record {}", record.display_id());
        self.skipped_unlabeled += 1;
    }

    /// Log a recovered error and count it under its kind
    pub fn record_skip(&mut self, error: &ConvertError, record: &SourceRecord) {
        match error {
            ConvertError::MissingField { .. } => {
                log::warn!("{}; skipping record: {:?}", error, record);
                self.skipped_missing_field += 1;
            }
            ConvertError::ImageUnreadable { .. } => {
                log::warn!("{}; skipping record", error);
                self.skipped_unreadable_image += 1;
            }
            ConvertError::CopyFailed { .. } => {
                log::warn!("record {}: {}; skipping record", record.display_id(), error);
                self.skipped_copy_failed += 1;
            }
            ConvertError::CategoryNotFound { .. } => {
                log::warn!("{}; skipping object", error);
                self.skipped_unknown_category += 1;
            }
            ConvertError::UnsupportedGeometry { .. } => {
                log::warn!("{}; skipping object", error);
                self.skipped_unsupported_geometry += 1;
            }
            other => log::error!("record {}: {}", record.display_id(), other),
        }
    }

    pub fn skipped_records(&self) -> usize {
        self.skipped_unlabeled
            + self.skipped_missing_field
            + self.skipped_unreadable_image
            + self.skipped_copy_failed
    }

    pub fn skipped_objects(&self) -> usize {
        self.skipped_unknown_category + self.skipped_unsupported_geometry
    }

    pub fn print_summary(&self) {
        log::info!("=== Processing Summary ===");
        log::info!("Total records read: {}", self.total_records);
        log::info!(
            "Ingested records: {} (train: {}, val: {})",
            self.ingested_records,
            self.train_records,
            self.val_records
        );
        log::info!("Skipped (no label): {}", self.skipped_unlabeled);
        log::info!("Skipped (missing field): {}", self.skipped_missing_field);
        log::info!(
            "Skipped (unreadable image): {}",
            self.skipped_unreadable_image
        );
        log::info!("Skipped (copy failed): {}", self.skipped_copy_failed);

        if self.skipped_objects() > 0 {
            log::warn!(
                "Dropped objects: {} (unknown category: {}, unsupported geometry: {})",
                self.skipped_objects(),
                self.skipped_unknown_category,
                self.skipped_unsupported_geometry
            );
        }
    }
}
