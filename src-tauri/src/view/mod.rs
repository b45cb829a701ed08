//! View-models the webview renders as-is.

pub mod badge;

use chrono::Local;
use serde::Serialize;

use crate::models::{BoundingBox, Confidence, InspectionRecord};

pub use badge::{badge_for, Badge, BadgeIcon, BadgeVariant};

const NOT_AVAILABLE: &str = "N/A";
const EMPTY_HISTORY: &str = "No inspections yet.";
const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `0.85` → `"85.0%"`.
pub fn format_confidence(confidence: Confidence) -> String {
    format!("{:.1}%", confidence.percent())
}

/// Defect overlay as CSS percentages, positioned over the displayed image.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OverlayRect {
    pub left: String,
    pub top: String,
    pub width: String,
    pub height: String,
}

impl From<&BoundingBox> for OverlayRect {
    fn from(bounding_box: &BoundingBox) -> Self {
        let percent = |value: f64| format!("{value}%");
        Self {
            left: percent(bounding_box.x),
            top: percent(bounding_box.y),
            width: percent(bounding_box.width),
            height: percent(bounding_box.height),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResultView {
    pub id: String,
    pub image: String,
    pub badge: Badge,
    pub analyzed_at: String,
    pub analyzed_at_display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defect_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay: Option<OverlayRect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ResultView {
    pub fn from_record(record: &InspectionRecord) -> Self {
        Self {
            id: record.id().to_string(),
            image: record.image().to_data_uri(),
            badge: badge_for(record.verdict()),
            analyzed_at: record.timestamp().to_rfc3339(),
            analyzed_at_display: display_time(record),
            defect_type: record.defect_type().map(str::to_string),
            confidence: record.confidence().map(format_confidence),
            overlay: record.bounding_box().map(OverlayRect::from),
            description: record.description().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRow {
    pub id: String,
    pub thumbnail: String,
    pub badge: Badge,
    pub confidence: String,
    pub timestamp: String,
    pub defect_type: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HistoryView {
    Empty { message: &'static str },
    Rows { rows: Vec<HistoryRow> },
}

impl HistoryView {
    /// `records` newest first, as the inspection log returns them.
    pub fn from_records(records: &[InspectionRecord]) -> Self {
        if records.is_empty() {
            return HistoryView::Empty {
                message: EMPTY_HISTORY,
            };
        }

        let rows = records
            .iter()
            .map(|record| HistoryRow {
                id: record.id().to_string(),
                thumbnail: record.image().to_data_uri(),
                badge: badge_for(record.verdict()),
                confidence: record
                    .confidence()
                    .map(format_confidence)
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                timestamp: display_time(record),
                defect_type: record
                    .defect_type()
                    .unwrap_or(NOT_AVAILABLE)
                    .to_string(),
            })
            .collect();
        HistoryView::Rows { rows }
    }
}

fn display_time(record: &InspectionRecord) -> String {
    record
        .timestamp()
        .with_timezone(&Local)
        .format(DISPLAY_TIME_FORMAT)
        .to_string()
}
