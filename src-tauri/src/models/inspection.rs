use chrono::{DateTime, Utc};
use serde::{ser::SerializeStruct, Deserialize, Serialize, Serializer};

use super::EncodedImage;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Verdict {
    Normal,
    Defective,
    #[serde(rename = "Not a bearing")]
    NotABearing,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Normal => "Normal",
            Verdict::Defective => "Defective",
            Verdict::NotABearing => "Not a bearing",
        }
    }
}

/// Defect location as percentages of the image extent, origin top-left.
///
/// Values are not clamped: a box may extend past the image edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|value| value.is_finite())
    }
}

/// A detection confidence in `[0, 1]`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, PartialOrd)]
#[serde(transparent)]
pub struct Confidence(f64);

impl Confidence {
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && (0.0..=1.0).contains(&value)).then_some(Self(value))
    }

    /// For values produced locally from ranges already inside `[0, 1]`.
    pub fn clamped(value: f64) -> Self {
        if value.is_finite() {
            Self(value.clamp(0.0, 1.0))
        } else {
            Self(0.0)
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn percent(&self) -> f64 {
        self.0 * 100.0
    }
}

/// The classification together with the fields that only exist for it.
#[derive(Debug, Clone, PartialEq)]
pub enum Finding {
    Normal,
    Defective {
        defect_type: String,
        bounding_box: Option<BoundingBox>,
    },
    NotABearing,
}

impl Finding {
    pub fn verdict(&self) -> Verdict {
        match self {
            Finding::Normal => Verdict::Normal,
            Finding::Defective { .. } => Verdict::Defective,
            Finding::NotABearing => Verdict::NotABearing,
        }
    }

    pub fn defect_type(&self) -> Option<&str> {
        match self {
            Finding::Defective { defect_type, .. } => Some(defect_type),
            _ => None,
        }
    }

    pub fn bounding_box(&self) -> Option<&BoundingBox> {
        match self {
            Finding::Defective { bounding_box, .. } => bounding_box.as_ref(),
            _ => None,
        }
    }
}

/// What a strategy hands back for one image, before it becomes a record.
#[derive(Debug, Clone, PartialEq)]
pub struct InspectionOutcome {
    pub finding: Finding,
    pub confidence: Option<Confidence>,
    pub description: Option<String>,
}

impl InspectionOutcome {
    pub fn new(finding: Finding) -> Self {
        Self {
            finding,
            confidence: None,
            description: None,
        }
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Blank descriptions are dropped.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        self
    }

    pub fn verdict(&self) -> Verdict {
        self.finding.verdict()
    }
}

/// One completed inspection. Immutable once minted by the inspection log.
#[derive(Debug, Clone, PartialEq)]
pub struct InspectionRecord {
    id: String,
    sequence: u64,
    image: EncodedImage,
    outcome: InspectionOutcome,
    timestamp: DateTime<Utc>,
}

impl InspectionRecord {
    pub(crate) fn new(
        sequence: u64,
        image: EncodedImage,
        outcome: InspectionOutcome,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: format!("ins_{}-{}", timestamp.timestamp_millis(), sequence),
            sequence,
            image,
            outcome,
            timestamp,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn image(&self) -> &EncodedImage {
        &self.image
    }

    pub fn outcome(&self) -> &InspectionOutcome {
        &self.outcome
    }

    pub fn verdict(&self) -> Verdict {
        self.outcome.verdict()
    }

    pub fn defect_type(&self) -> Option<&str> {
        self.outcome.finding.defect_type()
    }

    pub fn bounding_box(&self) -> Option<&BoundingBox> {
        self.outcome.finding.bounding_box()
    }

    pub fn confidence(&self) -> Option<Confidence> {
        self.outcome.confidence
    }

    pub fn description(&self) -> Option<&str> {
        self.outcome.description.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

// Flattened to the shape the frontend already renders: absent fields are
// omitted rather than sent as null.
impl Serialize for InspectionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("InspectionRecord", 8)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("sequence", &self.sequence)?;
        state.serialize_field("image", &self.image)?;
        state.serialize_field("result", &self.verdict())?;
        match self.defect_type() {
            Some(defect_type) => state.serialize_field("defectType", defect_type)?,
            None => state.skip_field("defectType")?,
        }
        match self.confidence() {
            Some(confidence) => state.serialize_field("confidence", &confidence)?,
            None => state.skip_field("confidence")?,
        }
        match self.bounding_box() {
            Some(bounding_box) => state.serialize_field("boundingBox", bounding_box)?,
            None => state.skip_field("boundingBox")?,
        }
        match self.description() {
            Some(description) => state.serialize_field("description", description)?,
            None => state.skip_field("description")?,
        }
        state.serialize_field("timestamp", &self.timestamp.to_rfc3339())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_image() -> EncodedImage {
        EncodedImage::new("image/png", vec![1, 2, 3])
    }

    #[test]
    fn confidence_rejects_values_outside_unit_interval() {
        assert!(Confidence::new(0.0).is_some());
        assert!(Confidence::new(1.0).is_some());
        assert!(Confidence::new(-0.01).is_none());
        assert!(Confidence::new(1.2).is_none());
        assert!(Confidence::new(f64::NAN).is_none());
    }

    #[test]
    fn verdict_uses_display_names_on_the_wire() {
        assert_eq!(serde_json::to_value(Verdict::NotABearing).unwrap(), json!("Not a bearing"));
        let parsed: Verdict = serde_json::from_value(json!("Defective")).unwrap();
        assert_eq!(parsed, Verdict::Defective);
    }

    #[test]
    fn defective_record_serializes_all_defect_fields() {
        let outcome = InspectionOutcome::new(Finding::Defective {
            defect_type: "Tear".into(),
            bounding_box: Some(BoundingBox { x: 10.0, y: 20.0, width: 30.0, height: 40.0 }),
        })
        .with_confidence(Confidence::new(0.85).unwrap())
        .with_description(Some("Edge tear detected near seal.".into()));

        let timestamp = Utc::now();
        let record = InspectionRecord::new(7, sample_image(), outcome, timestamp);
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["result"], "Defective");
        assert_eq!(value["defectType"], "Tear");
        assert_eq!(value["confidence"], 0.85);
        assert_eq!(value["boundingBox"]["width"], 30.0);
        assert_eq!(value["description"], "Edge tear detected near seal.");
        assert_eq!(value["image"], "data:image/png;base64,AQID");
        assert_eq!(value["id"], format!("ins_{}-7", timestamp.timestamp_millis()));
    }

    #[test]
    fn not_a_bearing_record_omits_defect_fields() {
        let outcome = InspectionOutcome::new(Finding::NotABearing)
            .with_description(Some("Image shows a coffee mug.".into()));
        let record = InspectionRecord::new(1, sample_image(), outcome, Utc::now());
        let value = serde_json::to_value(&record).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(value["result"], "Not a bearing");
        assert!(!object.contains_key("defectType"));
        assert!(!object.contains_key("boundingBox"));
        assert!(!object.contains_key("confidence"));
        assert_eq!(value["description"], "Image shows a coffee mug.");
    }

    #[test]
    fn blank_description_is_treated_as_absent() {
        let outcome = InspectionOutcome::new(Finding::Normal).with_description(Some("   ".into()));
        assert_eq!(outcome.description, None);
    }
}
