//! The model classifies the image itself.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::{
    model::{PromptRequest, StructuredModel},
    prompts, InspectError, InspectionStrategy, StrategyKind,
};
use crate::models::{BoundingBox, Confidence, EncodedImage, Finding, InspectionOutcome, Verdict};

const ENABLE_LOGS: bool = true;
use crate::{log_info, log_warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InspectBearingAnswer {
    is_bearing: bool,
    result: Verdict,
    #[serde(default)]
    defect_type: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    bounding_box: Option<BoundingBox>,
    #[serde(default)]
    description: Option<String>,
}

pub struct DirectInspection {
    model: Arc<dyn StructuredModel>,
}

impl DirectInspection {
    pub fn new(model: Arc<dyn StructuredModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl InspectionStrategy for DirectInspection {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Direct
    }

    async fn inspect(&self, image: &EncodedImage) -> Result<InspectionOutcome, InspectError> {
        let answer = self
            .model
            .generate(PromptRequest {
                name: prompts::INSPECT_BEARING_PROMPT,
                instruction: prompts::inspect_bearing_instruction(),
                image,
                response_schema: prompts::inspect_bearing_schema(),
            })
            .await?;

        let answer: InspectBearingAnswer = serde_json::from_value(answer)
            .map_err(|err| InspectError::validation(format!("inspection answer: {err}")))?;

        let outcome = validate(answer).inspect_err(|err| {
            log_warn!("rejected model answer: {}", err);
        })?;
        log_info!("model verdict {}", outcome.verdict().as_str());
        Ok(outcome)
    }
}

/// Checks the answer for consistency and keeps only the fields its verdict
/// allows.
fn validate(answer: InspectBearingAnswer) -> Result<InspectionOutcome, InspectError> {
    if !answer.is_bearing && answer.result != Verdict::NotABearing {
        return Err(InspectError::validation(format!(
            "isBearing is false but result is {}",
            answer.result.as_str()
        )));
    }

    let confidence = answer
        .confidence
        .map(|value| {
            Confidence::new(value).ok_or_else(|| {
                InspectError::validation(format!("confidence {value} is outside [0, 1]"))
            })
        })
        .transpose()?;

    let finding = match answer.result {
        Verdict::Normal => Finding::Normal,
        Verdict::NotABearing => Finding::NotABearing,
        Verdict::Defective => {
            let defect_type = answer
                .defect_type
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
                .ok_or_else(|| InspectError::validation("defective result without a defectType"))?;
            if let Some(bounding_box) = &answer.bounding_box {
                if !bounding_box.is_finite() {
                    return Err(InspectError::validation("boundingBox has non-finite values"));
                }
            }
            Finding::Defective {
                defect_type,
                bounding_box: answer.bounding_box,
            }
        }
    };

    let mut outcome = InspectionOutcome::new(finding).with_description(answer.description);
    outcome.confidence = confidence;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::ModelError;
    use assert_matches::assert_matches;
    use serde_json::{json, Value};

    struct ScriptedModel(Value);

    #[async_trait]
    impl StructuredModel for ScriptedModel {
        async fn generate(&self, request: PromptRequest<'_>) -> Result<Value, ModelError> {
            assert_eq!(request.name, prompts::INSPECT_BEARING_PROMPT);
            Ok(self.0.clone())
        }
    }

    async fn inspect(answer: Value) -> Result<InspectionOutcome, InspectError> {
        let strategy = DirectInspection::new(Arc::new(ScriptedModel(answer)));
        strategy
            .inspect(&EncodedImage::new("image/jpeg", vec![0xff, 0xd8]))
            .await
    }

    #[tokio::test]
    async fn not_a_bearing_answer_has_no_defect_fields() {
        let outcome = inspect(json!({ "isBearing": false, "result": "Not a bearing" }))
            .await
            .unwrap();

        assert_eq!(outcome.finding, Finding::NotABearing);
        assert_eq!(outcome.confidence, None);
        assert_eq!(outcome.description, None);
    }

    #[tokio::test]
    async fn defective_answer_keeps_location_and_confidence() {
        let outcome = inspect(json!({
            "isBearing": true,
            "result": "Defective",
            "defectType": "Corrosion",
            "confidence": 0.91,
            "boundingBox": { "x": 10, "y": 15.5, "width": 30, "height": 20 },
            "description": "Rust spots on the outer ring."
        }))
        .await
        .unwrap();

        assert_eq!(outcome.finding.defect_type(), Some("Corrosion"));
        assert_eq!(
            outcome.finding.bounding_box(),
            Some(&BoundingBox { x: 10.0, y: 15.5, width: 30.0, height: 20.0 })
        );
        assert_eq!(outcome.confidence, Confidence::new(0.91));
        assert_eq!(outcome.description.as_deref(), Some("Rust spots on the outer ring."));
    }

    #[tokio::test]
    async fn defective_answer_may_omit_its_location() {
        let outcome = inspect(json!({
            "isBearing": true,
            "result": "Defective",
            "defectType": "Crack"
        }))
        .await
        .unwrap();

        assert_eq!(
            outcome.finding,
            Finding::Defective {
                defect_type: "Crack".into(),
                bounding_box: None,
            }
        );
        assert_eq!(outcome.confidence, None);
    }

    #[tokio::test]
    async fn normal_answer_drops_stray_defect_fields() {
        let outcome = inspect(json!({
            "isBearing": true,
            "result": "Normal",
            "defectType": "None",
            "boundingBox": { "x": 0, "y": 0, "width": 0, "height": 0 }
        }))
        .await
        .unwrap();

        assert_eq!(outcome.finding, Finding::Normal);
        assert_eq!(outcome.finding.bounding_box(), None);
    }

    #[tokio::test]
    async fn contradictory_bearing_flag_is_rejected() {
        assert_matches!(
            inspect(json!({ "isBearing": false, "result": "Defective", "defectType": "Crack" })).await,
            Err(InspectError::Validation(_))
        );
    }

    #[tokio::test]
    async fn defective_without_type_is_rejected() {
        assert_matches!(
            inspect(json!({ "isBearing": true, "result": "Defective", "defectType": "  " })).await,
            Err(InspectError::Validation(_))
        );
    }

    #[tokio::test]
    async fn out_of_range_confidence_is_rejected() {
        assert_matches!(
            inspect(json!({
                "isBearing": true,
                "result": "Defective",
                "defectType": "Crack",
                "confidence": 87
            }))
            .await,
            Err(InspectError::Validation(_))
        );
    }

    #[tokio::test]
    async fn unknown_result_label_is_rejected() {
        assert_matches!(
            inspect(json!({ "isBearing": true, "result": "Maybe" })).await,
            Err(InspectError::Validation(_))
        );
    }
}
