//! Local defect synthesis with a model-written explanation.
//!
//! The classification is drawn locally; the hosted model is only asked to
//! describe a defect that was already chosen. The description never feeds
//! back into the verdict.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use serde::Deserialize;

use super::{
    model::{PromptRequest, StructuredModel},
    prompts, InspectError, InspectionStrategy, StrategyKind,
};
use crate::models::{BoundingBox, Confidence, EncodedImage, Finding, InspectionOutcome};

const ENABLE_LOGS: bool = true;
use crate::log_info;

pub const DEFECT_TYPES: [&str; 4] = ["Tear", "Misprint", "Seal Issue", "Contamination"];
pub const DEFECT_PROBABILITY: f64 = 0.7;

const DEFECTIVE_CONFIDENCE: (f64, f64) = (0.80, 0.99);
const NORMAL_CONFIDENCE: (f64, f64) = (0.90, 0.99);
const BOX_ORIGIN_MAX: f64 = 50.0;
const BOX_EXTENT: (f64, f64) = (20.0, 50.0);

#[derive(Debug, Clone, PartialEq)]
pub enum SyntheticVerdict {
    Normal {
        confidence: Confidence,
    },
    Defective {
        defect_type: String,
        confidence: Confidence,
        bounding_box: BoundingBox,
    },
}

pub trait VerdictSampler: Send + Sync {
    fn sample(&self) -> SyntheticVerdict;
}

/// [`VerdictSampler`] backed by a seedable RNG.
pub struct RandomSampler {
    rng: Mutex<StdRng>,
}

impl RandomSampler {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

fn draw_confidence(rng: &mut StdRng, (low, high): (f64, f64)) -> Confidence {
    Confidence::clamped(rng.gen_range(low..high))
}

impl VerdictSampler for RandomSampler {
    fn sample(&self) -> SyntheticVerdict {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);

        if !rng.gen_bool(DEFECT_PROBABILITY) {
            return SyntheticVerdict::Normal {
                confidence: draw_confidence(&mut rng, NORMAL_CONFIDENCE),
            };
        }

        let defect_type = DEFECT_TYPES
            .choose(&mut *rng)
            .copied()
            .unwrap_or(DEFECT_TYPES[0])
            .to_string();
        let confidence = draw_confidence(&mut rng, DEFECTIVE_CONFIDENCE);
        let bounding_box = BoundingBox {
            x: rng.gen_range(0.0..BOX_ORIGIN_MAX),
            y: rng.gen_range(0.0..BOX_ORIGIN_MAX),
            width: rng.gen_range(BOX_EXTENT.0..BOX_EXTENT.1),
            height: rng.gen_range(BOX_EXTENT.0..BOX_EXTENT.1),
        };

        SyntheticVerdict::Defective {
            defect_type,
            confidence,
            bounding_box,
        }
    }
}

#[derive(Deserialize)]
struct DescriptionAnswer {
    description: String,
}

pub struct SynthesizeThenDescribe {
    sampler: Box<dyn VerdictSampler>,
    model: Arc<dyn StructuredModel>,
}

impl SynthesizeThenDescribe {
    pub fn new(sampler: Box<dyn VerdictSampler>, model: Arc<dyn StructuredModel>) -> Self {
        Self { sampler, model }
    }
}

#[async_trait]
impl InspectionStrategy for SynthesizeThenDescribe {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Synthesize
    }

    async fn inspect(&self, image: &EncodedImage) -> Result<InspectionOutcome, InspectError> {
        match self.sampler.sample() {
            SyntheticVerdict::Normal { confidence } => {
                log_info!("synthesized Normal verdict confidence={:.3}", confidence.value());
                Ok(InspectionOutcome::new(Finding::Normal).with_confidence(confidence))
            }
            SyntheticVerdict::Defective {
                defect_type,
                confidence,
                bounding_box,
            } => {
                log_info!(
                    "synthesized Defective verdict type={} confidence={:.3}; requesting description",
                    defect_type,
                    confidence.value()
                );

                let answer = self
                    .model
                    .generate(PromptRequest {
                        name: prompts::DESCRIBE_DEFECT_PROMPT,
                        instruction: prompts::describe_defect_instruction(&defect_type, confidence),
                        image,
                        response_schema: prompts::describe_defect_schema(),
                    })
                    .await?;
                let answer: DescriptionAnswer = serde_json::from_value(answer).map_err(|err| {
                    InspectError::validation(format!("description answer: {err}"))
                })?;

                Ok(InspectionOutcome::new(Finding::Defective {
                    defect_type,
                    bounding_box: Some(bounding_box),
                })
                .with_confidence(confidence)
                .with_description(Some(answer.description)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::ModelError;
    use assert_matches::assert_matches;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedSampler(SyntheticVerdict);

    impl VerdictSampler for FixedSampler {
        fn sample(&self) -> SyntheticVerdict {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct CountingModel {
        answer: Option<Value>,
        calls: AtomicUsize,
        last_instruction: Mutex<Option<String>>,
    }

    #[async_trait]
    impl StructuredModel for CountingModel {
        async fn generate(&self, request: PromptRequest<'_>) -> Result<Value, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_instruction.lock().unwrap() = Some(request.instruction);
            self.answer
                .clone()
                .ok_or_else(|| ModelError::EmptyResponse("scripted failure".into()))
        }
    }

    fn image() -> EncodedImage {
        EncodedImage::new("image/png", vec![0u8; 16])
    }

    fn tear() -> SyntheticVerdict {
        SyntheticVerdict::Defective {
            defect_type: "Tear".into(),
            confidence: Confidence::new(0.85).unwrap(),
            bounding_box: BoundingBox { x: 12.0, y: 30.0, width: 25.0, height: 40.0 },
        }
    }

    #[tokio::test]
    async fn defective_verdict_is_narrated_not_reclassified() {
        let model = Arc::new(CountingModel {
            answer: Some(json!({ "description": "Edge tear detected near seal." })),
            ..Default::default()
        });
        let strategy = SynthesizeThenDescribe::new(Box::new(FixedSampler(tear())), model.clone());

        let outcome = strategy.inspect(&image()).await.unwrap();

        assert_eq!(outcome.finding.defect_type(), Some("Tear"));
        assert_eq!(outcome.confidence, Confidence::new(0.85));
        assert_eq!(outcome.description.as_deref(), Some("Edge tear detected near seal."));
        assert!(outcome.finding.bounding_box().unwrap().is_finite());
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);

        let instruction = model.last_instruction.lock().unwrap().clone().unwrap();
        assert!(instruction.contains("Defect Type: Tear"));
        assert!(instruction.contains("Confidence Score: 0.8500"));
    }

    #[tokio::test]
    async fn normal_verdict_skips_the_model() {
        let model = Arc::new(CountingModel::default());
        let normal = SyntheticVerdict::Normal {
            confidence: Confidence::new(0.93).unwrap(),
        };
        let strategy = SynthesizeThenDescribe::new(Box::new(FixedSampler(normal)), model.clone());

        let outcome = strategy.inspect(&image()).await.unwrap();

        assert_eq!(outcome.finding, Finding::Normal);
        assert_eq!(outcome.description, None);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn description_failure_fails_the_whole_inspection() {
        let model = Arc::new(CountingModel::default());
        let strategy = SynthesizeThenDescribe::new(Box::new(FixedSampler(tear())), model);

        assert_matches!(strategy.inspect(&image()).await, Err(InspectError::Model(_)));
    }

    #[tokio::test]
    async fn answer_without_description_is_a_validation_error() {
        let model = Arc::new(CountingModel {
            answer: Some(json!({ "summary": "looks torn" })),
            ..Default::default()
        });
        let strategy = SynthesizeThenDescribe::new(Box::new(FixedSampler(tear())), model);

        assert_matches!(strategy.inspect(&image()).await, Err(InspectError::Validation(_)));
    }

    #[test]
    fn random_sampler_stays_inside_documented_ranges() {
        let sampler = RandomSampler::seeded(42);
        let mut defective = 0;
        for _ in 0..2000 {
            match sampler.sample() {
                SyntheticVerdict::Normal { confidence } => {
                    assert!((0.90..0.99).contains(&confidence.value()));
                }
                SyntheticVerdict::Defective {
                    defect_type,
                    confidence,
                    bounding_box,
                } => {
                    defective += 1;
                    assert!(DEFECT_TYPES.contains(&defect_type.as_str()));
                    assert!((0.80..0.99).contains(&confidence.value()));
                    assert!((0.0..50.0).contains(&bounding_box.x));
                    assert!((0.0..50.0).contains(&bounding_box.y));
                    assert!((20.0..50.0).contains(&bounding_box.width));
                    assert!((20.0..50.0).contains(&bounding_box.height));
                }
            }
        }
        // 0.7 of 2000 draws, with generous slack for a fixed seed.
        assert!((1250..1550).contains(&defective), "defective draws: {defective}");
    }
}
