//! Turning an image into an [`InspectionOutcome`].
//!
//! Two interchangeable strategies implement [`InspectionStrategy`]:
//! - [`SynthesizeThenDescribe`] decides locally and asks the model only to
//!   narrate the decision;
//! - [`DirectInspection`] lets the model classify the image itself.
//!
//! Both talk to the hosted model through [`StructuredModel`].

pub mod direct;
pub mod gemini;
pub mod model;
pub mod prompts;
pub mod synthesize;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    config::AppConfig,
    models::{EncodedImage, InspectionOutcome},
    settings::AppSettings,
};

pub use direct::DirectInspection;
pub use gemini::{GeminiClient, GeminiConfig};
pub use model::{ModelError, PromptRequest, StructuredModel};
pub use synthesize::{RandomSampler, SynthesizeThenDescribe, SyntheticVerdict, VerdictSampler};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum StrategyKind {
    #[default]
    Synthesize,
    Direct,
}

#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("model response failed validation: {0}")]
    Validation(String),
}

impl InspectError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        InspectError::Validation(message.into())
    }
}

#[async_trait]
pub trait InspectionStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    async fn inspect(&self, image: &EncodedImage) -> Result<InspectionOutcome, InspectError>;
}

/// Builds the strategy selected in `settings`, talking to Gemini with the
/// configured credentials and the chosen model version.
pub fn build_strategy(
    config: &AppConfig,
    settings: &AppSettings,
) -> Result<Arc<dyn InspectionStrategy>> {
    let mut gemini =
        GeminiConfig::new(config.gemini_api_key.clone(), settings.model_version.model_id())?
            .with_timeout(config.request_timeout);
    if let Some(base_url) = config.gemini_base_url.as_deref() {
        gemini = gemini.with_base_url(base_url)?;
    }
    let model: Arc<dyn StructuredModel> = Arc::new(GeminiClient::new(gemini)?);

    let strategy: Arc<dyn InspectionStrategy> = match settings.inspection_mode {
        StrategyKind::Synthesize => Arc::new(SynthesizeThenDescribe::new(
            Box::new(RandomSampler::from_entropy()),
            model,
        )),
        StrategyKind::Direct => Arc::new(DirectInspection::new(model)),
    };

    log::info!(
        "inspection strategy ready: mode={:?} model={}",
        settings.inspection_mode,
        settings.model_version.model_id()
    );
    Ok(strategy)
}
