use async_trait::async_trait;
use serde_json::Value;

use crate::models::EncodedImage;

/// One structured-output call: instruction text, the image, and the JSON
/// schema the answer must follow.
#[derive(Debug, Clone)]
pub struct PromptRequest<'a> {
    /// Stable prompt name, used in logs.
    pub name: &'static str,
    pub instruction: String,
    pub image: &'a EncodedImage,
    pub response_schema: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("no API key configured for the hosted model")]
    MissingApiKey,

    #[error("invalid model endpoint: {0}")]
    Endpoint(String),

    #[error("model request failed: {0}")]
    Request(reqwest::Error),

    #[error("model API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("model returned no usable answer: {0}")]
    EmptyResponse(String),

    #[error("model answer is not valid JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ModelError {
    /// Strips the request URL so endpoint query parameters never reach a log line.
    fn from(err: reqwest::Error) -> Self {
        ModelError::Request(err.without_url())
    }
}

/// The hosted structured-output model.
#[async_trait]
pub trait StructuredModel: Send + Sync {
    async fn generate(&self, request: PromptRequest<'_>) -> Result<Value, ModelError>;
}
