//! Gemini `generateContent` client for structured (JSON) answers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE},
    Client, Url,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::model::{ModelError, PromptRequest, StructuredModel};

const ENABLE_LOGS: bool = true;
use crate::{log_info, log_warn};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/";
const DEFAULT_VERSION: &str = "v1beta";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-goog-api-key");

#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: Url,
    pub api_version: String,
    pub request_timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Result<Self, ModelError> {
        let base_url = Url::parse(DEFAULT_BASE_URL)
            .map_err(|err| ModelError::Endpoint(format!("base url parse failed: {err}")))?;
        Ok(Self {
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model: model.into(),
            base_url,
            api_version: DEFAULT_VERSION.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    pub fn with_base_url(mut self, base: impl AsRef<str>) -> Result<Self, ModelError> {
        self.base_url = Url::parse(base.as_ref())
            .map_err(|err| ModelError::Endpoint(format!("base url parse failed: {err}")))?;
        if !self.base_url.path().ends_with('/') {
            let path = format!("{}/", self.base_url.path().trim_end_matches('/'));
            self.base_url.set_path(&path);
        }
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn api_key(&self) -> Result<HeaderValue, ModelError> {
        let api_key = self.api_key.as_deref().ok_or(ModelError::MissingApiKey)?;
        let mut value = HeaderValue::from_str(api_key)
            .map_err(|_| ModelError::Endpoint("API key is not a valid header value".into()))?;
        value.set_sensitive(true);
        Ok(value)
    }

    fn endpoint(&self) -> Result<Url, ModelError> {
        let version = self.api_version.trim_matches('/');
        let joined = format!("{version}/models/{}:generateContent", self.model);
        self.base_url
            .join(&joined)
            .map_err(|err| ModelError::Endpoint(format!("endpoint build failed: {err}")))
    }
}

pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, ModelError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        if config.api_key.is_none() {
            log_warn!("no Gemini API key configured; inspections will fail until one is set");
        }

        Ok(Self { client, config })
    }
}

#[async_trait]
impl StructuredModel for GeminiClient {
    async fn generate(&self, request: PromptRequest<'_>) -> Result<Value, ModelError> {
        let api_key = self.config.api_key()?;
        let endpoint = self.config.endpoint()?;
        let body = build_request(&request);

        log_info!(
            "gemini call prompt={} model={} image_bytes={}",
            request.name,
            self.config.model,
            request.image.len()
        );

        let response = self
            .client
            .post(endpoint)
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            log_warn!("gemini call prompt={} failed with status {}", request.name, status);
            return Err(ModelError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let payload = response.json::<GenerateContentResponse>().await?;
        extract_answer(payload)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: Value,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum Part {
    Text(String),
    InlineData(InlineData),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ResponsePart {
    text: Option<String>,
}

fn build_request(request: &PromptRequest<'_>) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![
                Part::Text(request.instruction.clone()),
                Part::InlineData(InlineData {
                    mime_type: request.image.mime_type().to_string(),
                    data: request.image.to_base64(),
                }),
            ],
        }],
        generation_config: json!({
            "responseMimeType": "application/json",
            "responseSchema": request.response_schema,
        }),
    }
}

fn extract_answer(payload: GenerateContentResponse) -> Result<Value, ModelError> {
    let candidate = payload
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ModelError::EmptyResponse("no candidates".into()))?;

    let finish_reason = candidate.finish_reason.unwrap_or_else(|| "unknown".into());
    let content = candidate.content.ok_or_else(|| {
        ModelError::EmptyResponse(format!("candidate has no content (finish reason {finish_reason})"))
    })?;

    let text: String = content
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect();
    if text.trim().is_empty() {
        return Err(ModelError::EmptyResponse(format!(
            "candidate has no text (finish reason {finish_reason})"
        )));
    }

    Ok(serde_json::from_str(text.trim())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EncodedImage;
    use assert_matches::assert_matches;

    #[test]
    fn endpoint_targets_model_without_the_key() {
        let config = GeminiConfig::new(Some("secret".into()), "gemini-2.0-flash")
            .unwrap()
            .with_base_url("http://localhost:9000/proxy")
            .unwrap();
        let url = config.endpoint().unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9000/proxy/v1beta/models/gemini-2.0-flash:generateContent"
        );

        let key = config.api_key().unwrap();
        assert_eq!(key.to_str().unwrap(), "secret");
        assert!(key.is_sensitive());
    }

    #[test]
    fn request_requires_api_key() {
        let config = GeminiConfig::new(Some("  ".into()), "gemini-pro").unwrap();
        assert_matches!(config.api_key(), Err(ModelError::MissingApiKey));
    }

    #[tokio::test]
    async fn transport_failure_never_mentions_the_key() {
        let config = GeminiConfig::new(Some("SECRET-KEY-123".into()), "gemini-2.0-flash")
            .unwrap()
            .with_base_url("http://127.0.0.1:1/")
            .unwrap()
            .with_timeout(Duration::from_secs(5));
        let client = GeminiClient::new(config).unwrap();
        let image = EncodedImage::new("image/jpeg", vec![0xff, 0xd8]);

        let err = client
            .generate(PromptRequest {
                name: "inspectBearing",
                instruction: "Look closely.".into(),
                image: &image,
                response_schema: json!({ "type": "OBJECT" }),
            })
            .await
            .unwrap_err();

        assert_matches!(err, ModelError::Request(_));
        assert!(!err.to_string().contains("SECRET-KEY-123"));
        assert!(!format!("{err:?}").contains("SECRET-KEY-123"));
    }

    #[test]
    fn request_sends_instruction_and_inline_image() {
        let image = EncodedImage::new("image/jpeg", vec![0xff, 0xd8, 0xff]);
        let request = PromptRequest {
            name: "inspectBearing",
            instruction: "Look closely.".into(),
            image: &image,
            response_schema: json!({ "type": "OBJECT" }),
        };

        let body = serde_json::to_value(build_request(&request)).unwrap();
        let parts = &body["contents"][0]["parts"];
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(parts[0]["text"], "Look closely.");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[1]["inlineData"]["data"], "/9j/");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn answer_joins_text_parts_and_parses_json() {
        let payload: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"description\":" }, { "text": " \"ok\"}" }] },
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(extract_answer(payload).unwrap(), json!({ "description": "ok" }));
    }

    #[test]
    fn answer_without_candidates_or_json_is_an_error() {
        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_matches!(extract_answer(empty), Err(ModelError::EmptyResponse(_)));

        let prose: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "I think it is fine." }] } }]
        }))
        .unwrap();
        assert_matches!(extract_answer(prose), Err(ModelError::MalformedJson(_)));
    }
}
