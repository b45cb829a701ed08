#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use async_trait::async_trait;
use bearingscan_lib::{
    acquisition::{camera::CameraBridge, camera::FacingMode, ImageSource},
    events::EventSink,
    inference::{ModelError, PromptRequest, StructuredModel, SyntheticVerdict, VerdictSampler},
};
use serde_json::Value;

#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<(String, Value)>>,
}

impl CollectingSink {
    pub fn named(&self, event: &str) -> Vec<Value> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == event)
            .map(|(_, payload)| payload.clone())
            .collect()
    }
}

impl EventSink for CollectingSink {
    fn emit_value(&self, event: &str, payload: Value) {
        self.events.lock().unwrap().push((event.to_string(), payload));
    }
}

/// Answers every call with the same JSON, or fails with a 503.
pub struct CannedModel {
    answer: Option<Value>,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<&'static str>>,
}

impl CannedModel {
    pub fn answering(answer: Value) -> Self {
        Self {
            answer: Some(answer),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StructuredModel for CannedModel {
    async fn generate(&self, request: PromptRequest<'_>) -> Result<Value, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.name);
        self.answer.clone().ok_or(ModelError::Api {
            status: 503,
            body: "service unavailable".into(),
        })
    }
}

pub struct FixedVerdict(pub SyntheticVerdict);

impl VerdictSampler for FixedVerdict {
    fn sample(&self) -> SyntheticVerdict {
        self.0.clone()
    }
}

#[derive(Default)]
pub struct NullBridge {
    pub requested: Mutex<Vec<String>>,
    pub released: Mutex<Vec<String>>,
}

impl CameraBridge for NullBridge {
    fn request_stream(&self, stream_id: &str, _facing: FacingMode) {
        self.requested.lock().unwrap().push(stream_id.to_string());
    }

    fn release_stream(&self, stream_id: &str) {
        self.released.lock().unwrap().push(stream_id.to_string());
    }
}

pub fn picked(file_name: &str, mime_type: &str, data_uri: &str) -> ImageSource {
    ImageSource::Picked {
        file_name: file_name.into(),
        mime_type: mime_type.into(),
        data_uri: data_uri.into(),
    }
}

pub fn bearing_png() -> ImageSource {
    picked("bearing.png", "image/png", "data:image/png;base64,iVBORw0KGgo=")
}
