use std::sync::Arc;

use serde::Serialize;

use super::FacingMode;
use crate::events::{self, EventSink};

/// The side that actually owns media tracks. Requests and releases are
/// fire-and-forget; the answer to a request comes back through
/// `CameraController::stream_granted` / `stream_denied`.
pub trait CameraBridge: Send + Sync {
    fn request_stream(&self, stream_id: &str, facing: FacingMode);
    fn release_stream(&self, stream_id: &str);
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StreamRequestedEvent<'a> {
    stream_id: &'a str,
    facing: FacingMode,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StreamReleasedEvent<'a> {
    stream_id: &'a str,
}

/// Drives `getUserMedia` in the webview through events.
pub struct WebviewCameraBridge {
    sink: Arc<dyn EventSink>,
}

impl WebviewCameraBridge {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }
}

impl CameraBridge for WebviewCameraBridge {
    fn request_stream(&self, stream_id: &str, facing: FacingMode) {
        events::emit(
            self.sink.as_ref(),
            events::CAMERA_STREAM_REQUESTED,
            &StreamRequestedEvent { stream_id, facing },
        );
    }

    fn release_stream(&self, stream_id: &str) {
        events::emit(
            self.sink.as_ref(),
            events::CAMERA_STREAM_RELEASED,
            &StreamReleasedEvent { stream_id },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::testing::RecordingSink;
    use serde_json::json;

    #[test]
    fn webview_bridge_emits_request_and_release() {
        let sink = Arc::new(RecordingSink::default());
        let bridge = WebviewCameraBridge::new(sink.clone());

        bridge.request_stream("s-1", FacingMode::Environment);
        bridge.release_stream("s-1");

        assert_eq!(
            sink.named(events::CAMERA_STREAM_REQUESTED),
            vec![json!({ "streamId": "s-1", "facing": "environment" })]
        );
        assert_eq!(
            sink.named(events::CAMERA_STREAM_RELEASED),
            vec![json!({ "streamId": "s-1" })]
        );
    }
}
