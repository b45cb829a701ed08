//! Event names pushed to the webview and the sink abstraction behind them.
//!
//! Controllers never hold an `AppHandle` directly; they emit through
//! [`EventSink`] so they can be driven from tests without a running app.

use serde::Serialize;
use serde_json::Value;
use tauri::{AppHandle, Emitter, Runtime};

pub const INSPECTION_STATUS_CHANGED: &str = "inspection-status-changed";
pub const INSPECTION_RECORDED: &str = "inspection-recorded";
pub const NOTICE: &str = "notice";
pub const CAMERA_STATE_CHANGED: &str = "camera-state-changed";
pub const CAMERA_STREAM_REQUESTED: &str = "camera-stream-requested";
pub const CAMERA_STREAM_RELEASED: &str = "camera-stream-released";
pub const SETTINGS_UPDATED: &str = "settings-updated";
pub const PROFILE_UPDATED: &str = "profile-updated";

pub trait EventSink: Send + Sync + 'static {
    fn emit_value(&self, event: &str, payload: Value);
}

impl<R: Runtime> EventSink for AppHandle<R> {
    fn emit_value(&self, event: &str, payload: Value) {
        if let Err(err) = self.emit(event, payload) {
            log::warn!("failed to emit {event}: {err}");
        }
    }
}

/// Serializes `payload` and hands it to the sink. Serialization failures are
/// logged and dropped.
pub fn emit<S: EventSink + ?Sized, T: Serialize>(sink: &S, event: &str, payload: &T) {
    match serde_json::to_value(payload) {
        Ok(value) => sink.emit_value(event, value),
        Err(err) => log::error!("failed to serialize {event} payload: {err}"),
    }
}
