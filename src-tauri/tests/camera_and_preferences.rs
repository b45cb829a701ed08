mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bearingscan_lib::{
    acquisition::camera::{CameraController, CameraFrame, CameraStatus, FacingMode},
    config::AppConfig,
    inference::{build_strategy, DirectInspection, StrategyKind},
    inspection::{AttemptOutcome, InspectionController},
    settings::{AppSettings, JsonFileStore, ModelVersion, Preferences},
};
use serde_json::json;
use tempfile::tempdir;

use common::{CannedModel, CollectingSink, NullBridge};

fn opened_stream(status: &CameraStatus) -> String {
    match status {
        CameraStatus::RequestingPermission { stream_id, .. } => stream_id.clone(),
        other => panic!("camera did not request a stream: {other:?}"),
    }
}

#[tokio::test]
async fn captured_frame_is_inspected_and_stream_released_once() {
    let sink = Arc::new(CollectingSink::default());
    let bridge = Arc::new(NullBridge::default());
    let camera = CameraController::new(bridge.clone(), sink.clone());
    let model = Arc::new(CannedModel::answering(json!({ "isBearing": true, "result": "Normal" })));
    let inspection = InspectionController::new(Arc::new(DirectInspection::new(model)), sink.clone());

    let stream_id = opened_stream(&camera.open(FacingMode::Environment).await);
    camera.stream_granted(&stream_id).await;

    let image = camera
        .capture(CameraFrame::Rgba {
            width: 8,
            height: 8,
            pixels: STANDARD.encode(vec![200u8; 8 * 8 * 4]),
        })
        .await
        .unwrap();
    assert_eq!(image.mime_type(), "image/jpeg");

    let outcome = inspection.submit_capture(image).await.unwrap();
    assert_matches!(outcome, AttemptOutcome::Recorded { record } if record.image().mime_type() == "image/jpeg");

    camera.close().await;
    assert_eq!(*bridge.released.lock().unwrap(), vec![stream_id]);
}

#[tokio::test]
async fn closing_mid_request_releases_the_pending_stream() {
    let sink = Arc::new(CollectingSink::default());
    let bridge = Arc::new(NullBridge::default());
    let camera = CameraController::new(bridge.clone(), sink);

    let stream_id = opened_stream(&camera.open(FacingMode::User).await);
    camera.close().await;

    // The late grant belongs to a stream that no longer exists.
    assert_eq!(camera.stream_granted(&stream_id).await, CameraStatus::Closed);
    assert_eq!(*bridge.requested.lock().unwrap(), vec![stream_id.clone()]);
    assert_eq!(*bridge.released.lock().unwrap(), vec![stream_id.clone(), stream_id]);
}

#[test]
fn saved_settings_select_the_strategy() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("preferences.json");
    let config = AppConfig::default();

    let preferences = Preferences::load(Box::new(JsonFileStore::new(path.clone()).unwrap()));
    let strategy = build_strategy(&config, &preferences.settings()).unwrap();
    assert_eq!(strategy.kind(), StrategyKind::Synthesize);

    preferences
        .save_settings(AppSettings {
            model_version: ModelVersion::GeminiPro,
            inspection_mode: StrategyKind::Direct,
            ..AppSettings::default()
        })
        .unwrap();

    let reloaded = Preferences::load(Box::new(JsonFileStore::new(path).unwrap()));
    let strategy = build_strategy(&config, &reloaded.settings()).unwrap();
    assert_eq!(strategy.kind(), StrategyKind::Direct);
    assert_eq!(reloaded.settings().model_version.model_id(), "gemini-pro");
}

#[test]
fn malformed_base_url_is_a_setup_error() {
    let config = AppConfig {
        gemini_base_url: Some("not a url".into()),
        ..AppConfig::default()
    };
    assert!(build_strategy(&config, &AppSettings::default()).is_err());
}
