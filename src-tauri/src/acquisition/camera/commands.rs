use tauri::State;

use super::{CameraController, CameraFrame, CameraStatus, FacingMode};
use crate::{
    inspection::{AttemptOutcome, InspectionController},
    AppState,
};

fn controller_from_state(state: &State<'_, AppState>) -> CameraController {
    state.camera.clone()
}

#[tauri::command]
pub async fn open_camera(
    state: State<'_, AppState>,
    facing: Option<FacingMode>,
) -> Result<CameraStatus, String> {
    let facing = facing.unwrap_or_else(|| state.preferences.settings().default_camera);
    Ok(controller_from_state(&state).open(facing).await)
}

#[tauri::command]
pub async fn camera_stream_granted(
    state: State<'_, AppState>,
    stream_id: String,
) -> Result<CameraStatus, String> {
    Ok(controller_from_state(&state).stream_granted(&stream_id).await)
}

#[tauri::command]
pub async fn camera_stream_denied(
    state: State<'_, AppState>,
    stream_id: String,
    reason: String,
) -> Result<CameraStatus, String> {
    Ok(controller_from_state(&state)
        .stream_denied(&stream_id, reason)
        .await)
}

#[tauri::command]
pub async fn toggle_camera_facing(state: State<'_, AppState>) -> Result<CameraStatus, String> {
    controller_from_state(&state)
        .toggle_facing()
        .await
        .map_err(|e| e.to_string())
}

/// Captures the frame and hands the JPEG straight to the inspection pipeline.
#[tauri::command]
pub async fn camera_capture(
    state: State<'_, AppState>,
    frame: CameraFrame,
) -> Result<AttemptOutcome, String> {
    capture_and_inspect(&controller_from_state(&state), &state.inspection, frame).await
}

/// The pipeline is reserved before the frame is taken. A busy pipeline leaves
/// the camera streaming with nothing consumed.
async fn capture_and_inspect(
    camera: &CameraController,
    inspection: &InspectionController,
    frame: CameraFrame,
) -> Result<AttemptOutcome, String> {
    let guard = inspection.reserve().map_err(|e| e.to_string())?;
    let image = camera.capture(frame).await.map_err(|e| e.to_string())?;
    Ok(inspection.submit_reserved(guard, image).await)
}

#[tauri::command]
pub async fn close_camera(state: State<'_, AppState>) -> Result<CameraStatus, String> {
    Ok(controller_from_state(&state).close().await)
}

#[tauri::command]
pub async fn get_camera_status(state: State<'_, AppState>) -> Result<CameraStatus, String> {
    Ok(controller_from_state(&state).status().await)
}
