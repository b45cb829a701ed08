use tauri::State;

use super::{AttemptOutcome, InspectionController, PipelineStatus};
use crate::{
    acquisition::ImageSource,
    view::{HistoryView, ResultView},
    AppState,
};

fn controller_from_state(state: &State<'_, AppState>) -> InspectionController {
    state.inspection.clone()
}

#[tauri::command]
pub async fn submit_image(
    state: State<'_, AppState>,
    source: ImageSource,
) -> Result<AttemptOutcome, String> {
    controller_from_state(&state)
        .submit(source)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_pipeline_status(state: State<'_, AppState>) -> Result<PipelineStatus, String> {
    Ok(state.inspection.status())
}

#[tauri::command]
pub fn get_current_inspection(state: State<'_, AppState>) -> Result<Option<ResultView>, String> {
    Ok(state
        .inspection
        .log()
        .current()
        .map(|record| ResultView::from_record(&record)))
}

#[tauri::command]
pub fn get_detection_log(state: State<'_, AppState>) -> Result<HistoryView, String> {
    Ok(HistoryView::from_records(&state.inspection.log().history()))
}
