pub mod acquisition;
pub mod config;
pub mod events;
pub mod inference;
pub mod inspection;
pub mod models;
pub mod notice;
pub mod settings;
pub mod utils;
pub mod view;

use std::sync::Arc;

use acquisition::camera::{
    commands::{
        camera_capture, camera_stream_denied, camera_stream_granted, close_camera,
        get_camera_status, open_camera, toggle_camera_facing,
    },
    CameraController, WebviewCameraBridge,
};
use config::AppConfig;
use events::EventSink;
use inspection::{
    commands::{get_current_inspection, get_detection_log, get_pipeline_status, submit_image},
    InspectionController,
};
use notice::Notice;
use settings::{AppSettings, JsonFileStore, Preferences, UserProfile};
use tauri::{Manager, State};

pub(crate) struct AppState {
    pub(crate) config: AppConfig,
    pub(crate) preferences: Preferences,
    pub(crate) inspection: InspectionController,
    pub(crate) camera: CameraController,
    pub(crate) sink: Arc<dyn EventSink>,
}

#[tauri::command]
fn get_user_profile(state: State<AppState>) -> Result<UserProfile, String> {
    Ok(state.preferences.profile())
}

#[tauri::command]
fn save_user_profile(profile: UserProfile, state: State<AppState>) -> Result<UserProfile, String> {
    if let Err(err) = state.preferences.save_profile(profile.clone()) {
        log::error!("failed to save profile: {err:#}");
        Notice::save_failed("profile").emit(state.sink.as_ref());
        return Err(err.to_string());
    }

    events::emit(state.sink.as_ref(), events::PROFILE_UPDATED, &profile);
    Notice::profile_saved().emit(state.sink.as_ref());
    Ok(profile)
}

#[tauri::command]
fn get_app_settings(state: State<AppState>) -> Result<AppSettings, String> {
    Ok(state.preferences.settings())
}

#[tauri::command]
fn save_app_settings(settings: AppSettings, state: State<AppState>) -> Result<AppSettings, String> {
    let strategy = inference::build_strategy(&state.config, &settings).map_err(|err| {
        log::error!("rejected settings, strategy could not be built: {err:#}");
        Notice::save_failed("settings").emit(state.sink.as_ref());
        err.to_string()
    })?;

    if let Err(err) = state.preferences.save_settings(settings.clone()) {
        log::error!("failed to save settings: {err:#}");
        Notice::save_failed("settings").emit(state.sink.as_ref());
        return Err(err.to_string());
    }

    state.inspection.set_strategy(strategy);
    events::emit(state.sink.as_ref(), events::SETTINGS_UPDATED, &settings);
    Notice::settings_saved().emit(state.sink.as_ref());
    Ok(settings)
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let config = AppConfig::from_env();

    // Initialize logging (RUST_LOG still wins over the default level)
    let level = match &config {
        Ok(config) if config.debug => log::LevelFilter::Debug,
        _ => log::LevelFilter::Info,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    log::info!("BearingScan Pro starting up...");

    tauri::Builder::default()
        .setup(move |app| {
            let result = (|| -> anyhow::Result<()> {
                let config = config?;

                let app_data_dir = app
                    .path()
                    .app_data_dir()
                    .map_err(|err| anyhow::anyhow!(err))?;
                std::fs::create_dir_all(&app_data_dir)?;

                let store = JsonFileStore::new(app_data_dir.join("preferences.json"))?;
                let preferences = Preferences::load(Box::new(store));
                let strategy = inference::build_strategy(&config, &preferences.settings())?;

                let sink: Arc<dyn EventSink> = Arc::new(app.handle().clone());
                let bridge = Arc::new(WebviewCameraBridge::new(sink.clone()));

                app.manage(AppState {
                    config,
                    preferences,
                    inspection: InspectionController::new(strategy, sink.clone()),
                    camera: CameraController::new(bridge, sink.clone()),
                    sink,
                });

                Ok(())
            })();

            result.map_err(|err| err.into())
        })
        .invoke_handler(tauri::generate_handler![
            submit_image,
            get_pipeline_status,
            get_current_inspection,
            get_detection_log,
            open_camera,
            camera_stream_granted,
            camera_stream_denied,
            toggle_camera_facing,
            camera_capture,
            close_camera,
            get_camera_status,
            get_user_profile,
            save_user_profile,
            get_app_settings,
            save_app_settings,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
