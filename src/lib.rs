mod db;
pub mod error;
pub mod gateway;
pub mod models;
pub mod navigation;
pub mod sampler;
pub mod settings;
pub mod tour;
mod utils;

#[cfg(test)]
mod test_support;

pub use db::Database;

#[cfg(feature = "desktop")]
pub use desktop::run;

#[cfg(feature = "desktop")]
mod desktop {
    use std::{path::PathBuf, sync::Arc};

    use log::{info, warn};
    use tauri::{AppHandle, Emitter, Manager, State};
    use tokio::sync::broadcast::error::RecvError;

    use crate::{
        db::Database,
        gateway::{BlobStore, LocalGateway},
        settings::{SettingsStore, UploadSettings, ViewerSettings},
        tour::{
            commands::{
                add_panorama, commit_hotspot, finish_tour, get_hotspots_for_panorama,
                get_panorama_bytes, get_session_diagnostics, get_tour_diagnostics,
                get_wizard_state, list_panoramas, list_tours, load_hotspots_for_image,
                load_tour, rename_panorama, report_viewer_event, retry_panorama_upload,
                select_panorama, set_staged_hotspot_field, stage_current_view,
                update_property_details, walk_tour, wizard_back, wizard_next,
            },
            TourController,
        },
    };

    /// Overrides the platform app data directory, e.g. for portable installs.
    const DATA_DIR_ENV: &str = "PANOTOUR_DATA_DIR";

    pub(crate) struct AppState {
        pub(crate) tours: TourController,
        pub(crate) settings: SettingsStore,
    }

    #[tauri::command]
    fn get_viewer_settings(state: State<AppState>) -> Result<ViewerSettings, String> {
        Ok(state.settings.viewer())
    }

    /// Takes effect for the next launch; the running controller keeps the
    /// defaults it was started with.
    #[tauri::command]
    fn set_viewer_settings(
        settings: ViewerSettings,
        state: State<AppState>,
        app_handle: AppHandle,
    ) -> Result<(), String> {
        state
            .settings
            .update_viewer(settings.clone())
            .map_err(|e| e.to_string())?;

        app_handle
            .emit("viewer-settings-updated", &settings)
            .map_err(|e| e.to_string())?;

        Ok(())
    }

    #[tauri::command]
    fn get_upload_settings(state: State<AppState>) -> Result<UploadSettings, String> {
        Ok(state.settings.uploads())
    }

    #[tauri::command]
    fn set_upload_settings(settings: UploadSettings, state: State<AppState>) -> Result<(), String> {
        state
            .settings
            .update_uploads(settings)
            .map_err(|e| e.to_string())
    }

    fn data_dir(app: &tauri::App) -> anyhow::Result<PathBuf> {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }
        app.path()
            .app_data_dir()
            .map_err(|err| anyhow::anyhow!(err))
    }

    /// Mirrors controller events and the live viewing angle to the webview.
    fn forward_events(app_handle: AppHandle, controller: &TourController) {
        let mut events = controller.subscribe();
        let handle = app_handle.clone();
        tauri::async_runtime::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let _ = handle.emit(event.name(), &event);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Event forwarder lagged; dropped {skipped} tour events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        let mut angle = controller.subscribe_angle();
        tauri::async_runtime::spawn(async move {
            while angle.changed().await.is_ok() {
                let current = *angle.borrow_and_update();
                let _ = app_handle.emit("viewing-angle-changed", current);
            }
        });
    }

    #[cfg_attr(mobile, tauri::mobile_entry_point)]
    pub fn run() {
        // Initialize logging (reads RUST_LOG env var)
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();

        info!("Panotour starting up...");

        tauri::Builder::default()
            .plugin(tauri_plugin_opener::init())
            .setup(|app| {
                let result = (|| -> anyhow::Result<()> {
                    let app_data_dir = data_dir(app)?;
                    std::fs::create_dir_all(&app_data_dir)?;

                    let db_path = app_data_dir.join("panotour.sqlite3");
                    let database = Database::new(db_path)?;
                    let blobs = BlobStore::new(app_data_dir.join("panoramas"));

                    let settings_path = app_data_dir.join("settings.json");
                    let settings_store = SettingsStore::new(settings_path)?;

                    let gateway = Arc::new(LocalGateway::new(database, blobs));
                    let controller = TourController::new(
                        gateway,
                        settings_store.viewer(),
                        settings_store.uploads().max_image_bytes,
                    );
                    forward_events(app.handle().clone(), &controller);

                    info!("Data directory: {}", app_data_dir.display());

                    app.manage(AppState {
                        tours: controller,
                        settings: settings_store,
                    });

                    Ok(())
                })();

                result.map_err(|err| err.into())
            })
            .invoke_handler(tauri::generate_handler![
                get_wizard_state,
                update_property_details,
                wizard_next,
                wizard_back,
                add_panorama,
                retry_panorama_upload,
                rename_panorama,
                list_panoramas,
                get_panorama_bytes,
                select_panorama,
                report_viewer_event,
                stage_current_view,
                set_staged_hotspot_field,
                commit_hotspot,
                get_hotspots_for_panorama,
                finish_tour,
                load_tour,
                list_tours,
                load_hotspots_for_image,
                get_tour_diagnostics,
                get_session_diagnostics,
                walk_tour,
                get_viewer_settings,
                set_viewer_settings,
                get_upload_settings,
                set_upload_settings,
            ])
            .run(tauri::generate_context!())
            .expect("error while running tauri application");
    }
}

#[cfg(feature = "desktop")]
pub(crate) use desktop::AppState;
