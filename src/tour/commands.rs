use tauri::{ipc::Response, State};

use crate::{
    models::{
        Hotspot, HotspotField, ImageId, PanoramaImage, PropertyDetails, StagedHotspot,
        StoredTour, TourId, TourSummary,
    },
    navigation::{TourDiagnostics, TourStop},
    sampler::ViewerEvent,
    tour::{TourController, WizardSnapshot, WizardStep},
};

use crate::AppState;

fn controller_from_state(state: &State<'_, AppState>) -> TourController {
    state.tours.clone()
}

#[tauri::command]
pub async fn get_wizard_state(state: State<'_, AppState>) -> Result<WizardSnapshot, String> {
    let controller = controller_from_state(&state);
    Ok(controller.snapshot().await)
}

#[tauri::command]
pub async fn update_property_details(
    state: State<'_, AppState>,
    details: PropertyDetails,
) -> Result<(), String> {
    let controller = controller_from_state(&state);
    controller
        .update_details(details)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn wizard_next(state: State<'_, AppState>) -> Result<WizardStep, String> {
    let controller = controller_from_state(&state);
    controller.next().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn wizard_back(state: State<'_, AppState>) -> Result<WizardStep, String> {
    let controller = controller_from_state(&state);
    controller.back().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn add_panorama(
    state: State<'_, AppState>,
    bytes: Vec<u8>,
    name: String,
) -> Result<PanoramaImage, String> {
    let controller = controller_from_state(&state);
    controller
        .add_image(bytes, &name)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn retry_panorama_upload(
    state: State<'_, AppState>,
    image_id: ImageId,
) -> Result<(), String> {
    let controller = controller_from_state(&state);
    controller
        .retry_upload(image_id)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn rename_panorama(
    state: State<'_, AppState>,
    image_id: ImageId,
    name: String,
) -> Result<(), String> {
    let controller = controller_from_state(&state);
    controller
        .rename_image(image_id, &name)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn list_panoramas(state: State<'_, AppState>) -> Result<Vec<PanoramaImage>, String> {
    let controller = controller_from_state(&state);
    Ok(controller.list_images().await)
}

/// Raw image bytes for the webview's preview (`preview://<id>`).
#[tauri::command]
pub async fn get_panorama_bytes(
    state: State<'_, AppState>,
    image_id: ImageId,
) -> Result<Response, String> {
    let controller = controller_from_state(&state);
    let bytes = controller
        .image_bytes(image_id)
        .await
        .map_err(|e| e.to_string())?;
    Ok(Response::new(bytes.as_ref().clone()))
}

#[tauri::command]
pub async fn select_panorama(state: State<'_, AppState>, image_id: ImageId) -> Result<(), String> {
    let controller = controller_from_state(&state);
    controller
        .select_image(image_id)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn report_viewer_event(
    state: State<'_, AppState>,
    event: ViewerEvent,
) -> Result<bool, String> {
    let controller = controller_from_state(&state);
    Ok(controller.viewer_event(event).await)
}

#[tauri::command]
pub async fn stage_current_view(state: State<'_, AppState>) -> Result<StagedHotspot, String> {
    let controller = controller_from_state(&state);
    controller
        .stage_current_view()
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn set_staged_hotspot_field(
    state: State<'_, AppState>,
    field: HotspotField,
    value: String,
) -> Result<StagedHotspot, String> {
    let controller = controller_from_state(&state);
    controller
        .set_staged_field(field, value)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn commit_hotspot(state: State<'_, AppState>) -> Result<Hotspot, String> {
    let controller = controller_from_state(&state);
    controller.commit_hotspot().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_hotspots_for_panorama(
    state: State<'_, AppState>,
    image_id: ImageId,
) -> Result<Vec<Hotspot>, String> {
    let controller = controller_from_state(&state);
    Ok(controller.hotspots_for(image_id).await)
}

#[tauri::command]
pub async fn finish_tour(state: State<'_, AppState>) -> Result<TourId, String> {
    let controller = controller_from_state(&state);
    controller.finish().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn load_tour(state: State<'_, AppState>, tour_id: TourId) -> Result<StoredTour, String> {
    let controller = controller_from_state(&state);
    controller
        .load_tour(&tour_id)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn list_tours(state: State<'_, AppState>) -> Result<Vec<TourSummary>, String> {
    let controller = controller_from_state(&state);
    controller.list_tours().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn load_hotspots_for_image(
    state: State<'_, AppState>,
    image_ref: String,
) -> Result<Vec<Hotspot>, String> {
    let controller = controller_from_state(&state);
    controller
        .load_hotspots_for_image(&image_ref)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_tour_diagnostics(
    state: State<'_, AppState>,
    tour_id: TourId,
) -> Result<TourDiagnostics, String> {
    let controller = controller_from_state(&state);
    controller
        .tour_diagnostics(&tour_id)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_session_diagnostics(state: State<'_, AppState>) -> Result<TourDiagnostics, String> {
    let controller = controller_from_state(&state);
    Ok(controller.session_diagnostics().await)
}

#[tauri::command]
pub async fn walk_tour(
    state: State<'_, AppState>,
    tour_id: TourId,
    path: Vec<usize>,
) -> Result<TourStop, String> {
    let controller = controller_from_state(&state);
    controller
        .walk_tour(&tour_id, &path)
        .await
        .map_err(|e| e.to_string())
}
