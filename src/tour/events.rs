use serde::Serialize;

use crate::models::{Hotspot, ImageId, PanoramaImage, StagedHotspot, TourId};

use super::WizardStep;

/// Notifications for the front-end. The desktop shell re-emits each one
/// under `TourEvent::name`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TourEvent {
    StepChanged { step: WizardStep },
    ImageAdded { image: PanoramaImage },
    ImageStored { image_id: ImageId, url: String },
    ImageUploadFailed { image_id: ImageId, message: String },
    HotspotStaged { image_id: ImageId, staged: StagedHotspot },
    HotspotCommitted { source: ImageId, hotspot: Hotspot },
    TourSaved { tour_id: TourId },
}

impl TourEvent {
    pub fn name(&self) -> &'static str {
        match self {
            TourEvent::StepChanged { .. } => "wizard-step-changed",
            TourEvent::ImageAdded { .. } => "image-added",
            TourEvent::ImageStored { .. } => "image-stored",
            TourEvent::ImageUploadFailed { .. } => "image-upload-failed",
            TourEvent::HotspotStaged { .. } => "hotspot-staged",
            TourEvent::HotspotCommitted { .. } => "hotspot-committed",
            TourEvent::TourSaved { .. } => "tour-saved",
        }
    }
}
