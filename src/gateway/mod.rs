//! Boundary between the authoring core and storage.
//!
//! The core only ever talks to `PersistenceGateway`. Tours are written as one
//! aggregate through `save_tour`; `load_hotspots_for_image` is a read view
//! over those saved aggregates, not a second write path.

mod blob_store;
mod local;

pub use blob_store::BlobStore;
pub use local::LocalGateway;

use async_trait::async_trait;

use crate::{
    error::{PersistenceError, StorageError},
    models::{Hotspot, StoredTour, TourDocument, TourId, TourSummary},
};

#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Uploads raw image bytes and returns a resolvable URL.
    async fn store_image(&self, bytes: &[u8]) -> Result<String, StorageError>;

    async fn save_tour(&self, document: &TourDocument) -> Result<TourId, PersistenceError>;

    /// Hotspots attached to the panorama stored at `image_ref`.
    async fn load_hotspots_for_image(
        &self,
        image_ref: &str,
    ) -> Result<Vec<Hotspot>, PersistenceError>;

    async fn load_tour(&self, id: &TourId) -> Result<StoredTour, PersistenceError>;

    async fn list_tours(&self) -> Result<Vec<TourSummary>, PersistenceError>;
}

/// Structural checks every gateway applies before accepting a document.
pub fn validate_document(document: &TourDocument) -> Result<(), PersistenceError> {
    let mut seen = std::collections::HashSet::new();
    for image in &document.images {
        if !seen.insert(image.id) {
            return Err(PersistenceError::Schema(format!(
                "image {} appears more than once",
                image.id
            )));
        }
    }

    for (source, hotspots) in &document.hotspots {
        if !seen.contains(source) {
            return Err(PersistenceError::Schema(format!(
                "hotspots attached to unknown image {source}"
            )));
        }
        for hotspot in hotspots {
            if !seen.contains(&hotspot.linked_image) {
                return Err(PersistenceError::Schema(format!(
                    "hotspot '{}' on {source} links to unknown image {}",
                    hotspot.name, hotspot.linked_image
                )));
            }
            if !hotspot.pitch.is_finite() || !hotspot.yaw.is_finite() {
                return Err(PersistenceError::Schema(format!(
                    "hotspot '{}' on {source} has a non-finite angle",
                    hotspot.name
                )));
            }
        }
    }

    Ok(())
}
