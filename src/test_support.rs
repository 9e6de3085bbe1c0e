//! Fixtures shared by the unit tests.

use std::{
    collections::BTreeMap,
    io::Cursor,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, RgbImage};
use tokio::sync::Semaphore;

use crate::{
    error::{PersistenceError, StorageError},
    gateway::{validate_document, PersistenceGateway},
    models::{
        Hotspot, ImageId, PanoramaImage, PropertyDetails, StoredTour, TourDocument, TourId,
        TourSummary,
    },
};

pub fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::new(width, height));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn stored_image(id: u32, name: &str) -> PanoramaImage {
    PanoramaImage {
        id: ImageId(id),
        name: name.to_string(),
        preview: PanoramaImage::preview_ref(ImageId(id)),
        stored_url: Some(format!("file:///blobs/{name}.png")),
        format: "png".into(),
        width: 8,
        height: 4,
        bytes: Arc::default(),
    }
}

/// Lobby --Door--> Hall, nothing back.
pub fn document_with_link() -> TourDocument {
    let mut hotspots = BTreeMap::new();
    hotspots.insert(
        ImageId(0),
        vec![Hotspot {
            name: "Door".into(),
            linked_image: ImageId(1),
            pitch: 10.0,
            yaw: 180.0,
        }],
    );

    TourDocument {
        details: PropertyDetails {
            rooms: 3,
            bathrooms: 1,
            area: "120 m2".into(),
            address: "1 Harbour Street".into(),
        },
        images: vec![stored_image(0, "Lobby"), stored_image(1, "Hall")],
        hotspots,
    }
}

/// In-memory gateway with switches for failure and for holding uploads or
/// saves open until a permit is added to the matching gate.
#[derive(Default)]
pub struct MemoryGateway {
    pub fail_uploads: AtomicBool,
    pub fail_saves: AtomicBool,
    pub uploads: AtomicUsize,
    pub saves_started: AtomicUsize,
    pub upload_gate: Option<Semaphore>,
    pub save_gate: Option<Semaphore>,
    pub saved: Mutex<Vec<StoredTour>>,
}

async fn pass(gate: &Option<Semaphore>) -> anyhow::Result<()> {
    if let Some(gate) = gate {
        gate.acquire().await?.forget();
    }
    Ok(())
}

impl MemoryGateway {
    pub fn gated() -> Self {
        Self {
            save_gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    pub fn upload_gated() -> Self {
        Self {
            upload_gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    pub fn release_upload(&self) {
        if let Some(gate) = &self.upload_gate {
            gate.add_permits(1);
        }
    }

    pub fn saved(&self) -> Vec<StoredTour> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn store_image(&self, bytes: &[u8]) -> Result<String, StorageError> {
        pass(&self.upload_gate).await?;
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "quota exceeded",
            )));
        }
        let n = self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(format!("memory://{n}/{}", bytes.len()))
    }

    async fn save_tour(&self, document: &TourDocument) -> Result<TourId, PersistenceError> {
        self.saves_started.fetch_add(1, Ordering::SeqCst);
        pass(&self.save_gate).await?;
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(PersistenceError::Backend(anyhow::anyhow!("disk full")));
        }
        validate_document(document)?;

        let mut saved = self.saved.lock().unwrap();
        let id = TourId(format!("tour-{}", saved.len()));
        saved.push(StoredTour {
            id: id.clone(),
            created_at: chrono::Utc::now(),
            document: document.clone(),
        });
        Ok(id)
    }

    async fn load_hotspots_for_image(
        &self,
        image_ref: &str,
    ) -> Result<Vec<Hotspot>, PersistenceError> {
        let saved = self.saved.lock().unwrap();
        Ok(saved
            .iter()
            .flat_map(|tour| {
                tour.document
                    .images
                    .iter()
                    .filter(|image| image.stored_url.as_deref() == Some(image_ref))
                    .flat_map(|image| tour.document.hotspots_for(image.id).to_vec())
            })
            .collect())
    }

    async fn load_tour(&self, id: &TourId) -> Result<StoredTour, PersistenceError> {
        self.saved
            .lock()
            .unwrap()
            .iter()
            .find(|tour| &tour.id == id)
            .cloned()
            .ok_or_else(|| PersistenceError::NotFound(id.to_string()))
    }

    async fn list_tours(&self) -> Result<Vec<TourSummary>, PersistenceError> {
        Ok(self
            .saved
            .lock()
            .unwrap()
            .iter()
            .map(|tour| TourSummary {
                id: tour.id.clone(),
                address: tour.document.details.address.clone(),
                rooms: tour.document.details.rooms,
                bathrooms: tour.document.details.bathrooms,
                image_count: tour.document.images.len() as u32,
                hotspot_count: tour.document.hotspot_count() as u32,
                created_at: tour.created_at,
            })
            .collect())
    }
}
