use async_trait::async_trait;
use chrono::Utc;
use log::info;
use uuid::Uuid;

use crate::{
    db::Database,
    error::{PersistenceError, StorageError},
    models::{Hotspot, StoredTour, TourDocument, TourId, TourSummary},
};

use super::{validate_document, BlobStore, PersistenceGateway};

/// Gateway backed by the local filesystem (image blobs) and SQLite (tours).
#[derive(Clone)]
pub struct LocalGateway {
    db: Database,
    blobs: BlobStore,
}

impl LocalGateway {
    pub fn new(db: Database, blobs: BlobStore) -> Self {
        Self { db, blobs }
    }
}

#[async_trait]
impl PersistenceGateway for LocalGateway {
    async fn store_image(&self, bytes: &[u8]) -> Result<String, StorageError> {
        self.blobs.put(bytes).await
    }

    async fn save_tour(&self, document: &TourDocument) -> Result<TourId, PersistenceError> {
        validate_document(document)?;

        let tour = StoredTour {
            id: TourId(Uuid::new_v4().to_string()),
            created_at: Utc::now(),
            document: document.clone(),
        };
        self.db.insert_tour(&tour).await?;

        info!(
            "Saved tour {} ({} panoramas, {} hotspots)",
            tour.id,
            document.images.len(),
            document.hotspot_count()
        );
        Ok(tour.id)
    }

    async fn load_hotspots_for_image(
        &self,
        image_ref: &str,
    ) -> Result<Vec<Hotspot>, PersistenceError> {
        Ok(self.db.hotspots_for_stored_image(image_ref).await?)
    }

    async fn load_tour(&self, id: &TourId) -> Result<StoredTour, PersistenceError> {
        self.db
            .get_tour(id)
            .await?
            .ok_or_else(|| PersistenceError::NotFound(id.to_string()))
    }

    async fn list_tours(&self) -> Result<Vec<TourSummary>, PersistenceError> {
        Ok(self.db.list_tours().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::ImageId, test_support::document_with_link};

    fn gateway(dir: &tempfile::TempDir) -> LocalGateway {
        let db = Database::new(dir.path().join("tours.sqlite3")).unwrap();
        LocalGateway::new(db, BlobStore::new(dir.path().join("blobs")))
    }

    #[tokio::test]
    async fn saved_tour_round_trips_through_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = gateway(&dir);
        let document = document_with_link();

        let id = gateway.save_tour(&document).await.unwrap();
        let stored = gateway.load_tour(&id).await.unwrap();

        assert_eq!(stored.id, id);
        assert_eq!(stored.document, document);

        let summaries = gateway.list_tours().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].image_count, 2);
        assert_eq!(summaries[0].hotspot_count, 1);
        assert_eq!(summaries[0].address, document.details.address);
    }

    #[tokio::test]
    async fn hotspots_are_readable_per_stored_image() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = gateway(&dir);
        let document = document_with_link();
        gateway.save_tour(&document).await.unwrap();

        let lobby_url = document.images[0].stored_url.clone().unwrap();
        let hall_url = document.images[1].stored_url.clone().unwrap();

        let lobby = gateway.load_hotspots_for_image(&lobby_url).await.unwrap();
        assert_eq!(lobby, document.hotspots_for(ImageId(0)).to_vec());
        assert!(gateway
            .load_hotspots_for_image(&hall_url)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn invalid_document_is_rejected_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = gateway(&dir);
        let mut document = document_with_link();
        document.images.pop();

        assert!(matches!(
            gateway.save_tour(&document).await,
            Err(PersistenceError::Schema(_))
        ));
        assert!(gateway.list_tours().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_tour_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = gateway(&dir);
        assert!(matches!(
            gateway.load_tour(&TourId("nope".into())).await,
            Err(PersistenceError::NotFound(_))
        ));
    }
}
