use std::path::PathBuf;

use log::info;
use uuid::Uuid;

use crate::error::StorageError;

/// Content store for uploaded panoramas. Every upload gets a fresh UUID file
/// name, so URLs are never reused.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub async fn put(&self, bytes: &[u8]) -> Result<String, StorageError> {
        if bytes.is_empty() {
            return Err(StorageError::EmptyPayload);
        }

        let extension = image::guess_format(bytes)
            .ok()
            .and_then(|format| format.extensions_str().first().copied())
            .unwrap_or("bin");

        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(format!("{}.{extension}", Uuid::new_v4()));
        tokio::fs::write(&path, bytes).await?;

        info!("Stored {} byte panorama at {}", bytes.len(), path.display());
        Ok(format!("file://{}", path.display()))
    }
}
