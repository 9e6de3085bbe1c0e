use std::{io::Cursor, sync::Arc};

use image::ImageReader;

use crate::{
    error::{TourError, TourResult},
    models::{ImageId, PanoramaImage},
};

pub const DEFAULT_MAX_IMAGE_BYTES: usize = 64 * 1024 * 1024;

/// Ordered collection of the panoramas uploaded for one tour.
#[derive(Debug, Clone)]
pub struct PanoramaRegistry {
    images: Vec<PanoramaImage>,
    next_id: u32,
    max_image_bytes: usize,
}

impl Default for PanoramaRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IMAGE_BYTES)
    }
}

impl PanoramaRegistry {
    pub fn new(max_image_bytes: usize) -> Self {
        Self {
            images: Vec::new(),
            next_id: 0,
            max_image_bytes,
        }
    }

    /// Registers a new panorama. Only the header is inspected; decoding the
    /// full equirectangular image is the renderer's job.
    pub fn add_image(&mut self, bytes: Vec<u8>, suggested_name: &str) -> TourResult<ImageId> {
        if bytes.is_empty() {
            return Err(TourError::InvalidImage("payload is empty".into()));
        }
        if bytes.len() > self.max_image_bytes {
            return Err(TourError::InvalidImage(format!(
                "payload is {} bytes, limit is {}",
                bytes.len(),
                self.max_image_bytes
            )));
        }

        let (format, width, height) = inspect_header(&bytes)?;

        let id = ImageId(self.next_id);
        self.next_id += 1;

        self.images.push(PanoramaImage {
            id,
            name: suggested_name.trim().to_string(),
            preview: PanoramaImage::preview_ref(id),
            stored_url: None,
            format,
            width,
            height,
            bytes: Arc::new(bytes),
        });

        Ok(id)
    }

    /// Links reference `ImageId`, so a rename never orphans a hotspot.
    /// Names are not required to be unique.
    pub fn rename_image(&mut self, id: ImageId, new_name: &str) -> TourResult<()> {
        let image = self.image_mut(id)?;
        image.name = new_name.trim().to_string();
        Ok(())
    }

    pub fn list_images(&self) -> &[PanoramaImage] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn contains(&self, id: ImageId) -> bool {
        self.images.iter().any(|image| image.id == id)
    }

    pub fn image(&self, id: ImageId) -> TourResult<&PanoramaImage> {
        self.images
            .iter()
            .find(|image| image.id == id)
            .ok_or(TourError::UnknownImage(id))
    }

    fn image_mut(&mut self, id: ImageId) -> TourResult<&mut PanoramaImage> {
        self.images
            .iter_mut()
            .find(|image| image.id == id)
            .ok_or(TourError::UnknownImage(id))
    }

    pub fn bytes(&self, id: ImageId) -> TourResult<Arc<Vec<u8>>> {
        self.image(id).map(|image| Arc::clone(&image.bytes))
    }

    /// Resolves a display name to exactly one image.
    pub fn resolve_name(&self, name: &str) -> TourResult<ImageId> {
        let name = name.trim();
        let mut matches = self.images.iter().filter(|image| image.name == name);
        match (matches.next(), matches.count()) {
            (None, _) => Err(TourError::UnresolvedLink(name.to_string())),
            (Some(image), 0) => Ok(image.id),
            (Some(_), extra) => Err(TourError::AmbiguousLink {
                name: name.to_string(),
                count: extra + 1,
            }),
        }
    }

    pub fn attach_stored_url(&mut self, id: ImageId, url: String) -> TourResult<()> {
        let image = self.image_mut(id)?;
        image.stored_url = Some(url);
        Ok(())
    }

    pub fn pending_uploads(&self) -> impl Iterator<Item = ImageId> + '_ {
        self.images
            .iter()
            .filter(|image| !image.is_stored())
            .map(|image| image.id)
    }
}

fn inspect_header(bytes: &[u8]) -> TourResult<(String, u32, u32)> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| TourError::InvalidImage(err.to_string()))?;

    let format = reader
        .format()
        .ok_or_else(|| TourError::InvalidImage("unrecognized image format".into()))?;
    let extension = format
        .extensions_str()
        .first()
        .copied()
        .unwrap_or("bin")
        .to_string();

    let (width, height) = reader
        .into_dimensions()
        .map_err(|err| TourError::InvalidImage(err.to_string()))?;

    Ok((extension, width, height))
}
