//! Panorama image data models.
//!
//! An image is identified by the `ImageId` the registry hands out when it is
//! uploaded. The display name is a separate, freely editable attribute, so
//! hotspots keep pointing at the right panorama across renames.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(pub u32);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanoramaImage {
    pub id: ImageId,
    pub name: String,
    /// Locally resolvable reference served by the desktop shell until the
    /// upload completes.
    pub preview: String,
    pub stored_url: Option<String>,
    pub format: String,
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    pub bytes: Arc<Vec<u8>>,
}

impl PanoramaImage {
    pub fn preview_ref(id: ImageId) -> String {
        format!("preview://{}", id.0)
    }

    pub fn is_stored(&self) -> bool {
        self.stored_url.is_some()
    }
}

impl PartialEq for PanoramaImage {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.preview == other.preview
            && self.stored_url == other.stored_url
            && self.format == other.format
            && self.width == other.width
            && self.height == other.height
    }
}
