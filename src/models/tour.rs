//! Tour aggregate models.
//!
//! `TourDocument` is the unit handed to the persistence gateway when the
//! wizard finishes: property details, the ordered panoramas and the hotspot
//! graph keyed by source image.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Hotspot, ImageId, PanoramaImage, PropertyDetails};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TourId(pub String);

impl fmt::Display for TourId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TourDocument {
    pub details: PropertyDetails,
    pub images: Vec<PanoramaImage>,
    pub hotspots: BTreeMap<ImageId, Vec<Hotspot>>,
}

impl TourDocument {
    pub fn image(&self, id: ImageId) -> Option<&PanoramaImage> {
        self.images.iter().find(|image| image.id == id)
    }

    pub fn hotspots_for(&self, source: ImageId) -> &[Hotspot] {
        self.hotspots
            .get(&source)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn hotspot_count(&self) -> usize {
        self.hotspots.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTour {
    pub id: TourId,
    pub created_at: DateTime<Utc>,
    pub document: TourDocument,
}

/// Summary of a saved tour for list views
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourSummary {
    pub id: TourId,
    pub address: String,
    pub rooms: u32,
    pub bathrooms: u32,
    pub image_count: u32,
    pub hotspot_count: u32,
    pub created_at: DateTime<Utc>,
}
