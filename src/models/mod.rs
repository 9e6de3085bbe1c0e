pub mod hotspot;
pub mod panorama;
pub mod property;
pub mod tour;

pub use hotspot::{normalize_pitch, normalize_yaw, Hotspot, HotspotField, StagedHotspot, ViewingAngle};
pub use panorama::{ImageId, PanoramaImage};
pub use property::PropertyDetails;
pub use tour::{StoredTour, TourDocument, TourId, TourSummary};
