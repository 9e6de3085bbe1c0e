use thiserror::Error;

use crate::{models::ImageId, tour::WizardStep};

/// Failures of the blob store behind `PersistenceGateway::store_image`.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("image payload is empty")]
    EmptyPayload,
    #[error("blob store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Failures of the tour document store.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("tour document rejected: {0}")]
    Schema(String),
    #[error("tour {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum TourError {
    #[error("invalid image: {0}")]
    InvalidImage(String),
    #[error("incomplete hotspot: {0}")]
    IncompleteHotspot(String),
    #[error("transition refused: {0}")]
    TransitionRefused(String),
    #[error("not available in the {actual:?} step (requires {expected:?})")]
    WrongStep {
        expected: WizardStep,
        actual: WizardStep,
    },
    #[error("unknown image {0}")]
    UnknownImage(ImageId),
    #[error("panorama {image} has no hotspot #{index}")]
    NoSuchHotspot { image: ImageId, index: usize },
    #[error("tour has no panoramas")]
    EmptyTour,
    #[error("no image named '{0}'")]
    UnresolvedLink(String),
    #[error("{count} images are named '{name}'; rename one before linking")]
    AmbiguousLink { name: String, count: usize },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub type TourResult<T> = std::result::Result<T, TourError>;
