#[cfg(feature = "desktop")]
pub mod commands;
pub mod controller;
pub mod events;
pub mod graph;
pub mod registry;
pub mod state;

pub use controller::TourController;
pub use events::TourEvent;
pub use graph::HotspotGraph;
pub use registry::PanoramaRegistry;
pub use state::{WizardSession, WizardSnapshot, WizardStep};
