pub mod controller;
pub mod loop_worker;

pub use controller::AngleSampler;

use serde::{Deserialize, Serialize};

use crate::models::ViewingAngle;

/// What the panorama renderer reports about the user's camera.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum ViewerEvent {
    PointerMoved(ViewingAngle),
    /// Double-click / double-tap on a point of interest.
    Captured(ViewingAngle),
}
