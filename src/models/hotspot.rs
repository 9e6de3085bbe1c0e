//! Hotspot data models.
//!
//! Angles are degrees. Pitch lives in `[-90, 90]`; yaw is normalized into
//! `(-180, 180]`, which is the convention the panorama renderer reports.

use serde::{Deserialize, Serialize};

use super::ImageId;

/// A committed, directed edge from the panorama it is attached to towards
/// `linked_image`, placed at `(pitch, yaw)` on the source sphere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    pub name: String,
    pub linked_image: ImageId,
    pub pitch: f64,
    pub yaw: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ViewingAngle {
    pub pitch: f64,
    pub yaw: f64,
}

impl ViewingAngle {
    pub fn new(pitch: f64, yaw: f64) -> Self {
        Self { pitch, yaw }
    }

    /// Two decimals keeps the on-screen readout from jittering.
    pub fn rounded(self) -> Self {
        Self {
            pitch: round_2dp(self.pitch),
            yaw: round_2dp(self.yaw),
        }
    }
}

fn round_2dp(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn normalize_pitch(pitch: f64) -> f64 {
    pitch.clamp(-90.0, 90.0)
}

pub fn normalize_yaw(yaw: f64) -> f64 {
    // `+ 0.0` folds -0.0 into 0.0.
    let wrapped = yaw.rem_euclid(360.0) + 0.0;
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum HotspotField {
    Name,
    LinkedImage,
    Pitch,
    Yaw,
}

impl HotspotField {
    pub fn as_str(&self) -> &'static str {
        match self {
            HotspotField::Name => "name",
            HotspotField::LinkedImage => "linkedImage",
            HotspotField::Pitch => "pitch",
            HotspotField::Yaw => "yaw",
        }
    }
}

/// In-progress hotspot fields as the user typed them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StagedHotspot {
    pub name: String,
    /// Display name of the target panorama; resolved to an `ImageId` on commit.
    pub linked_image: String,
    pub pitch: String,
    pub yaw: String,
}

impl StagedHotspot {
    pub fn set(&mut self, field: HotspotField, value: String) {
        match field {
            HotspotField::Name => self.name = value,
            HotspotField::LinkedImage => self.linked_image = value,
            HotspotField::Pitch => self.pitch = value,
            HotspotField::Yaw => self.yaw = value,
        }
    }

    pub fn get(&self, field: HotspotField) -> &str {
        match field {
            HotspotField::Name => &self.name,
            HotspotField::LinkedImage => &self.linked_image,
            HotspotField::Pitch => &self.pitch,
            HotspotField::Yaw => &self.yaw,
        }
    }

    pub fn set_angle(&mut self, angle: ViewingAngle) {
        self.pitch = format!("{:.2}", angle.pitch);
        self.yaw = format!("{:.2}", angle.yaw);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
