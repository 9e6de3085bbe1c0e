use std::collections::BTreeMap;

use crate::{
    error::{TourError, TourResult},
    models::{
        normalize_pitch, normalize_yaw, Hotspot, HotspotField, ImageId, StagedHotspot,
        ViewingAngle,
    },
};

use super::PanoramaRegistry;

/// Directed hotspot graph plus the staging buffer new hotspots are edited in.
#[derive(Debug, Clone, Default)]
pub struct HotspotGraph {
    edges: BTreeMap<ImageId, Vec<Hotspot>>,
    staged: StagedHotspot,
}

impl HotspotGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn staged(&self) -> &StagedHotspot {
        &self.staged
    }

    /// Copies a captured angle into the buffer; name and link are untouched.
    pub fn stage_from_angle(&mut self, angle: ViewingAngle) {
        self.staged.set_angle(angle);
    }

    pub fn set_staged_field(&mut self, field: HotspotField, value: String) {
        self.staged.set(field, value);
    }

    pub fn clear_staging(&mut self) {
        self.staged.clear();
    }

    /// The only way into the graph. On any error both the graph and the
    /// staging buffer are left as they were.
    pub fn commit_hotspot(
        &mut self,
        source: ImageId,
        registry: &PanoramaRegistry,
    ) -> TourResult<Hotspot> {
        let (pitch, yaw) = self.validate_staged()?;

        if !registry.contains(source) {
            return Err(TourError::UnknownImage(source));
        }
        let linked_image = registry.resolve_name(&self.staged.linked_image)?;

        let hotspot = Hotspot {
            name: self.staged.name.trim().to_string(),
            linked_image,
            pitch: normalize_pitch(pitch),
            yaw: normalize_yaw(yaw),
        };

        self.edges.entry(source).or_default().push(hotspot.clone());
        self.staged.clear();

        Ok(hotspot)
    }

    fn validate_staged(&self) -> TourResult<(f64, f64)> {
        let missing: Vec<&str> = [
            HotspotField::Name,
            HotspotField::LinkedImage,
            HotspotField::Pitch,
            HotspotField::Yaw,
        ]
        .into_iter()
        .filter(|field| self.staged.get(*field).trim().is_empty())
        .map(|field| field.as_str())
        .collect();

        if !missing.is_empty() {
            return Err(TourError::IncompleteHotspot(format!(
                "missing {}",
                missing.join(", ")
            )));
        }

        let pitch = parse_angle(&self.staged.pitch, HotspotField::Pitch)?;
        let yaw = parse_angle(&self.staged.yaw, HotspotField::Yaw)?;
        Ok((pitch, yaw))
    }

    /// Committed hotspots of `source` in commit order. The iterator is
    /// cloneable, so callers can walk it more than once.
    pub fn hotspots_for(&self, source: ImageId) -> std::slice::Iter<'_, Hotspot> {
        self.edges
            .get(&source)
            .map(|hotspots| hotspots.iter())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn edges(&self) -> &BTreeMap<ImageId, Vec<Hotspot>> {
        &self.edges
    }
}

fn parse_angle(raw: &str, field: HotspotField) -> TourResult<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| {
            TourError::IncompleteHotspot(format!("{} '{}' is not a number", field.as_str(), raw))
        })
}
