use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{TourError, TourResult},
    models::{
        Hotspot, HotspotField, ImageId, PanoramaImage, PropertyDetails, StagedHotspot,
        TourDocument, ViewingAngle,
    },
};

use super::{HotspotGraph, PanoramaRegistry};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum WizardStep {
    Details,
    Images,
    Hotspots,
}

impl Default for WizardStep {
    fn default() -> Self {
        WizardStep::Details
    }
}

/// One authoring session: everything the user has entered since the wizard
/// was opened. Owned by the session until `finish` hands it off.
#[derive(Debug, Clone)]
pub struct WizardSession {
    id: String,
    step: WizardStep,
    details: PropertyDetails,
    registry: PanoramaRegistry,
    graph: HotspotGraph,
    selected: Option<ImageId>,
}

/// Serializable view of the session for the front-end.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardSnapshot {
    pub session_id: String,
    pub step: WizardStep,
    pub details: PropertyDetails,
    pub images: Vec<PanoramaImage>,
    pub selected_image: Option<ImageId>,
    pub staged: StagedHotspot,
    pub live_angle: Option<ViewingAngle>,
    pub hotspot_count: usize,
}

impl WizardSession {
    pub fn new(max_image_bytes: usize) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            step: WizardStep::Details,
            details: PropertyDetails::default(),
            registry: PanoramaRegistry::new(max_image_bytes),
            graph: HotspotGraph::new(),
            selected: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn details(&self) -> &PropertyDetails {
        &self.details
    }

    pub fn registry(&self) -> &PanoramaRegistry {
        &self.registry
    }

    pub fn graph(&self) -> &HotspotGraph {
        &self.graph
    }

    pub fn selected_image(&self) -> Option<ImageId> {
        self.selected
    }

    fn require_step(&self, expected: WizardStep) -> TourResult<()> {
        if self.step == expected {
            Ok(())
        } else {
            Err(TourError::WrongStep {
                expected,
                actual: self.step,
            })
        }
    }

    /// Details -> Images is deliberately unguarded; Images -> Hotspots needs
    /// at least one panorama.
    pub fn next(&mut self) -> TourResult<WizardStep> {
        self.step = match self.step {
            WizardStep::Details => WizardStep::Images,
            WizardStep::Images => {
                if self.registry.is_empty() {
                    return Err(TourError::TransitionRefused(
                        "upload at least one panorama before adding hotspots".into(),
                    ));
                }
                WizardStep::Hotspots
            }
            WizardStep::Hotspots => {
                return Err(TourError::TransitionRefused(
                    "hotspots is the last step; finish the tour instead".into(),
                ))
            }
        };
        Ok(self.step)
    }

    pub fn back(&mut self) -> TourResult<WizardStep> {
        self.step = match self.step {
            WizardStep::Details => {
                return Err(TourError::TransitionRefused(
                    "already at the first step".into(),
                ))
            }
            WizardStep::Images => WizardStep::Details,
            WizardStep::Hotspots => WizardStep::Images,
        };
        Ok(self.step)
    }

    pub fn update_details(&mut self, details: PropertyDetails) -> TourResult<()> {
        self.require_step(WizardStep::Details)?;
        self.details = details;
        Ok(())
    }

    pub fn add_image(&mut self, bytes: Vec<u8>, suggested_name: &str) -> TourResult<ImageId> {
        self.require_step(WizardStep::Images)?;
        self.registry.add_image(bytes, suggested_name)
    }

    pub fn rename_image(&mut self, id: ImageId, new_name: &str) -> TourResult<()> {
        self.require_step(WizardStep::Images)?;
        self.registry.rename_image(id, new_name)
    }

    /// Upload results arrive asynchronously and are accepted in any step.
    pub fn attach_stored_url(&mut self, id: ImageId, url: String) -> TourResult<()> {
        self.registry.attach_stored_url(id, url)
    }

    /// Switches the panorama being annotated. Staging is reset; committed
    /// hotspots of every image stay.
    pub fn select_image(&mut self, id: ImageId) -> TourResult<()> {
        self.require_step(WizardStep::Hotspots)?;
        if !self.registry.contains(id) {
            return Err(TourError::UnknownImage(id));
        }
        self.selected = Some(id);
        self.graph.clear_staging();
        Ok(())
    }

    pub fn stage_from_angle(&mut self, angle: ViewingAngle) -> TourResult<()> {
        self.require_step(WizardStep::Hotspots)?;
        self.graph.stage_from_angle(angle);
        Ok(())
    }

    pub fn set_staged_field(&mut self, field: HotspotField, value: String) -> TourResult<()> {
        self.require_step(WizardStep::Hotspots)?;
        self.graph.set_staged_field(field, value);
        Ok(())
    }

    /// Commits the staged hotspot onto the selected panorama.
    pub fn commit_hotspot(&mut self) -> TourResult<(ImageId, Hotspot)> {
        self.require_step(WizardStep::Hotspots)?;
        let source = self.selected.ok_or_else(|| {
            TourError::IncompleteHotspot("select a panorama before adding hotspots".into())
        })?;
        let hotspot = self.graph.commit_hotspot(source, &self.registry)?;
        Ok((source, hotspot))
    }

    pub fn hotspots_for(&self, source: ImageId) -> std::slice::Iter<'_, Hotspot> {
        self.graph.hotspots_for(source)
    }

    /// Assembles the aggregate for the gateway. The session keeps its data
    /// so a failed save can be retried.
    pub fn to_document(&self) -> TourResult<TourDocument> {
        if self.step != WizardStep::Hotspots {
            return Err(TourError::TransitionRefused(format!(
                "finish is only available from the hotspots step (currently {:?})",
                self.step
            )));
        }

        Ok(self.draft())
    }

    /// The document as it stands, whatever the step.
    pub fn draft(&self) -> TourDocument {
        TourDocument {
            details: self.details.clone(),
            images: self.registry.list_images().to_vec(),
            hotspots: self.graph.edges().clone(),
        }
    }

    /// The live angle is owned by the sampler, so the caller supplies it.
    pub fn snapshot(&self, live_angle: Option<ViewingAngle>) -> WizardSnapshot {
        WizardSnapshot {
            session_id: self.id.clone(),
            step: self.step,
            details: self.details.clone(),
            images: self.registry.list_images().to_vec(),
            selected_image: self.selected,
            staged: self.graph.staged().clone(),
            live_angle,
            hotspot_count: self.graph.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test_support::sample_png, tour::registry::DEFAULT_MAX_IMAGE_BYTES};

    fn fresh_session() -> WizardSession {
        WizardSession::new(DEFAULT_MAX_IMAGE_BYTES)
    }

    fn stage(session: &mut WizardSession, name: &str, link: &str, pitch: &str, yaw: &str) {
        session.set_staged_field(HotspotField::Name, name.into()).unwrap();
        session
            .set_staged_field(HotspotField::LinkedImage, link.into())
            .unwrap();
        session.set_staged_field(HotspotField::Pitch, pitch.into()).unwrap();
        session.set_staged_field(HotspotField::Yaw, yaw.into()).unwrap();
    }

    /// Lobby + Hall uploaded, now in the Hotspots step with Lobby selected.
    fn annotating_session() -> (WizardSession, ImageId, ImageId) {
        let mut session = fresh_session();
        session.next().unwrap();
        let lobby = session.add_image(sample_png(8, 4), "Lobby").unwrap();
        let hall = session.add_image(sample_png(8, 4), "Hall").unwrap();
        session.next().unwrap();
        session.select_image(lobby).unwrap();
        (session, lobby, hall)
    }

    #[test]
    fn details_to_images_is_unguarded() {
        let mut session = fresh_session();
        assert_eq!(session.step(), WizardStep::Details);
        assert_eq!(session.next().unwrap(), WizardStep::Images);
        assert_eq!(session.details(), &PropertyDetails::default());
    }

    #[test]
    fn images_to_hotspots_requires_a_panorama() {
        let mut session = fresh_session();
        session.next().unwrap();

        assert!(matches!(
            session.next(),
            Err(TourError::TransitionRefused(_))
        ));
        assert_eq!(session.step(), WizardStep::Images);

        session.add_image(sample_png(4, 2), "Lobby").unwrap();
        assert_eq!(session.next().unwrap(), WizardStep::Hotspots);
    }

    #[test]
    fn hotspots_step_never_reached_without_images() {
        // Every transition sequence of length <= 6 from a fresh session.
        for mask in 0u32..(1 << 6) {
            let mut session = fresh_session();
            for bit in 0..6 {
                let _ = if mask & (1 << bit) != 0 {
                    session.next()
                } else {
                    session.back()
                };
                if session.step() == WizardStep::Hotspots {
                    assert!(!session.registry().is_empty());
                }
            }
            assert_ne!(session.step(), WizardStep::Hotspots);
        }
    }

    #[test]
    fn back_then_next_is_lossless() {
        let (mut session, lobby, _) = annotating_session();
        stage(&mut session, "Door", "Hall", "10", "180");
        session.commit_hotspot().unwrap();

        let images_before = session.registry().list_images().to_vec();
        let edges_before = session.graph().edges().clone();

        assert_eq!(session.back().unwrap(), WizardStep::Images);
        assert_eq!(session.next().unwrap(), WizardStep::Hotspots);
        assert_eq!(session.registry().list_images(), images_before.as_slice());
        assert_eq!(session.graph().edges(), &edges_before);

        assert_eq!(session.back().unwrap(), WizardStep::Images);
        assert_eq!(session.back().unwrap(), WizardStep::Details);
        assert_eq!(session.next().unwrap(), WizardStep::Images);
        assert_eq!(session.registry().list_images(), images_before.as_slice());
        assert_eq!(session.graph().edges(), &edges_before);
        assert_eq!(session.hotspots_for(lobby).count(), 1);
    }

    #[test]
    fn next_from_hotspots_and_back_from_details_are_refused() {
        let (mut session, _, _) = annotating_session();
        assert!(matches!(
            session.next(),
            Err(TourError::TransitionRefused(_))
        ));

        let mut fresh = fresh_session();
        assert!(matches!(
            fresh.back(),
            Err(TourError::TransitionRefused(_))
        ));
    }

    #[test]
    fn edits_are_scoped_to_their_step() {
        let mut session = fresh_session();
        assert!(matches!(
            session.add_image(sample_png(4, 2), "Lobby"),
            Err(TourError::WrongStep {
                expected: WizardStep::Images,
                actual: WizardStep::Details
            })
        ));

        session.next().unwrap();
        assert!(matches!(
            session.update_details(PropertyDetails::default()),
            Err(TourError::WrongStep { .. })
        ));
        assert!(matches!(
            session.set_staged_field(HotspotField::Name, "Door".into()),
            Err(TourError::WrongStep { .. })
        ));
    }

    #[test]
    fn lobby_door_to_hall_scenario() {
        let (mut session, lobby, hall) = annotating_session();

        session
            .stage_from_angle(ViewingAngle::new(10.0, 180.0))
            .unwrap();
        session.set_staged_field(HotspotField::Name, "Door".into()).unwrap();
        session
            .set_staged_field(HotspotField::LinkedImage, "Hall".into())
            .unwrap();

        let (source, committed) = session.commit_hotspot().unwrap();
        assert_eq!(source, lobby);

        let hotspots: Vec<_> = session.hotspots_for(lobby).cloned().collect();
        assert_eq!(
            hotspots,
            vec![Hotspot {
                name: "Door".into(),
                linked_image: hall,
                pitch: 10.0,
                yaw: 180.0,
            }]
        );
        assert_eq!(committed, hotspots[0]);
        assert_eq!(
            session.registry().image(hotspots[0].linked_image).unwrap().name,
            "Hall"
        );
    }

    #[test]
    fn renaming_after_linking_keeps_the_link_on_the_same_image() {
        let (mut session, lobby, hall) = annotating_session();
        stage(&mut session, "Door", "Hall", "0", "90");
        session.commit_hotspot().unwrap();

        session.back().unwrap();
        session.rename_image(hall, "Grand Hall").unwrap();
        session.next().unwrap();

        let hotspot = session.hotspots_for(lobby).next().unwrap().clone();
        assert_eq!(hotspot.linked_image, hall);
        assert_eq!(
            session.registry().image(hotspot.linked_image).unwrap().name,
            "Grand Hall"
        );
        // The old name no longer resolves for new links.
        assert!(matches!(
            session.registry().resolve_name("Hall"),
            Err(TourError::UnresolvedLink(_))
        ));
    }

    #[test]
    fn selecting_an_image_resets_staging_but_keeps_hotspots() {
        let (mut session, lobby, hall) = annotating_session();
        stage(&mut session, "Door", "Hall", "1", "2");
        session.commit_hotspot().unwrap();

        stage(&mut session, "Half", "Lobby", "3", "");
        session.select_image(hall).unwrap();

        assert_eq!(session.selected_image(), Some(hall));
        assert_eq!(session.graph().staged(), &StagedHotspot::default());
        assert_eq!(session.hotspots_for(lobby).count(), 1);
    }

    #[test]
    fn commit_without_selection_is_incomplete() {
        let mut session = fresh_session();
        session.next().unwrap();
        session.add_image(sample_png(4, 2), "Lobby").unwrap();
        session.next().unwrap();
        stage(&mut session, "Door", "Lobby", "1", "2");

        assert!(matches!(
            session.commit_hotspot(),
            Err(TourError::IncompleteHotspot(_))
        ));
    }

    #[test]
    fn document_is_only_available_from_hotspots() {
        let session = fresh_session();
        assert!(matches!(
            session.to_document(),
            Err(TourError::TransitionRefused(_))
        ));

        let (session, lobby, _) = annotating_session();
        let document = session.to_document().unwrap();
        assert_eq!(document.images.len(), 2);
        assert!(document.hotspots_for(lobby).is_empty());
        // The session still owns its data.
        assert_eq!(session.registry().len(), 2);
    }
}
