//! Walking a finished tour the way a visitor would: start at one panorama
//! and step through hotspots.

use std::collections::{BTreeSet, VecDeque};

use serde::Serialize;

use crate::{
    error::{TourError, TourResult},
    models::{Hotspot, ImageId, PanoramaImage, TourDocument},
};

pub struct TourWalker<'a> {
    document: &'a TourDocument,
    current: &'a PanoramaImage,
    trail: Vec<ImageId>,
}

impl<'a> TourWalker<'a> {
    pub fn start(document: &'a TourDocument, entry: ImageId) -> TourResult<Self> {
        let current = document
            .image(entry)
            .ok_or(TourError::UnknownImage(entry))?;
        Ok(Self {
            document,
            current,
            trail: Vec::new(),
        })
    }

    /// Starts at the first uploaded panorama, if there is one.
    pub fn from_first(document: &'a TourDocument) -> Option<Self> {
        let entry = document.images.first()?.id;
        Self::start(document, entry).ok()
    }

    pub fn current(&self) -> &'a PanoramaImage {
        self.current
    }

    pub fn hotspots(&self) -> &'a [Hotspot] {
        self.document.hotspots_for(self.current.id)
    }

    pub fn follow(&mut self, index: usize) -> TourResult<&'a PanoramaImage> {
        let hotspot = self
            .hotspots()
            .get(index)
            .ok_or(TourError::NoSuchHotspot {
                image: self.current.id,
                index,
            })?;
        let target = self
            .document
            .image(hotspot.linked_image)
            .ok_or(TourError::UnknownImage(hotspot.linked_image))?;

        self.trail.push(self.current.id);
        self.current = target;
        Ok(target)
    }

    fn stop(&self) -> TourStop {
        TourStop {
            image: self.current().clone(),
            hotspots: self.hotspots().to_vec(),
            trail: self.trail.clone(),
        }
    }
}

/// Where a visitor stands after a walk: the panorama on screen, the hotspots
/// they can take from it and the panoramas they came through.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TourStop {
    pub image: PanoramaImage,
    pub hotspots: Vec<Hotspot>,
    pub trail: Vec<ImageId>,
}

/// Enters the tour at its first panorama and takes the hotspot at each index
/// of `path` in turn. An empty path returns the entry panorama.
pub fn walk(document: &TourDocument, path: &[usize]) -> TourResult<TourStop> {
    let mut walker = TourWalker::from_first(document).ok_or(TourError::EmptyTour)?;
    for &index in path {
        walker.follow(index)?;
    }
    Ok(walker.stop())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TourDiagnostics {
    pub entry: Option<ImageId>,
    pub unreachable: Vec<ImageId>,
}

/// Breadth-first over hotspot links, ignoring ones that dangle.
pub fn reachable_from(document: &TourDocument, entry: ImageId) -> BTreeSet<ImageId> {
    let mut seen = BTreeSet::new();
    if document.image(entry).is_none() {
        return seen;
    }

    let mut queue = VecDeque::from([entry]);
    seen.insert(entry);
    while let Some(image) = queue.pop_front() {
        for hotspot in document.hotspots_for(image) {
            let target = hotspot.linked_image;
            if document.image(target).is_some() && seen.insert(target) {
                queue.push_back(target);
            }
        }
    }
    seen
}

pub fn unreachable_from(document: &TourDocument, entry: ImageId) -> Vec<ImageId> {
    let reachable = reachable_from(document, entry);
    document
        .images
        .iter()
        .map(|image| image.id)
        .filter(|id| !reachable.contains(id))
        .collect()
}

/// Reachability is measured from the first panorama, which is where a
/// viewer opens the tour.
pub fn diagnose(document: &TourDocument) -> TourDiagnostics {
    let entry = document.images.first().map(|image| image.id);
    TourDiagnostics {
        entry,
        unreachable: entry
            .map(|entry| unreachable_from(document, entry))
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::document_with_link;

    fn hotspot(name: &str, target: u32) -> Hotspot {
        Hotspot {
            name: name.into(),
            linked_image: ImageId(target),
            pitch: 0.0,
            yaw: 0.0,
        }
    }

    #[test]
    fn walker_follows_hotspots() {
        let document = document_with_link();
        let mut walker = TourWalker::from_first(&document).unwrap();
        assert_eq!(walker.current().name, "Lobby");
        assert_eq!(walker.hotspots().len(), 1);

        let hall = walker.follow(0).unwrap();
        assert_eq!(hall.name, "Hall");
        assert!(walker.hotspots().is_empty());
        assert_eq!(walker.stop().trail, vec![ImageId(0)]);
    }

    #[test]
    fn walk_returns_the_stop_at_the_end_of_the_path() {
        let document = document_with_link();

        let entry = walk(&document, &[]).unwrap();
        assert_eq!(entry.image.name, "Lobby");
        assert_eq!(entry.hotspots[0].name, "Door");
        assert!(entry.trail.is_empty());

        let hall = walk(&document, &[0]).unwrap();
        assert_eq!(hall.image.id, ImageId(1));
        assert!(hall.hotspots.is_empty());
        assert_eq!(hall.trail, vec![ImageId(0)]);
    }

    #[test]
    fn following_a_missing_hotspot_fails_in_place() {
        let document = document_with_link();
        let mut walker = TourWalker::start(&document, ImageId(1)).unwrap();
        assert!(matches!(
            walker.follow(0),
            Err(TourError::NoSuchHotspot { index: 0, .. })
        ));
        assert_eq!(walker.current().id, ImageId(1));
        assert!(TourWalker::start(&document, ImageId(9)).is_err());
        assert!(matches!(
            walk(&document, &[0, 0]),
            Err(TourError::NoSuchHotspot { index: 0, .. })
        ));
    }

    #[test]
    fn hall_is_a_dead_end_for_reachability_from_hall() {
        let document = document_with_link();
        assert!(unreachable_from(&document, ImageId(0)).is_empty());
        assert_eq!(unreachable_from(&document, ImageId(1)), vec![ImageId(0)]);
    }

    #[test]
    fn links_to_missing_images_are_not_followed() {
        let mut document = document_with_link();
        document
            .hotspots
            .entry(ImageId(1))
            .or_default()
            .push(hotspot("Garden", 7));

        let mut walker = TourWalker::start(&document, ImageId(1)).unwrap();
        assert!(matches!(
            walker.follow(0),
            Err(TourError::UnknownImage(ImageId(7)))
        ));
        assert_eq!(
            reachable_from(&document, ImageId(1)),
            BTreeSet::from([ImageId(1)])
        );
    }

    #[test]
    fn diagnose_measures_from_the_first_panorama() {
        let mut document = document_with_link();
        document.images.swap(0, 1);

        let diagnostics = diagnose(&document);
        assert_eq!(diagnostics.entry, Some(ImageId(1)));
        assert_eq!(diagnostics.unreachable, vec![ImageId(0)]);
    }

    #[test]
    fn empty_tour_has_no_entry() {
        let document = TourDocument::default();
        assert!(TourWalker::from_first(&document).is_none());
        assert!(matches!(walk(&document, &[]), Err(TourError::EmptyTour)));
        assert_eq!(diagnose(&document), TourDiagnostics::default());
    }
}
