use std::sync::Arc;

use log::{error, info, warn};
use tokio::sync::{broadcast, watch, Mutex};

use crate::{
    error::{TourError, TourResult},
    gateway::PersistenceGateway,
    models::{
        Hotspot, HotspotField, ImageId, PanoramaImage, PropertyDetails, StagedHotspot,
        StoredTour, TourId, TourSummary, ViewingAngle,
    },
    navigation::{self, TourDiagnostics, TourStop},
    sampler::{AngleSampler, ViewerEvent},
    settings::ViewerSettings,
};

use super::{TourEvent, WizardSession, WizardSnapshot, WizardStep};

const EVENT_BUFFER: usize = 128;

/// Async entry point for the authoring UI.
///
/// Lock order: the session mutex is never held while the sampler mutex is
/// acquired, and neither is held across a gateway call.
#[derive(Clone)]
pub struct TourController {
    session: Arc<Mutex<WizardSession>>,
    sampler: Arc<Mutex<AngleSampler>>,
    live_angle: watch::Receiver<Option<ViewingAngle>>,
    gateway: Arc<dyn PersistenceGateway>,
    events: broadcast::Sender<TourEvent>,
    finishing: Arc<Mutex<()>>,
    viewer: ViewerSettings,
    max_image_bytes: usize,
}

impl TourController {
    pub fn new(
        gateway: Arc<dyn PersistenceGateway>,
        viewer: ViewerSettings,
        max_image_bytes: usize,
    ) -> Self {
        let sampler = AngleSampler::new();
        let live_angle = sampler.subscribe();
        let (events, _) = broadcast::channel(EVENT_BUFFER);

        Self {
            session: Arc::new(Mutex::new(WizardSession::new(max_image_bytes))),
            sampler: Arc::new(Mutex::new(sampler)),
            live_angle,
            gateway,
            events,
            finishing: Arc::new(Mutex::new(())),
            viewer,
            max_image_bytes,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TourEvent> {
        self.events.subscribe()
    }

    pub fn subscribe_angle(&self) -> watch::Receiver<Option<ViewingAngle>> {
        self.live_angle.clone()
    }

    pub async fn snapshot(&self) -> WizardSnapshot {
        let live = *self.live_angle.borrow();
        self.session.lock().await.snapshot(live)
    }

    fn emit(&self, event: TourEvent) {
        // No subscribers is fine; the UI may not be listening yet.
        let _ = self.events.send(event);
    }

    pub async fn update_details(&self, details: PropertyDetails) -> TourResult<()> {
        self.session.lock().await.update_details(details)
    }

    pub async fn next(&self) -> TourResult<WizardStep> {
        let (step, selected, session_id) = {
            let mut session = self.session.lock().await;
            let step = session.next()?;
            (step, session.selected_image(), session.id().to_string())
        };

        // The step has changed even if the sampler fails to attach below.
        self.emit(TourEvent::StepChanged { step });
        if let (WizardStep::Hotspots, Some(image)) = (step, selected) {
            self.attach_sampler(session_id, image).await?;
        }
        Ok(step)
    }

    pub async fn back(&self) -> TourResult<WizardStep> {
        let step = self.session.lock().await.back()?;

        if step == WizardStep::Images {
            self.release_sampler().await;
        }
        self.emit(TourEvent::StepChanged { step });
        Ok(step)
    }

    /// Registers the image locally and starts its upload in the background.
    /// The image is usable for linking right away; `ImageStored` or
    /// `ImageUploadFailed` follows later.
    pub async fn add_image(&self, bytes: Vec<u8>, suggested_name: &str) -> TourResult<PanoramaImage> {
        let (session_id, image) = {
            let mut session = self.session.lock().await;
            let id = session.add_image(bytes, suggested_name)?;
            let image = session.registry().image(id)?.clone();
            (session.id().to_string(), image)
        };

        info!(
            "Added panorama {} '{}' ({}x{} {})",
            image.id, image.name, image.width, image.height, image.format
        );
        self.emit(TourEvent::ImageAdded {
            image: image.clone(),
        });
        self.spawn_upload(session_id, image.id, Arc::clone(&image.bytes));
        Ok(image)
    }

    /// Re-runs the upload of an image that has no stored URL yet. Already
    /// stored images are left alone.
    pub async fn retry_upload(&self, id: ImageId) -> TourResult<()> {
        let (session_id, bytes) = {
            let session = self.session.lock().await;
            let image = session.registry().image(id)?;
            if image.is_stored() {
                return Ok(());
            }
            (session.id().to_string(), Arc::clone(&image.bytes))
        };

        self.spawn_upload(session_id, id, bytes);
        Ok(())
    }

    fn spawn_upload(&self, session_id: String, image: ImageId, bytes: Arc<Vec<u8>>) {
        let gateway = Arc::clone(&self.gateway);
        let session = Arc::clone(&self.session);
        let events = self.events.clone();

        tokio::spawn(async move {
            match gateway.store_image(&bytes).await {
                Ok(url) => {
                    {
                        let mut session = session.lock().await;
                        if session.id() != session_id {
                            warn!("Discarding upload of panorama {image}: its session has ended");
                            return;
                        }
                        if let Err(err) = session.attach_stored_url(image, url.clone()) {
                            warn!("Discarding upload of panorama {image}: {err}");
                            return;
                        }
                    }
                    info!("Stored panorama {image} at {url}");
                    let _ = events.send(TourEvent::ImageStored { image_id: image, url });
                }
                Err(err) => {
                    error!("Upload of panorama {image} failed: {err}");
                    let _ = events.send(TourEvent::ImageUploadFailed {
                        image_id: image,
                        message: err.to_string(),
                    });
                }
            }
        });
    }

    pub async fn rename_image(&self, id: ImageId, new_name: &str) -> TourResult<()> {
        self.session.lock().await.rename_image(id, new_name)
    }

    pub async fn list_images(&self) -> Vec<PanoramaImage> {
        self.session.lock().await.registry().list_images().to_vec()
    }

    pub async fn image_bytes(&self, id: ImageId) -> TourResult<Arc<Vec<u8>>> {
        self.session.lock().await.registry().bytes(id)
    }

    /// Puts `id` on screen for annotation and binds the sampler to it.
    pub async fn select_image(&self, id: ImageId) -> TourResult<()> {
        let session_id = {
            let mut session = self.session.lock().await;
            session.select_image(id)?;
            session.id().to_string()
        };
        self.attach_sampler(session_id, id).await
    }

    async fn attach_sampler(&self, session_id: String, image: ImageId) -> TourResult<()> {
        self.sampler
            .lock()
            .await
            .attach(
                session_id,
                image,
                Arc::clone(&self.session),
                self.events.clone(),
                self.viewer.default_view(),
            )
            .await
            .map_err(|err| TourError::TransitionRefused(err.to_string()))
    }

    async fn release_sampler(&self) {
        let mut sampler = self.sampler.lock().await;
        if let Err(err) = sampler.detach().await {
            warn!("Failed to detach angle sampler: {err:#}");
        }
        sampler.reset();
    }

    /// Forwards a renderer event to the sampler. Returns whether a panorama
    /// was attached to receive it.
    pub async fn viewer_event(&self, event: ViewerEvent) -> bool {
        self.sampler.lock().await.dispatch(event).await
    }

    /// Stages the last sampled angle, for UIs with a "use current view" button.
    pub async fn stage_current_view(&self) -> TourResult<StagedHotspot> {
        let live = *self.live_angle.borrow();
        let angle = live.ok_or_else(|| {
            TourError::IncompleteHotspot("no panorama is being viewed".into())
        })?;

        let (image, staged) = {
            let mut session = self.session.lock().await;
            session.stage_from_angle(angle)?;
            (session.selected_image(), session.graph().staged().clone())
        };
        if let Some(image_id) = image {
            self.emit(TourEvent::HotspotStaged {
                image_id,
                staged: staged.clone(),
            });
        }
        Ok(staged)
    }

    pub async fn set_staged_field(
        &self,
        field: HotspotField,
        value: String,
    ) -> TourResult<StagedHotspot> {
        let mut session = self.session.lock().await;
        session.set_staged_field(field, value)?;
        Ok(session.graph().staged().clone())
    }

    pub async fn commit_hotspot(&self) -> TourResult<Hotspot> {
        let (source, hotspot) = self.session.lock().await.commit_hotspot()?;
        info!(
            "Hotspot '{}' on {source} -> {} at pitch={:.2} yaw={:.2}",
            hotspot.name, hotspot.linked_image, hotspot.pitch, hotspot.yaw
        );
        self.emit(TourEvent::HotspotCommitted {
            source,
            hotspot: hotspot.clone(),
        });
        Ok(hotspot)
    }

    pub async fn hotspots_for(&self, source: ImageId) -> Vec<Hotspot> {
        self.session
            .lock()
            .await
            .hotspots_for(source)
            .cloned()
            .collect()
    }

    /// Saves the tour. On success the authoring session is replaced by a
    /// fresh one; on failure it stays in Hotspots untouched so the user can
    /// retry. Only one save runs at a time, and only once every panorama has
    /// a stored URL.
    pub async fn finish(&self) -> TourResult<TourId> {
        let Ok(_in_flight) = self.finishing.try_lock() else {
            return Err(TourError::TransitionRefused(
                "the tour is already being saved".into(),
            ));
        };

        let (session_id, document) = {
            let session = self.session.lock().await;
            let document = session.to_document()?;
            let pending: Vec<String> = session
                .registry()
                .pending_uploads()
                .map(|id| id.to_string())
                .collect();
            if !pending.is_empty() {
                return Err(TourError::TransitionRefused(format!(
                    "panoramas {} are not uploaded yet; wait or retry the upload",
                    pending.join(", ")
                )));
            }
            (session.id().to_string(), document)
        };

        let tour_id = match self.gateway.save_tour(&document).await {
            Ok(id) => id,
            Err(err) => {
                error!("Failed to save tour: {err}");
                return Err(err.into());
            }
        };

        {
            let mut session = self.session.lock().await;
            if session.id() == session_id {
                *session = WizardSession::new(self.max_image_bytes);
            }
        }
        self.release_sampler().await;

        info!("Tour {tour_id} handed off; starting a new authoring session");
        self.emit(TourEvent::TourSaved {
            tour_id: tour_id.clone(),
        });
        self.emit(TourEvent::StepChanged {
            step: WizardStep::Details,
        });
        Ok(tour_id)
    }

    pub async fn load_tour(&self, id: &TourId) -> TourResult<StoredTour> {
        Ok(self.gateway.load_tour(id).await?)
    }

    pub async fn list_tours(&self) -> TourResult<Vec<TourSummary>> {
        Ok(self.gateway.list_tours().await?)
    }

    pub async fn load_hotspots_for_image(&self, image_ref: &str) -> TourResult<Vec<Hotspot>> {
        Ok(self.gateway.load_hotspots_for_image(image_ref).await?)
    }

    pub async fn tour_diagnostics(&self, id: &TourId) -> TourResult<TourDiagnostics> {
        let tour = self.gateway.load_tour(id).await?;
        Ok(navigation::diagnose(&tour.document))
    }

    /// Reachability of the tour being authored, so gaps show up before finish.
    pub async fn session_diagnostics(&self) -> TourDiagnostics {
        let document = self.session.lock().await.draft();
        navigation::diagnose(&document)
    }

    /// Opens a saved tour at its first panorama and follows the hotspot at
    /// each index of `path`.
    pub async fn walk_tour(&self, id: &TourId, path: &[usize]) -> TourResult<TourStop> {
        let tour = self.gateway.load_tour(id).await?;
        navigation::walk(&tour.document, path)
    }
}
