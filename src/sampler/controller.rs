use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;
use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    models::{ImageId, ViewingAngle},
    tour::{TourEvent, WizardSession},
};

use super::loop_worker::{sampling_loop, SamplerBinding};
use super::ViewerEvent;

const VIEWER_EVENT_BUFFER: usize = 256;

struct Attachment {
    image: ImageId,
    sender: mpsc::Sender<ViewerEvent>,
    cancel_token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Bridges renderer events into the authoring session for the one panorama
/// currently on screen.
pub struct AngleSampler {
    live_tx: Arc<watch::Sender<Option<ViewingAngle>>>,
    attachment: Option<Attachment>,
}

impl Default for AngleSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl AngleSampler {
    pub fn new() -> Self {
        let (live_tx, _) = watch::channel(None);
        Self {
            live_tx: Arc::new(live_tx),
            attachment: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ViewingAngle>> {
        self.live_tx.subscribe()
    }

    /// Binds the sampler to `image`, replacing any previous binding, and
    /// resets the live angle to `default_view`.
    pub async fn attach(
        &mut self,
        session_id: String,
        image: ImageId,
        session: Arc<Mutex<WizardSession>>,
        events: broadcast::Sender<TourEvent>,
        default_view: ViewingAngle,
    ) -> Result<()> {
        self.detach().await?;
        self.live_tx.send_replace(Some(default_view));

        let (sender, receiver) = mpsc::channel(VIEWER_EVENT_BUFFER);
        let cancel_token = CancellationToken::new();
        let binding = SamplerBinding {
            session_id,
            image,
            session,
            live: Arc::clone(&self.live_tx),
            events,
        };

        let handle = tokio::spawn(sampling_loop(binding, receiver, cancel_token.clone()));

        self.attachment = Some(Attachment {
            image,
            sender,
            cancel_token,
            handle,
        });
        Ok(())
    }

    pub async fn detach(&mut self) -> Result<()> {
        let Some(attachment) = self.attachment.take() else {
            return Ok(());
        };

        attachment.cancel_token.cancel();
        drop(attachment.sender);
        attachment
            .handle
            .await
            .context("angle sampler task failed to join")?;
        info!("Angle sampler detached from panorama {}", attachment.image);
        Ok(())
    }

    /// Clears the live angle once no panorama is on screen.
    pub fn reset(&self) {
        self.live_tx.send_replace(None);
    }

    /// Forwards a renderer event. Returns `false` when nothing is attached,
    /// in which case the event is dropped.
    pub async fn dispatch(&self, event: ViewerEvent) -> bool {
        let Some(attachment) = &self.attachment else {
            return false;
        };
        attachment.sender.send(event).await.is_ok()
    }
}
