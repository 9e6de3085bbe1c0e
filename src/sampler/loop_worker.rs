use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio_util::sync::CancellationToken;

use crate::{
    models::{ImageId, ViewingAngle},
    tour::{TourEvent, WizardSession},
};

use super::ViewerEvent;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Everything one sampling task is bound to.
pub struct SamplerBinding {
    pub session_id: String,
    pub image: ImageId,
    pub session: Arc<Mutex<WizardSession>>,
    pub live: Arc<watch::Sender<Option<ViewingAngle>>>,
    pub events: broadcast::Sender<TourEvent>,
}

pub async fn sampling_loop(
    binding: SamplerBinding,
    mut viewer_rx: mpsc::Receiver<ViewerEvent>,
    cancel_token: CancellationToken,
) {
    log_info!("angle sampler attached to panorama {}", binding.image);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("angle sampler for panorama {} detached", binding.image);
                break;
            }
            event = viewer_rx.recv() => {
                let Some(event) = event else {
                    break;
                };
                match event {
                    ViewerEvent::PointerMoved(angle) => {
                        publish(&binding.live, angle);
                    }
                    ViewerEvent::Captured(angle) => {
                        let angle = publish(&binding.live, angle);
                        capture(&binding, angle).await;
                    }
                }
            }
        }
    }
}

/// Last value wins; repeated identical samples do not wake subscribers.
fn publish(live: &watch::Sender<Option<ViewingAngle>>, angle: ViewingAngle) -> ViewingAngle {
    let rounded = angle.rounded();
    live.send_if_modified(|current| {
        if *current == Some(rounded) {
            false
        } else {
            *current = Some(rounded);
            true
        }
    });
    rounded
}

async fn capture(binding: &SamplerBinding, angle: ViewingAngle) {
    let staged = {
        let mut session = binding.session.lock().await;
        if session.id() != binding.session_id || session.selected_image() != Some(binding.image) {
            log_warn!(
                "ignoring capture on panorama {}: it is no longer selected",
                binding.image
            );
            return;
        }
        if let Err(err) = session.stage_from_angle(angle) {
            log_warn!("capture on panorama {} rejected: {err}", binding.image);
            return;
        }
        session.graph().staged().clone()
    };

    log_debug!(
        "captured pitch={:.2} yaw={:.2} on panorama {}",
        angle.pitch,
        angle.yaw,
        binding.image
    );

    let _ = binding.events.send(TourEvent::HotspotStaged {
        image_id: binding.image,
        staged,
    });
}
