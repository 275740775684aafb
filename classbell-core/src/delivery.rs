//! Routes fired triggers to the renderer and the live-slot manager.

use std::sync::Arc;

use crate::anchor::AnchorManager;
use crate::render::Renderer;
use crate::trigger::{Trigger, TriggerKind};

pub struct Dispatcher {
    anchors: Arc<AnchorManager>,
    renderer: Arc<dyn Renderer>,
}

impl Dispatcher {
    pub fn new(anchors: Arc<AnchorManager>, renderer: Arc<dyn Renderer>) -> Self {
        Dispatcher { anchors, renderer }
    }

    pub fn deliver(&self, trigger: &Trigger) {
        tracing::debug!(key = %trigger.key, "Delivering trigger");

        match trigger.key.kind {
            TriggerKind::Reminder { .. } => {
                let slot = trigger.key.request_code() as u32;
                if let Err(e) = self.renderer.render_ordinary(slot, &trigger.payload) {
                    tracing::warn!(key = %trigger.key, error = %e, "Reminder not shown");
                }
            }
            TriggerKind::LiveBegin => self.anchors.begin(trigger.payload.clone()),
            TriggerKind::LiveEnd => self.anchors.end(&trigger.key.event_id),
        }
    }
}
