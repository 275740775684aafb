//! Live-slot arbitration.
//!
//! Every event that is currently in progress has a live slot. The platform
//! offers one persistent channel (for example a resident notification) that is
//! kept alive by exactly one of those slots, the anchor. When the anchor's
//! event ends while others are still live, a replacement is promoted before
//! the old slot is removed so the channel is never torn down in between.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::render::Renderer;
use crate::trigger::{TriggerPayload, slot_id};

/// Where an event identity stands with respect to the live channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Absent,
    LiveNonAnchor,
    LiveAnchor,
}

/// How the anchor is rendered, chosen once from the renderer's capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorStrategy {
    /// The anchor backs the platform's persistent channel.
    Anchored,
    /// No persistent channel; every slot is shown as an ordinary notification.
    OrdinaryOnly,
}

#[derive(Debug, Clone)]
struct Slot {
    payload: TriggerPayload,
    /// Order of the most recent `begin` for this slot.
    seq: u64,
}

#[derive(Debug, Default)]
struct LiveSlots {
    slots: HashMap<String, Slot>,
    anchor: Option<String>,
    next_seq: u64,
}

impl LiveSlots {
    /// Successor when the anchor ends: soonest-ending remaining slot, ties to
    /// the most recently begun.
    fn successor(&self, leaving: &str) -> Option<String> {
        self.slots
            .iter()
            .filter(|(id, _)| id.as_str() != leaving)
            .min_by(|(_, a), (_, b)| {
                a.payload
                    .ends_at
                    .cmp(&b.payload.ends_at)
                    .then_with(|| b.seq.cmp(&a.seq))
            })
            .map(|(id, _)| id.clone())
    }
}

pub struct AnchorManager {
    renderer: Arc<dyn Renderer>,
    strategy: AnchorStrategy,
    state: Mutex<LiveSlots>,
}

impl AnchorManager {
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        let strategy = if renderer.capabilities().anchor {
            AnchorStrategy::Anchored
        } else {
            AnchorStrategy::OrdinaryOnly
        };
        tracing::debug!(?strategy, "Live channel strategy selected");

        AnchorManager {
            renderer,
            strategy,
            state: Mutex::new(LiveSlots::default()),
        }
    }

    pub fn strategy(&self) -> AnchorStrategy {
        self.strategy
    }

    /// An event went live. It always takes the anchor; the previous anchor, if
    /// any, stays live as an ordinary slot.
    pub fn begin(&self, payload: TriggerPayload) {
        let mut live = self.lock();
        let id = payload.event_id.clone();

        live.next_seq += 1;
        let seq = live.next_seq;
        live.slots.insert(id.clone(), Slot { payload, seq });

        if let Some(slot) = live.slots.get(&id) {
            self.install_anchor(&id, &slot.payload);
        }

        let previous = live.anchor.replace(id.clone());
        // Without a persistent channel the previous slot is already ordinary.
        if self.strategy == AnchorStrategy::Anchored {
            if let Some(prev) = previous.filter(|prev| *prev != id) {
                if let Some(slot) = live.slots.get(&prev) {
                    self.show_ordinary(&prev, &slot.payload);
                }
            }
        }

        tracing::info!(event = %id, live = live.slots.len(), "Live slot began");
    }

    /// An event stopped being live. Unknown identities are ignored.
    pub fn end(&self, event_id: &str) {
        let mut live = self.lock();

        if !live.slots.contains_key(event_id) {
            tracing::debug!(event = %event_id, "End for untracked live slot ignored");
            return;
        }

        if live.anchor.as_deref() == Some(event_id) {
            let successor = live.successor(event_id);
            match successor {
                Some(next) => {
                    if self.strategy == AnchorStrategy::Anchored {
                        if let Some(slot) = live.slots.get(&next) {
                            self.install_anchor(&next, &slot.payload);
                        }
                    }
                    live.anchor = Some(next.clone());
                    tracing::info!(from = %event_id, to = %next, "Live anchor transferred");
                }
                None => {
                    if self.strategy == AnchorStrategy::Anchored {
                        self.renderer.release_channel();
                    }
                    live.anchor = None;
                    tracing::info!(event = %event_id, "Live channel released");
                }
            }
        }

        live.slots.remove(event_id);
        self.renderer.dismiss(slot_id(event_id));
        tracing::debug!(event = %event_id, live = live.slots.len(), "Live slot ended");
    }

    pub fn state_of(&self, event_id: &str) -> SlotState {
        let live = self.lock();
        if live.anchor.as_deref() == Some(event_id) {
            SlotState::LiveAnchor
        } else if live.slots.contains_key(event_id) {
            SlotState::LiveNonAnchor
        } else {
            SlotState::Absent
        }
    }

    pub fn anchor(&self) -> Option<String> {
        self.lock().anchor.clone()
    }

    /// Identities currently live, most recently begun first.
    pub fn live(&self) -> Vec<String> {
        let live = self.lock();
        let mut slots: Vec<(&String, u64)> = live.slots.iter().map(|(id, s)| (id, s.seq)).collect();
        slots.sort_by(|a, b| b.1.cmp(&a.1));
        slots.into_iter().map(|(id, _)| id.clone()).collect()
    }

    fn lock(&self) -> MutexGuard<'_, LiveSlots> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Put `payload` on the channel, degrading to an ordinary notification if
    /// the platform refuses.
    fn install_anchor(&self, event_id: &str, payload: &TriggerPayload) {
        if self.strategy == AnchorStrategy::OrdinaryOnly {
            self.show_ordinary(event_id, payload);
            return;
        }

        if let Err(e) = self.renderer.render_as_anchor(slot_id(event_id), payload) {
            tracing::warn!(event = %event_id, error = %e, "Anchor rejected, showing as ordinary notification");
            self.show_ordinary(event_id, payload);
        }
    }

    fn show_ordinary(&self, event_id: &str, payload: &TriggerPayload) {
        if let Err(e) = self.renderer.render_ordinary(slot_id(event_id), payload) {
            tracing::warn!(event = %event_id, error = %e, "Live notification not shown");
        }
    }
}
