//! Desktop notifications via notify-rust.
//!
//! On freedesktop servers that advertise `persistence`, the anchor is a
//! resident critical notification and every slot keeps its handle so it can be
//! closed later. Elsewhere notifications are fire-and-forget and the anchor
//! capability is reported as unavailable.

use classbell_core::error::{BellError, BellResult};
use classbell_core::render::{RenderCapabilities, Renderer};
use classbell_core::trigger::TriggerPayload;
use notify_rust::{Notification, Timeout};

const APP_NAME: &str = "classbell";

fn notification(payload: &TriggerPayload) -> Notification {
    let mut n = Notification::new();
    n.appname(APP_NAME)
        .summary(&format!("{} · {}", payload.title, payload.label))
        .body(&payload.body());
    n
}

#[cfg(all(unix, not(target_os = "macos")))]
mod platform {
    use std::collections::HashMap;
    use std::sync::{Mutex, PoisonError};

    use notify_rust::{Hint, NotificationHandle, Urgency};

    use super::*;

    pub struct DesktopRenderer {
        capabilities: RenderCapabilities,
        shown: Mutex<HashMap<u32, NotificationHandle>>,
        anchor: Mutex<Option<u32>>,
    }

    impl DesktopRenderer {
        pub fn new() -> Self {
            let caps = notify_rust::get_capabilities().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Could not query notification server");
                Vec::new()
            });
            let anchor = caps.iter().any(|c| c == "persistence");
            tracing::info!(anchor, "Notification server capabilities probed");

            DesktopRenderer {
                capabilities: RenderCapabilities { anchor },
                shown: Mutex::new(HashMap::new()),
                anchor: Mutex::new(None),
            }
        }

        fn show(&self, slot: u32, mut n: Notification) -> BellResult<()> {
            n.id(slot);
            let handle = n.show().map_err(|e| BellError::Render(e.to_string()))?;
            self.shown
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(slot, handle);
            Ok(())
        }
    }

    impl Renderer for DesktopRenderer {
        fn capabilities(&self) -> RenderCapabilities {
            self.capabilities
        }

        fn render_as_anchor(&self, slot: u32, payload: &TriggerPayload) -> BellResult<()> {
            let mut n = notification(payload);
            n.hint(Hint::Resident(true))
                .urgency(Urgency::Critical)
                .timeout(Timeout::Never);
            self.show(slot, n)?;
            *self.anchor.lock().unwrap_or_else(PoisonError::into_inner) = Some(slot);
            Ok(())
        }

        fn render_ordinary(&self, slot: u32, payload: &TriggerPayload) -> BellResult<()> {
            let mut n = notification(payload);
            n.urgency(Urgency::Normal).timeout(Timeout::Default);
            self.show(slot, n)
        }

        fn dismiss(&self, slot: u32) {
            let handle = self
                .shown
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&slot);
            if let Some(handle) = handle {
                handle.close();
            }
        }

        fn release_channel(&self) {
            let slot = self.anchor.lock().unwrap_or_else(PoisonError::into_inner).take();
            if let Some(slot) = slot {
                self.dismiss(slot);
            }
        }
    }
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
mod platform {
    use super::*;

    pub struct DesktopRenderer;

    impl DesktopRenderer {
        pub fn new() -> Self {
            tracing::info!("No persistent notification channel on this platform");
            DesktopRenderer
        }
    }

    impl Renderer for DesktopRenderer {
        fn capabilities(&self) -> RenderCapabilities {
            RenderCapabilities { anchor: false }
        }

        fn render_as_anchor(&self, _slot: u32, _payload: &TriggerPayload) -> BellResult<()> {
            Err(BellError::Render("persistent notifications unsupported".into()))
        }

        fn render_ordinary(&self, _slot: u32, payload: &TriggerPayload) -> BellResult<()> {
            let mut n = notification(payload);
            n.timeout(Timeout::Default);
            n.show()
                .map(|_| ())
                .map_err(|e| BellError::Render(e.to_string()))
        }

        fn dismiss(&self, _slot: u32) {}

        fn release_channel(&self) {}
    }
}

pub use platform::DesktopRenderer;
