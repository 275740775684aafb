//! Rendering collaborator: the platform notification surface.

use crate::error::BellResult;
use crate::trigger::TriggerPayload;

/// What the platform can do, probed once when the renderer is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderCapabilities {
    /// The platform offers a persistent channel that one notification can back.
    pub anchor: bool,
}

pub trait Renderer: Send + Sync {
    fn capabilities(&self) -> RenderCapabilities;

    /// Show `payload` in `slot` as the notification backing the shared channel.
    fn render_as_anchor(&self, slot: u32, payload: &TriggerPayload) -> BellResult<()>;

    /// Show `payload` in `slot` as a plain notification.
    fn render_ordinary(&self, slot: u32, payload: &TriggerPayload) -> BellResult<()>;

    /// Remove whatever is shown in `slot`. Unknown slots are ignored.
    fn dismiss(&self, slot: u32);

    /// Tear down the shared channel.
    fn release_channel(&self);
}
