//! Triggers: absolute-time deliveries an event produces.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request code offsets reserved for the live markers. Reminder offsets are
/// capped well below these.
const LIVE_BEGIN_CODE: i32 = 99_998;
const LIVE_END_CODE: i32 = 99_999;
const CODE_STRIDE: i32 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerKind {
    Reminder { minutes: u32 },
    LiveBegin,
    LiveEnd,
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerKind::Reminder { minutes } => write!(f, "reminder-{minutes}"),
            TriggerKind::LiveBegin => write!(f, "live-begin"),
            TriggerKind::LiveEnd => write!(f, "live-end"),
        }
    }
}

/// Identifies one trigger of one event. Derived only from the event identity
/// and the trigger kind, so planning the same event twice targets the same keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TriggerKey {
    pub event_id: String,
    pub kind: TriggerKind,
}

impl TriggerKey {
    pub fn new(event_id: &str, kind: TriggerKind) -> Self {
        TriggerKey {
            event_id: event_id.to_string(),
            kind,
        }
    }

    /// Integer request code: identity hash combined with the kind.
    pub fn request_code(&self) -> i32 {
        let offset = match self.kind {
            TriggerKind::Reminder { minutes } => i32::try_from(minutes).unwrap_or(LIVE_BEGIN_CODE - 1),
            TriggerKind::LiveBegin => LIVE_BEGIN_CODE,
            TriggerKind::LiveEnd => LIVE_END_CODE,
        };
        identity_hash(&self.event_id)
            .wrapping_mul(CODE_STRIDE)
            .wrapping_add(offset)
    }
}

impl fmt::Display for TriggerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.event_id, self.kind)
    }
}

/// Rendering slot of an event's live notification.
pub fn slot_id(event_id: &str) -> u32 {
    identity_hash(event_id) as u32
}

/// Stable 31-multiplier string hash. Unlike `DefaultHasher` it does not change
/// between builds, so codes handed to the platform stay valid across restarts.
fn identity_hash(s: &str) -> i32 {
    s.chars()
        .fold(0i32, |h, c| h.wrapping_mul(31).wrapping_add(c as i32))
}

/// Everything a consumer needs to render a trigger without reading the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerPayload {
    pub event_id: String,
    pub title: String,
    pub location: Option<String>,
    pub time_range: String,
    pub label: String,
    pub code: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl TriggerPayload {
    /// Body line for a notification: time range, location and pickup code.
    pub fn body(&self) -> String {
        let mut parts = vec![self.time_range.clone()];
        if let Some(location) = &self.location {
            parts.push(location.clone());
        }
        if let Some(code) = &self.code {
            parts.push(format!("Code {code}"));
        }
        parts.join(" · ")
    }
}

/// A trigger ready to register with a timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub key: TriggerKey,
    pub at: DateTime<Utc>,
    pub payload: TriggerPayload,
}
