//! Timer collaborator: delivers a trigger at an absolute instant.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};

use crate::error::BellResult;
use crate::trigger::{Trigger, TriggerKey, TriggerPayload};

/// Host timer service.
///
/// Registering an existing key replaces it. Cancelling an unknown key is a no-op.
pub trait TimerService: Send + Sync {
    /// Schedule `payload` for delivery at `at`. Fails when the host refuses the timer.
    fn register(&self, key: &TriggerKey, at: DateTime<Utc>, payload: TriggerPayload)
    -> BellResult<()>;

    fn cancel(&self, key: &TriggerKey);
}

/// Keeps registrations in memory without ever firing them.
#[derive(Debug, Default)]
pub struct MemoryTimer {
    pending: Mutex<BTreeMap<TriggerKey, Trigger>>,
}

impl MemoryTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered triggers, ordered by instant.
    pub fn pending(&self) -> Vec<Trigger> {
        let pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let mut triggers: Vec<Trigger> = pending.values().cloned().collect();
        triggers.sort_by(|a, b| a.at.cmp(&b.at).then_with(|| a.key.cmp(&b.key)));
        triggers
    }

    pub fn contains(&self, key: &TriggerKey) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TimerService for MemoryTimer {
    fn register(
        &self,
        key: &TriggerKey,
        at: DateTime<Utc>,
        payload: TriggerPayload,
    ) -> BellResult<()> {
        let trigger = Trigger {
            key: key.clone(),
            at,
            payload,
        };
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), trigger);
        Ok(())
    }

    fn cancel(&self, key: &TriggerKey) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}
