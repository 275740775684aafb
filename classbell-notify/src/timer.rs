//! Timer service on tokio: one sleeping task per registered trigger.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use classbell_core::error::{BellError, BellResult};
use classbell_core::timer::TimerService;
use classbell_core::trigger::{Trigger, TriggerKey, TriggerPayload};
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

struct Pending {
    generation: u64,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct Tasks {
    by_key: HashMap<TriggerKey, Pending>,
    generation: u64,
}

pub struct TokioTimer {
    runtime: Handle,
    fired: UnboundedSender<Trigger>,
    horizon: Duration,
    tasks: Arc<Mutex<Tasks>>,
}

impl TokioTimer {
    /// Fired triggers are sent to `fired`. Triggers further than `horizon`
    /// ahead are refused; they are picked up by a later sync instead.
    pub fn new(runtime: Handle, fired: UnboundedSender<Trigger>, horizon: Duration) -> Self {
        TokioTimer {
            runtime,
            fired,
            horizon,
            tasks: Arc::new(Mutex::new(Tasks::default())),
        }
    }

    pub fn pending(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .by_key
            .len()
    }
}

impl TimerService for TokioTimer {
    fn register(
        &self,
        key: &TriggerKey,
        at: DateTime<Utc>,
        payload: TriggerPayload,
    ) -> BellResult<()> {
        let ahead = at - Utc::now();
        if ahead > self.horizon {
            return Err(BellError::TimerDenied {
                key: key.to_string(),
                reason: format!("more than {}h ahead", self.horizon.num_hours()),
            });
        }
        let delay = ahead.to_std().map_err(|_| BellError::TimerDenied {
            key: key.to_string(),
            reason: "already due".into(),
        })?;

        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.generation += 1;
        let generation = tasks.generation;

        let trigger = Trigger {
            key: key.clone(),
            at,
            payload,
        };
        let fired = self.fired.clone();
        let registry = Arc::clone(&self.tasks);
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;

            {
                let mut tasks = registry.lock().unwrap_or_else(PoisonError::into_inner);
                if tasks
                    .by_key
                    .get(&trigger.key)
                    .is_some_and(|p| p.generation == generation)
                {
                    tasks.by_key.remove(&trigger.key);
                }
            }

            if fired.send(trigger).is_err() {
                tracing::debug!("Trigger fired after dispatcher shut down");
            }
        });

        if let Some(old) = tasks.by_key.insert(key.clone(), Pending { generation, task }) {
            old.task.abort();
        }
        Ok(())
    }

    fn cancel(&self, key: &TriggerKey) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pending) = tasks.by_key.remove(key) {
            pending.task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classbell_core::trigger::TriggerKind;
    use tokio::sync::mpsc;

    fn payload() -> TriggerPayload {
        TriggerPayload {
            event_id: "lab".into(),
            title: "Lab".into(),
            location: None,
            time_range: "10:00-11:00".into(),
            label: "In progress".into(),
            code: None,
            starts_at: Utc::now(),
            ends_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn fires_registered_trigger() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let timer = TokioTimer::new(Handle::current(), tx, Duration::hours(1));

        let key = TriggerKey::new("lab", TriggerKind::LiveBegin);
        timer
            .register(&key, Utc::now() + Duration::milliseconds(20), payload())
            .unwrap();

        let fired = rx.recv().await.unwrap();
        assert_eq!(fired.key, key);
        assert_eq!(timer.pending(), 0);
    }

    #[tokio::test]
    async fn cancelled_trigger_never_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let timer = TokioTimer::new(Handle::current(), tx, Duration::hours(1));

        let key = TriggerKey::new("lab", TriggerKind::LiveEnd);
        timer
            .register(&key, Utc::now() + Duration::milliseconds(20), payload())
            .unwrap();
        timer.cancel(&key);
        timer.cancel(&key);

        let got = tokio::time::timeout(std::time::Duration::from_millis(100), rx.recv()).await;
        assert!(got.is_err());
    }

    #[tokio::test]
    async fn refuses_due_and_distant_triggers() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let timer = TokioTimer::new(Handle::current(), tx, Duration::hours(1));
        let key = TriggerKey::new("lab", TriggerKind::LiveBegin);

        let past = timer.register(&key, Utc::now() - Duration::minutes(1), payload());
        assert!(matches!(past, Err(BellError::TimerDenied { .. })));

        let far = timer.register(&key, Utc::now() + Duration::hours(3), payload());
        assert!(matches!(far, Err(BellError::TimerDenied { .. })));
        assert_eq!(timer.pending(), 0);
    }
}
