mod desktop;
mod singleton;
mod timer;

use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::Result;
use chrono::{Duration, Utc};
use clap::Parser;
use classbell_core::anchor::AnchorManager;
use classbell_core::clock::SystemClock;
use classbell_core::config::BellConfig;
use classbell_core::delivery::Dispatcher;
use classbell_core::planner::TriggerPlanner;
use classbell_core::render::Renderer;
use classbell_core::schedule::Scheduler;
use classbell_core::store::Store;
use classbell_core::trigger::Trigger;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing_subscriber::EnvFilter;

use crate::desktop::DesktopRenderer;
use crate::singleton::InstanceLock;
use crate::timer::TokioTimer;

/// Triggers further out than this are left for a later sync.
const TIMER_HORIZON_DAYS: i64 = 366;

#[derive(Parser)]
#[command(name = "classbell-notify")]
#[command(about = "Deliver classbell reminders and live event notifications")]
struct Cli {
    /// Seconds between reloads of the schedule from disk
    #[arg(long, default_value_t = 60)]
    interval: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("CLASSBELL_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = BellConfig::load()?;
    let store = config.store();
    let lock = InstanceLock::acquire(store.dir())?;
    let tz = config.tz();
    tracing::info!(
        data = %store.dir().display(),
        lock = %lock.path().display(),
        %tz,
        "classbell-notify starting"
    );

    let horizon = Duration::days(TIMER_HORIZON_DAYS);
    let (fired_tx, fired_rx) = mpsc::unbounded_channel::<Trigger>();
    let timer = Arc::new(TokioTimer::new(
        tokio::runtime::Handle::current(),
        fired_tx,
        horizon,
    ));

    let renderer: Arc<dyn Renderer> = Arc::new(DesktopRenderer::new());
    let anchors = Arc::new(AnchorManager::new(renderer.clone()));
    let dispatcher = Dispatcher::new(anchors.clone(), renderer.clone());

    spawn_delivery(dispatcher, fired_rx)?;

    let planner = TriggerPlanner::new(timer.clone(), Arc::new(SystemClock), tz)
        .with_live(config.live_activity)
        .with_horizon(horizon);
    let mut scheduler = Scheduler::new(planner, config.course_reminders.clone(), config.plan_days)
        .with_anchors(anchors.clone());

    let mut reload = tokio::time::interval(std::time::Duration::from_secs(cli.interval.max(1)));

    loop {
        tokio::select! {
            _ = reload.tick() => {
                if let Err(e) = resync(&store, &mut scheduler) {
                    tracing::warn!(error = %e, "Could not reload schedule");
                }
                tracing::debug!(pending = timer.pending(), "Timers pending");
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    for id in anchors.live() {
        anchors.end(&id);
    }

    Ok(())
}

/// Rendering talks to the notification server synchronously, so fired
/// triggers are delivered on their own thread, one at a time and in firing
/// order. The thread exits once every sender is gone.
fn spawn_delivery(
    dispatcher: Dispatcher,
    mut fired: UnboundedReceiver<Trigger>,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("classbell-deliver".into())
        .spawn(move || {
            while let Some(trigger) = fired.blocking_recv() {
                dispatcher.deliver(&trigger);
            }
        })
}

fn resync(store: &Store, scheduler: &mut Scheduler) -> Result<()> {
    let courses = store.courses()?;
    let events = store.events()?;
    let term = store.term()?;

    let today = Utc::now().with_timezone(&scheduler.planner().timezone()).date_naive();
    let upcoming = scheduler.upcoming(&courses, &events, &term, today);
    scheduler.sync(upcoming);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use classbell_core::error::BellResult;
    use classbell_core::render::RenderCapabilities;
    use classbell_core::trigger::{TriggerKey, TriggerKind, TriggerPayload};
    use std::sync::Mutex;

    #[derive(Default)]
    struct LogRenderer {
        log: Mutex<Vec<(String, Option<String>)>>,
    }

    impl LogRenderer {
        fn push(&self, what: &str) {
            let thread = std::thread::current().name().map(str::to_string);
            self.log.lock().unwrap().push((what.to_string(), thread));
        }
    }

    impl Renderer for LogRenderer {
        fn capabilities(&self) -> RenderCapabilities {
            RenderCapabilities { anchor: true }
        }
        fn render_as_anchor(&self, _slot: u32, payload: &TriggerPayload) -> BellResult<()> {
            self.push(&format!("anchor {}", payload.event_id));
            Ok(())
        }
        fn render_ordinary(&self, _slot: u32, payload: &TriggerPayload) -> BellResult<()> {
            self.push(&format!("ordinary {}", payload.event_id));
            Ok(())
        }
        fn dismiss(&self, _slot: u32) {
            self.push("dismiss");
        }
        fn release_channel(&self) {
            self.push("release");
        }
    }

    fn trigger(id: &str, kind: TriggerKind) -> Trigger {
        let now = Utc::now();
        Trigger {
            key: TriggerKey::new(id, kind),
            at: now,
            payload: TriggerPayload {
                event_id: id.into(),
                title: id.into(),
                location: None,
                time_range: "10:00-11:00".into(),
                label: "In progress".into(),
                code: None,
                starts_at: now,
                ends_at: now,
            },
        }
    }

    #[test]
    fn delivery_thread_keeps_firing_order() {
        let renderer = Arc::new(LogRenderer::default());
        let anchors = Arc::new(AnchorManager::new(renderer.clone()));
        let dispatcher = Dispatcher::new(anchors.clone(), renderer.clone());

        let (tx, rx) = mpsc::unbounded_channel();
        let worker = spawn_delivery(dispatcher, rx).unwrap();
        for kind in [TriggerKind::LiveBegin, TriggerKind::LiveEnd] {
            tx.send(trigger("lab", kind)).unwrap();
        }
        drop(tx);
        worker.join().unwrap();

        assert!(anchors.live().is_empty());
        let log = renderer.log.lock().unwrap().clone();
        let calls: Vec<_> = log.iter().map(|(what, _)| what.as_str()).collect();
        assert_eq!(calls, vec!["anchor lab", "release", "dismiss"]);
        assert!(log.iter().all(|(_, thread)| thread.as_deref() == Some("classbell-deliver")));
    }
}
