//! Trigger planning: turns an event into reminder and live triggers and
//! registers them with the timer collaborator.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::clock::Clock;
use crate::constants::{DEFAULT_EVENT_MINUTES, KNOWN_REMINDER_OFFSETS};
use crate::event::Event;
use crate::timer::TimerService;
use crate::trigger::{Trigger, TriggerKey, TriggerKind, TriggerPayload};

/// Result of planning one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanOutcome {
    pub registered: usize,
    /// Triggers already due at planning time.
    pub skipped: usize,
    /// Triggers the timer refused.
    pub failed: usize,
    /// Triggers beyond the planning horizon, left for a later plan.
    pub deferred: usize,
}

pub struct TriggerPlanner {
    timer: Arc<dyn TimerService>,
    clock: Arc<dyn Clock>,
    tz: Tz,
    live: bool,
    horizon: Option<Duration>,
}

impl TriggerPlanner {
    pub fn new(timer: Arc<dyn TimerService>, clock: Arc<dyn Clock>, tz: Tz) -> Self {
        TriggerPlanner {
            timer,
            clock,
            tz,
            live: true,
            horizon: None,
        }
    }

    /// Enable or disable the live begin/end triggers.
    pub fn with_live(mut self, live: bool) -> Self {
        self.live = live;
        self
    }

    /// Only register triggers due within `horizon` of now.
    pub fn with_horizon(mut self, horizon: Duration) -> Self {
        self.horizon = Some(horizon);
        self
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Register every future trigger of `event`.
    ///
    /// Each trigger is registered independently: a refusal is logged and the
    /// remaining triggers are still attempted.
    pub fn plan(&self, event: &Event) -> PlanOutcome {
        let now = self.clock.now();
        let Some(triggers) = self.triggers_for(event) else {
            return PlanOutcome::default();
        };

        let mut outcome = PlanOutcome::default();
        for trigger in triggers {
            if trigger.at <= now {
                outcome.skipped += 1;
                continue;
            }
            if self.horizon.is_some_and(|horizon| trigger.at - now > horizon) {
                tracing::trace!(key = %trigger.key, at = %trigger.at, "Trigger beyond horizon");
                outcome.deferred += 1;
                continue;
            }

            match self.timer.register(&trigger.key, trigger.at, trigger.payload) {
                Ok(()) => {
                    tracing::debug!(key = %trigger.key, at = %trigger.at, "Registered trigger");
                    outcome.registered += 1;
                }
                Err(e) => {
                    tracing::warn!(key = %trigger.key, error = %e, "Trigger not registered");
                    outcome.failed += 1;
                }
            }
        }

        outcome
    }

    /// Cancel every trigger `event` could have registered. Safe to repeat.
    pub fn unplan(&self, event: &Event) {
        for key in Self::possible_keys(event) {
            self.timer.cancel(&key);
        }
        tracing::debug!(event = %event.id, "Cancelled triggers");
    }

    /// Keys for all known reminder offsets plus the event's own, and both live markers.
    pub fn possible_keys(event: &Event) -> Vec<TriggerKey> {
        let offsets: BTreeSet<u32> = KNOWN_REMINDER_OFFSETS
            .iter()
            .copied()
            .chain(event.reminders.iter().copied())
            .collect();

        offsets
            .into_iter()
            .map(|minutes| TriggerKind::Reminder { minutes })
            .chain([TriggerKind::LiveBegin, TriggerKind::LiveEnd])
            .map(|kind| TriggerKey::new(&event.id, kind))
            .collect()
    }

    /// Whether a live slot for `event` should stay up after replanning:
    /// live triggers are on and the event is in progress right now.
    pub fn holds_live_slot(&self, event: &Event) -> bool {
        if !self.live {
            return false;
        }
        let now = self.clock.now();
        self.span(event).is_some_and(|(start, end)| start <= now && now < end)
    }

    /// All triggers of `event`, due or not. None when its start cannot be parsed.
    pub fn triggers_for(&self, event: &Event) -> Option<Vec<Trigger>> {
        let Some((start, end)) = self.span(event) else {
            tracing::warn!(
                event = %event.id,
                date = %event.start_date,
                time = %event.start_time,
                "Unparsable event start, nothing planned"
            );
            return None;
        };

        let mut triggers: Vec<Trigger> = event
            .reminders
            .iter()
            .map(|&minutes| Trigger {
                key: TriggerKey::new(&event.id, TriggerKind::Reminder { minutes }),
                at: start - Duration::minutes(i64::from(minutes)),
                payload: payload(event, reminder_label(minutes), start, end),
            })
            .collect();

        if self.live {
            triggers.push(Trigger {
                key: TriggerKey::new(&event.id, TriggerKind::LiveBegin),
                at: start,
                payload: payload(event, "In progress".into(), start, end),
            });
            triggers.push(Trigger {
                key: TriggerKey::new(&event.id, TriggerKind::LiveEnd),
                at: end,
                payload: payload(event, "Ended".into(), start, end),
            });
        }

        Some(triggers)
    }

    /// Start and end instants. An end that is missing, unparsable or not
    /// after the start becomes start plus the default event length.
    fn span(&self, event: &Event) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = event.start_local().and_then(|dt| self.to_utc(dt))?;
        let default_end = start + Duration::minutes(DEFAULT_EVENT_MINUTES);
        let end = match event.end_local().and_then(|dt| self.to_utc(dt)) {
            Some(end) if end > start => end,
            Some(end) => {
                tracing::warn!(
                    event = %event.id,
                    %start,
                    %end,
                    "Event does not end after it starts, using default length"
                );
                default_end
            }
            None => default_end,
        };
        Some((start, end))
    }

    fn to_utc(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        self.tz
            .from_local_datetime(&local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

fn payload(event: &Event, label: String, start: DateTime<Utc>, end: DateTime<Utc>) -> TriggerPayload {
    TriggerPayload {
        event_id: event.id.clone(),
        title: event.title.clone(),
        location: event.location.clone(),
        time_range: event.time_range(),
        label,
        code: event.pickup_code().map(str::to_string),
        starts_at: start,
        ends_at: end,
    }
}

fn reminder_label(minutes: u32) -> String {
    if minutes == 0 {
        return "Starting now".to_string();
    }
    let lead = std::time::Duration::from_secs(u64::from(minutes) * 60);
    format!("Starts in {}", humantime::format_duration(lead))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::{BellError, BellResult};
    use crate::timer::MemoryTimer;
    use chrono::NaiveDateTime;

    fn local(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn utc(s: &str) -> DateTime<Utc> {
        local(s).and_utc()
    }

    fn planner_at(now: &str, timer: Arc<dyn TimerService>) -> TriggerPlanner {
        TriggerPlanner::new(timer, Arc::new(FixedClock(utc(now))), Tz::UTC)
    }

    fn lecture() -> Event {
        let mut event = Event::new("Lecture", local("2024-09-18 10:00"), local("2024-09-18 11:40"));
        event.id = "lecture".into();
        event.reminders = [5, 15, 60].into_iter().collect();
        event
    }

    fn key(kind: TriggerKind) -> TriggerKey {
        TriggerKey::new("lecture", kind)
    }

    #[test]
    fn future_event_registers_everything() {
        let timer = Arc::new(MemoryTimer::new());
        let planner = planner_at("2024-09-18 08:00", timer.clone());

        let outcome = planner.plan(&lecture());
        assert_eq!(outcome, PlanOutcome { registered: 5, ..Default::default() });

        let pending = timer.pending();
        let times: Vec<_> = pending.iter().map(|t| (t.key.kind, t.at)).collect();
        assert_eq!(
            times,
            vec![
                (TriggerKind::Reminder { minutes: 60 }, utc("2024-09-18 09:00")),
                (TriggerKind::Reminder { minutes: 15 }, utc("2024-09-18 09:45")),
                (TriggerKind::Reminder { minutes: 5 }, utc("2024-09-18 09:55")),
                (TriggerKind::LiveBegin, utc("2024-09-18 10:00")),
                (TriggerKind::LiveEnd, utc("2024-09-18 11:40")),
            ]
        );
    }

    #[test]
    fn past_reminders_are_dropped() {
        let timer = Arc::new(MemoryTimer::new());
        let planner = planner_at("2024-09-18 09:45", timer.clone());

        let outcome = planner.plan(&lecture());
        assert_eq!(outcome.registered, 3);
        assert_eq!(outcome.skipped, 2);

        assert!(!timer.contains(&key(TriggerKind::Reminder { minutes: 60 })));
        // exactly now is not in the future
        assert!(!timer.contains(&key(TriggerKind::Reminder { minutes: 15 })));
        assert!(timer.contains(&key(TriggerKind::Reminder { minutes: 5 })));
        for trigger in timer.pending() {
            assert!(trigger.at > utc("2024-09-18 09:45"));
        }
    }

    #[test]
    fn started_event_only_gets_live_end() {
        let timer = Arc::new(MemoryTimer::new());
        let planner = planner_at("2024-09-18 10:30", timer.clone());

        planner.plan(&lecture());
        assert!(!timer.contains(&key(TriggerKind::LiveBegin)));
        assert!(timer.contains(&key(TriggerKind::LiveEnd)));
        assert_eq!(timer.len(), 1);
    }

    #[test]
    fn finished_event_registers_nothing() {
        let timer = Arc::new(MemoryTimer::new());
        let planner = planner_at("2024-09-18 12:00", timer.clone());

        assert_eq!(planner.plan(&lecture()).registered, 0);
        assert!(timer.is_empty());
    }

    #[test]
    fn unparsable_start_aborts() {
        let timer = Arc::new(MemoryTimer::new());
        let planner = planner_at("2024-09-18 08:00", timer.clone());

        let mut event = lecture();
        event.start_date = "18/09/2024".into();
        assert_eq!(planner.plan(&event), PlanOutcome::default());
        assert!(timer.is_empty());
    }

    #[test]
    fn unparsable_end_defaults_to_one_hour() {
        let timer = Arc::new(MemoryTimer::new());
        let planner = planner_at("2024-09-18 08:00", timer.clone());

        let mut event = lecture();
        event.end_time = "noonish".into();
        planner.plan(&event);

        let end = timer
            .pending()
            .into_iter()
            .find(|t| t.key.kind == TriggerKind::LiveEnd)
            .unwrap();
        assert_eq!(end.at, utc("2024-09-18 11:00"));
    }

    #[test_log::test]
    fn inverted_or_empty_span_gets_default_length() {
        let timer = Arc::new(MemoryTimer::new());
        let planner = planner_at("2024-09-18 08:00", timer.clone());

        for end_time in ["09:00", "10:00"] {
            let mut event = lecture();
            event.end_time = end_time.into();
            planner.plan(&event);

            let live: Vec<_> = timer
                .pending()
                .into_iter()
                .filter(|t| !matches!(t.key.kind, TriggerKind::Reminder { .. }))
                .map(|t| (t.key.kind, t.at))
                .collect();
            assert_eq!(
                live,
                vec![
                    (TriggerKind::LiveBegin, utc("2024-09-18 10:00")),
                    (TriggerKind::LiveEnd, utc("2024-09-18 11:00")),
                ]
            );
            planner.unplan(&event);
        }
    }

    #[test]
    fn local_times_follow_the_timezone() {
        let timer = Arc::new(MemoryTimer::new());
        let planner = TriggerPlanner::new(
            timer.clone(),
            Arc::new(FixedClock(utc("2024-09-18 00:00"))),
            chrono_tz::Asia::Shanghai,
        );

        let mut event = lecture();
        event.reminders.clear();
        planner.plan(&event);

        let begin = timer
            .pending()
            .into_iter()
            .find(|t| t.key.kind == TriggerKind::LiveBegin)
            .unwrap();
        assert_eq!(begin.at, utc("2024-09-18 02:00"));
    }

    #[test]
    fn triggers_past_the_horizon_are_deferred() {
        let timer = Arc::new(MemoryTimer::new());
        let planner = planner_at("2024-09-17 09:50", timer.clone()).with_horizon(Duration::days(1));

        let outcome = planner.plan(&lecture());
        assert_eq!(outcome, PlanOutcome { registered: 2, deferred: 3, ..Default::default() });
        let kinds: Vec<_> = timer.pending().into_iter().map(|t| t.key.kind).collect();
        assert_eq!(
            kinds,
            vec![TriggerKind::Reminder { minutes: 60 }, TriggerKind::Reminder { minutes: 15 }]
        );
    }

    #[test]
    fn live_triggers_can_be_disabled() {
        let timer = Arc::new(MemoryTimer::new());
        let planner = planner_at("2024-09-18 08:00", timer.clone()).with_live(false);

        planner.plan(&lecture());
        assert_eq!(timer.len(), 3);
        assert!(!timer.contains(&key(TriggerKind::LiveBegin)));
    }

    #[test]
    fn payload_carries_render_fields() {
        let timer = Arc::new(MemoryTimer::new());
        let planner = planner_at("2024-09-18 08:00", timer.clone());

        let mut event = lecture();
        event.location = Some("B-204".into());
        planner.plan(&event);

        let reminder = timer
            .pending()
            .into_iter()
            .find(|t| t.key.kind == TriggerKind::Reminder { minutes: 60 })
            .unwrap();
        assert_eq!(reminder.payload.event_id, "lecture");
        assert_eq!(reminder.payload.title, "Lecture");
        assert_eq!(reminder.payload.label, "Starts in 1h");
        assert_eq!(reminder.payload.body(), "10:00-11:40 · B-204");
    }

    #[test]
    fn unplan_cancels_everything_and_repeats_safely() {
        let timer = Arc::new(MemoryTimer::new());
        let planner = planner_at("2024-09-18 08:00", timer.clone());

        let event = lecture();
        planner.plan(&event);
        assert_eq!(timer.len(), 5);

        planner.unplan(&event);
        assert!(timer.is_empty());
        planner.unplan(&event);
        assert!(timer.is_empty());

        let never_planned = Event::new("Other", local("2024-09-19 10:00"), local("2024-09-19 11:00"));
        planner.unplan(&never_planned);
    }

    #[test]
    fn unplan_after_offset_edit_cancels_old_reminder() {
        let timer = Arc::new(MemoryTimer::new());
        let planner = planner_at("2024-09-18 08:00", timer.clone());

        let original = lecture();
        planner.plan(&original);

        let mut edited = original.clone();
        edited.reminders = [10].into_iter().collect();
        planner.unplan(&edited);
        assert!(timer.is_empty());
    }

    struct RefusingTimer {
        inner: MemoryTimer,
        refuse: TriggerKind,
    }

    impl TimerService for RefusingTimer {
        fn register(
            &self,
            key: &TriggerKey,
            at: DateTime<Utc>,
            payload: TriggerPayload,
        ) -> BellResult<()> {
            if key.kind == self.refuse {
                return Err(BellError::TimerDenied {
                    key: key.to_string(),
                    reason: "exact alarms not permitted".into(),
                });
            }
            self.inner.register(key, at, payload)
        }

        fn cancel(&self, key: &TriggerKey) {
            self.inner.cancel(key)
        }
    }

    #[test_log::test]
    fn refused_trigger_does_not_block_the_rest() {
        let timer = Arc::new(RefusingTimer {
            inner: MemoryTimer::new(),
            refuse: TriggerKind::Reminder { minutes: 15 },
        });
        let planner = planner_at("2024-09-18 08:00", timer.clone());

        let outcome = planner.plan(&lecture());
        assert_eq!(outcome, PlanOutcome { registered: 4, failed: 1, ..Default::default() });
        assert!(timer.inner.contains(&key(TriggerKind::LiveEnd)));
    }

    #[test]
    fn possible_keys_cover_custom_offsets() {
        let mut event = lecture();
        event.reminders = [45].into_iter().collect();
        let keys = TriggerPlanner::possible_keys(&event);

        assert!(keys.contains(&key(TriggerKind::Reminder { minutes: 45 })));
        assert!(keys.contains(&key(TriggerKind::Reminder { minutes: 1440 })));
        assert!(keys.contains(&key(TriggerKind::LiveBegin)));
        assert!(keys.contains(&key(TriggerKind::LiveEnd)));
        assert_eq!(keys.len(), KNOWN_REMINDER_OFFSETS.len() + 3);
    }
}
