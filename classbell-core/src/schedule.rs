//! Keeps registered triggers in step with the stored schedule.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};

use crate::anchor::AnchorManager;
use crate::course::Course;
use crate::event::Event;
use crate::expand::ScheduleExpander;
use crate::planner::{PlanOutcome, TriggerPlanner};
use crate::term::TermConfig;

/// What a sync changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub planned: usize,
    pub unplanned: usize,
    pub triggers: PlanOutcome,
}

pub struct Scheduler {
    planner: TriggerPlanner,
    anchors: Option<Arc<AnchorManager>>,
    course_reminders: Vec<u32>,
    plan_days: u32,
    planned: HashMap<String, Event>,
}

impl Scheduler {
    pub fn new(planner: TriggerPlanner, course_reminders: Vec<u32>, plan_days: u32) -> Self {
        Scheduler {
            planner,
            anchors: None,
            course_reminders,
            plan_days,
            planned: HashMap::new(),
        }
    }

    /// End live slots of events that are forgotten while in progress.
    pub fn with_anchors(mut self, anchors: Arc<AnchorManager>) -> Self {
        self.anchors = Some(anchors);
        self
    }

    pub fn planner(&self) -> &TriggerPlanner {
        &self.planner
    }

    /// Events whose triggers should be registered now: one-off events that
    /// have not ended before `today`, plus class occurrences for the planning
    /// window starting at `today` with the configured course reminders.
    pub fn upcoming(
        &self,
        courses: &[Course],
        events: &[Event],
        term: &TermConfig,
        today: NaiveDate,
    ) -> Vec<Event> {
        let mut upcoming: Vec<Event> = events
            .iter()
            .filter(|e| {
                e.end_local()
                    .or_else(|| e.start_local())
                    .is_some_and(|end| end.date() >= today)
            })
            .cloned()
            .collect();

        let last_day = today + Duration::days(i64::from(self.plan_days.saturating_sub(1)));
        let occurrences = ScheduleExpander::new(term).expand_range(today, last_day, courses);
        upcoming.extend(occurrences.into_iter().map(|mut occ| {
            occ.reminders = self.course_reminders.iter().copied().collect();
            occ
        }));

        upcoming
    }

    /// Make `desired` the planned set: unplan what changed, forget what
    /// disappeared, then plan everything desired.
    pub fn sync(&mut self, desired: Vec<Event>) -> SyncReport {
        let mut report = SyncReport::default();
        let desired: HashMap<String, Event> =
            desired.into_iter().map(|e| (e.id.clone(), e)).collect();

        let stale: Vec<Event> = self
            .planned
            .values()
            .filter(|old| desired.get(&old.id) != Some(*old))
            .cloned()
            .collect();
        let mut changed = Vec::new();
        for old in &stale {
            if desired.contains_key(&old.id) {
                self.planner.unplan(old);
                changed.push(old.id.clone());
            } else {
                self.forget(old);
            }
            report.unplanned += 1;
        }

        for event in desired.values() {
            let outcome = self.planner.plan(event);
            report.planned += 1;
            report.triggers.registered += outcome.registered;
            report.triggers.skipped += outcome.skipped;
            report.triggers.failed += outcome.failed;
            report.triggers.deferred += outcome.deferred;
        }

        // Unplanning a changed event also cancelled its live end; a slot that
        // the new times no longer cover has nothing left to close it.
        if let Some(anchors) = &self.anchors {
            for id in &changed {
                if let Some(event) = desired.get(id) {
                    if !self.planner.holds_live_slot(event) {
                        anchors.end(id);
                    }
                }
            }
        }

        self.planned = desired;
        tracing::info!(
            planned = report.planned,
            unplanned = report.unplanned,
            registered = report.triggers.registered,
            failed = report.triggers.failed,
            deferred = report.triggers.deferred,
            "Schedule synced"
        );
        report
    }

    /// Unplan a removed event and end its live slot if it is in progress.
    pub fn forget(&mut self, event: &Event) {
        self.planner.unplan(event);
        self.planned.remove(&event.id);
        if let Some(anchors) = &self.anchors {
            anchors.end(&event.id);
        }
    }

    pub fn is_planned(&self, event_id: &str) -> bool {
        self.planned.contains_key(event_id)
    }
}
