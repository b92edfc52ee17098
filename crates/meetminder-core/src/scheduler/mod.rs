//! Alert scheduler: the single-writer engine.
//!
//! The public [`Scheduler`] is a cheap handle around an unbounded command
//! channel. A spawned worker task owns everything mutable -- the
//! [`AlertQueue`], the known-events map, the current preferences and the
//! [`OverlayLifecycle`] -- and processes commands one at a time. Timer
//! callbacks, user actions and preference changes all arrive as commands
//! on that one channel, so no callback can ever re-enter state it already
//! holds.
//!
//! The monitoring loop is an interval tick inside the worker: pop every
//! due alert, dispatch oldest first. Insert paths (`start`, `reschedule`,
//! `schedule_snooze`) run the same due-dispatch synchronously so an alert
//! that is already due fires at once instead of waiting out the tick.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::alert::{planner, AlertKind, AlertQueue, PendingAlert};
use crate::clock::Clock;
use crate::error::SchedulerError;
use crate::event::MeetingEvent;
use crate::overlay::{OverlayLifecycle, OverlaySignal, OverlayStatus, Presenter};
use crate::prefs::PreferencesSnapshot;

/// Interval between monitoring-loop ticks.
const MONITOR_INTERVAL: std::time::Duration = std::time::Duration::from_secs(5);
/// Alerts due within this window fire without waiting for the next tick.
const IMMEDIATE_FIRE_EPSILON_MS: i64 = 500;
/// Snooze durations beyond this are misconfiguration and clamp instead of
/// overflowing duration arithmetic.
const MAX_SNOOZE_MINUTES: i64 = 7 * 24 * 60;

enum Command {
    Start {
        events: Vec<MeetingEvent>,
        prefs: PreferencesSnapshot,
    },
    Reschedule {
        prefs: PreferencesSnapshot,
    },
    ScheduleSnooze {
        event_id: String,
        minutes: i64,
    },
    Dismiss,
    Snooze {
        minutes: i64,
    },
    Stop,
    Status {
        reply: oneshot::Sender<SchedulerStatus>,
    },
    Shutdown,
}

/// Point-in-time view of the engine, for status output and tests.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub pending: Vec<PendingAlert>,
    pub overlay: OverlayStatus,
}

/// Handle to the scheduler engine.
///
/// Clone freely; every method enqueues a command for the worker task and
/// returns without blocking.
#[derive(Clone)]
pub struct Scheduler {
    tx: mpsc::UnboundedSender<Command>,
}

impl Scheduler {
    /// Spawn the engine worker and return its handle.
    pub fn spawn(presenter: Arc<dyn Presenter>, clock: Arc<dyn Clock>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let overlay = OverlayLifecycle::new(presenter, Arc::clone(&clock), signal_tx);
        let engine = Engine {
            queue: AlertQueue::new(),
            events: HashMap::new(),
            prefs: PreferencesSnapshot::default(),
            running: false,
            overlay,
            clock,
            commands: rx,
            signals: signal_rx,
        };
        tokio::spawn(engine.run());
        Self { tx }
    }

    /// Replace the known event set, replan everything and begin firing.
    pub fn start(
        &self,
        events: Vec<MeetingEvent>,
        prefs: PreferencesSnapshot,
    ) -> Result<(), SchedulerError> {
        self.send(Command::Start { events, prefs })
    }

    /// Replan all known events with new preferences. Outstanding snoozes
    /// are preserved. No-op while stopped.
    pub fn reschedule(&self, prefs: PreferencesSnapshot) -> Result<(), SchedulerError> {
        self.send(Command::Reschedule { prefs })
    }

    /// Queue a snooze alert for an event, `minutes` from now.
    pub fn schedule_snooze(
        &self,
        event_id: impl Into<String>,
        minutes: i64,
    ) -> Result<(), SchedulerError> {
        self.send(Command::ScheduleSnooze {
            event_id: event_id.into(),
            minutes,
        })
    }

    /// Dismiss the visible overlay, if any.
    pub fn dismiss(&self) -> Result<(), SchedulerError> {
        self.send(Command::Dismiss)
    }

    /// Snooze the visible overlay. Zero or negative minutes dismiss now.
    pub fn snooze(&self, minutes: i64) -> Result<(), SchedulerError> {
        self.send(Command::Snooze { minutes })
    }

    /// Stop firing and drop all pending alerts. Idempotent.
    pub fn stop(&self) -> Result<(), SchedulerError> {
        self.send(Command::Stop)
    }

    /// Terminate the worker task. Used on process exit and in tests.
    pub fn shutdown(&self) -> Result<(), SchedulerError> {
        self.send(Command::Shutdown)
    }

    /// Snapshot the engine state.
    pub async fn status(&self) -> Result<SchedulerStatus, SchedulerError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Status { reply })?;
        rx.await.map_err(|_| SchedulerError::WorkerGone)
    }

    fn send(&self, cmd: Command) -> Result<(), SchedulerError> {
        self.tx.send(cmd).map_err(|_| SchedulerError::WorkerGone)
    }
}

/// The worker side: exclusive owner of all mutable scheduling state.
struct Engine {
    queue: AlertQueue,
    events: HashMap<String, MeetingEvent>,
    prefs: PreferencesSnapshot,
    running: bool,
    overlay: OverlayLifecycle,
    clock: Arc<dyn Clock>,
    commands: mpsc::UnboundedReceiver<Command>,
    signals: mpsc::UnboundedReceiver<OverlaySignal>,
}

impl Engine {
    async fn run(mut self) {
        let mut ticker = tokio::time::interval(MONITOR_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd),
                },
                Some(signal) = self.signals.recv() => self.handle_signal(signal),
                _ = ticker.tick() => {
                    if self.running {
                        self.fire_due();
                    }
                }
            }
        }
        self.overlay.dismiss();
        debug!("scheduler worker exited");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Start { events, prefs } => self.start(events, prefs),
            Command::Reschedule { prefs } => self.reschedule(prefs),
            Command::ScheduleSnooze { event_id, minutes } => {
                self.schedule_snooze(event_id, minutes)
            }
            Command::Dismiss => self.overlay.dismiss(),
            Command::Snooze { minutes } => self.snooze_active(minutes),
            Command::Stop => self.stop(),
            Command::Status { reply } => {
                let _ = reply.send(self.status());
            }
            // Consumed by the run loop before dispatch.
            Command::Shutdown => {}
        }
    }

    fn handle_signal(&mut self, signal: OverlaySignal) {
        match signal {
            OverlaySignal::WatchdogExpired { generation } => {
                self.overlay.auto_dismiss(generation);
            }
        }
    }

    fn start(&mut self, events: Vec<MeetingEvent>, prefs: PreferencesSnapshot) {
        info!(count = events.len(), "scheduler starting with fresh event set");
        self.queue.clear();
        self.events = events.into_iter().map(|e| (e.id.clone(), e)).collect();
        self.prefs = prefs;
        self.running = true;
        self.replan_all();
        self.fire_due();
    }

    fn reschedule(&mut self, prefs: PreferencesSnapshot) {
        if !self.running {
            debug!("reschedule ignored while stopped");
            return;
        }
        self.prefs = prefs;
        self.replan_all();
        self.fire_due();
    }

    /// Recompute planned alerts for every known event. Snooze entries are
    /// untouched: a user-initiated snooze must survive preference edits.
    fn replan_all(&mut self) {
        let now = self.clock.now();
        for event in self.events.values() {
            match planner::plan(event, &self.prefs, now) {
                Ok(alerts) => self.queue.replace_planned(&event.id, alerts),
                Err(e) => {
                    // One bad event must not sink planning for the rest.
                    warn!(event_id = %event.id, error = %e, "skipping unplannable event");
                    self.queue.replace_planned(&event.id, Vec::new());
                }
            }
        }
    }

    fn schedule_snooze(&mut self, event_id: String, minutes: i64) {
        if !self.running {
            debug!(%event_id, "snooze scheduling ignored while stopped");
            return;
        }
        let minutes = minutes.clamp(0, MAX_SNOOZE_MINUTES);
        let until = self.clock.now() + Duration::minutes(minutes);
        debug!(%event_id, minutes, %until, "snooze queued");
        self.queue.insert_snooze(&event_id, until);
        self.fire_due();
    }

    fn snooze_active(&mut self, minutes: i64) {
        if minutes <= 0 {
            // Zero or negative snooze means "dismiss now".
            self.overlay.dismiss();
            return;
        }
        if let Some(event) = self.overlay.take_for_snooze() {
            self.schedule_snooze(event.id, minutes);
        }
    }

    fn stop(&mut self) {
        if self.running {
            info!("scheduler stopped");
        }
        self.running = false;
        self.queue.clear();
    }

    /// Dispatch every alert due by `now + epsilon`, oldest first. The
    /// last presentation wins when several are simultaneously due.
    fn fire_due(&mut self) {
        let cutoff = self.clock.now() + Duration::milliseconds(IMMEDIATE_FIRE_EPSILON_MS);
        for alert in self.queue.pop_due(cutoff) {
            self.dispatch(alert);
        }
    }

    fn dispatch(&mut self, alert: PendingAlert) {
        let Some(event) = self.events.get(&alert.event_id).cloned() else {
            warn!(event_id = %alert.event_id, "due alert references unknown event, dropping");
            return;
        };
        match alert.kind {
            AlertKind::Reminder { lead_minutes } => {
                self.overlay.present(event, lead_minutes, false);
            }
            AlertKind::MeetingStart => self.overlay.present(event, 0, false),
            AlertKind::Snooze { .. } => self.overlay.present(event, 0, true),
        }
    }

    fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            running: self.running,
            pending: self.queue.iter().cloned().collect(),
            overlay: self.overlay.status(),
        }
    }
}
