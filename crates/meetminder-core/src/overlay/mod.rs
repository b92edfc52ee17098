//! Overlay lifecycle: the one visible meeting alert.
//!
//! A state machine with exactly one active slot. `present` replaces any
//! overlay shown for a different event (full hide sequence first) and is
//! a no-op for the event already on screen; `dismiss` is idempotent.
//!
//! Two periodic tasks accompany a visible overlay:
//!
//! - the countdown producer republishes time-until-start about once per
//!   second on a `watch` channel, recomputed from the clock on every tick
//!   rather than accumulated;
//! - the auto-hide watchdog compares elapsed-since-start against a
//!   staleness threshold and reports expiry back to the engine.
//!
//! Neither task mutates lifecycle state. The watchdog sends a
//! generation-tagged [`OverlaySignal`] to the engine, which routes it back
//! into [`OverlayLifecycle::auto_dismiss`]; a signal armed for an earlier
//! presentation is discarded there. That one-way flow is what keeps a
//! timer callback from ever re-entering a transition in progress.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::clock::Clock;
use crate::event::MeetingEvent;

/// How often the countdown producer republishes time-until-start.
const COUNTDOWN_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);
/// How often the watchdog re-evaluates staleness.
const WATCHDOG_INTERVAL: std::time::Duration = std::time::Duration::from_secs(5);
/// Auto-hide threshold after meeting start for a fresh presentation.
const AUTO_HIDE_REGULAR_SECS: i64 = 5 * 60;
/// Auto-hide threshold for a snoozed presentation. A snooze deliberately
/// defers past the start, so "meeting already started" is expected there.
const AUTO_HIDE_SNOOZED_SECS: i64 = 30 * 60;

/// What the presenter is asked to render.
#[derive(Debug)]
pub struct OverlayView {
    pub event: MeetingEvent,
    /// Lead minutes the alert was planned with (0 for snoozed alerts).
    pub lead_minutes: i64,
    pub from_snooze: bool,
    /// Seconds until the meeting starts; negative once it has.
    /// Republished about once per second while the overlay is up.
    pub countdown: watch::Receiver<i64>,
}

/// Renders and removes the visual overlay.
///
/// Both calls must return quickly and must not block on I/O -- anything
/// slow belongs on the presenter's own task.
pub trait Presenter: Send + Sync + 'static {
    fn show(&self, view: OverlayView);
    fn hide(&self);
}

/// Reports from overlay-owned timer tasks back to the engine.
///
/// Carries the generation the task was armed for, so a tick that raced a
/// transition is discarded instead of acting on the wrong presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OverlaySignal {
    WatchdogExpired { generation: u64 },
}

/// Summary of the lifecycle state, for status snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct OverlayStatus {
    pub visible: bool,
    pub event_id: Option<String>,
    pub from_snooze: bool,
    /// Lead minutes the visible alert was presented with (0 when hidden).
    pub lead_minutes: i64,
    /// Instant the visible alert appeared (`None` when hidden).
    pub presented_at: Option<DateTime<Utc>>,
}

struct ActivePresentation {
    event: MeetingEvent,
    presented_at: DateTime<Utc>,
    lead_minutes: i64,
    from_snooze: bool,
    generation: u64,
    countdown_task: JoinHandle<()>,
    watchdog_task: JoinHandle<()>,
}

/// State machine tracking the single active overlay presentation.
///
/// Owned by the scheduler engine; every method runs on that one worker,
/// which is what serializes dismiss/snooze/re-present against each other.
pub struct OverlayLifecycle {
    active: Option<ActivePresentation>,
    presenter: Arc<dyn Presenter>,
    clock: Arc<dyn Clock>,
    signal_tx: mpsc::UnboundedSender<OverlaySignal>,
    generation: u64,
}

impl OverlayLifecycle {
    pub(crate) fn new(
        presenter: Arc<dyn Presenter>,
        clock: Arc<dyn Clock>,
        signal_tx: mpsc::UnboundedSender<OverlaySignal>,
    ) -> Self {
        Self {
            active: None,
            presenter,
            clock,
            signal_tx,
            generation: 0,
        }
    }

    /// Present an event. Replaces an overlay for a different event;
    /// re-presenting the current event never restarts timers or
    /// re-renders.
    pub fn present(&mut self, event: MeetingEvent, lead_minutes: i64, from_snooze: bool) {
        if let Some(active) = &self.active {
            if active.event.id == event.id {
                debug!(event_id = %event.id, "overlay already visible for event, ignoring");
                return;
            }
        }
        self.hide_active();

        self.generation += 1;
        let generation = self.generation;
        let now = self.clock.now();
        let (countdown_tx, countdown_rx) =
            watch::channel((event.start_time - now).num_seconds());

        let countdown_task = spawn_countdown(
            Arc::clone(&self.clock),
            event.start_time,
            countdown_tx,
        );
        let watchdog_task = spawn_watchdog(
            Arc::clone(&self.clock),
            event.start_time,
            from_snooze,
            generation,
            self.signal_tx.clone(),
        );

        let view = OverlayView {
            event: event.clone(),
            lead_minutes,
            from_snooze,
            countdown: countdown_rx,
        };

        debug!(event_id = %event.id, lead_minutes, from_snooze, "presenting overlay");
        // State is committed before the presenter hears anything, so a
        // task observing the lifecycle sees the post-transition value.
        self.active = Some(ActivePresentation {
            event,
            presented_at: now,
            lead_minutes,
            from_snooze,
            generation,
            countdown_task,
            watchdog_task,
        });
        self.presenter.show(view);
    }

    /// Dismiss the current overlay, if any. Safe to call when hidden.
    pub fn dismiss(&mut self) {
        self.hide_active();
    }

    /// Dismiss and hand back the event a snooze should be queued for.
    /// Returns `None` when nothing is visible; the call is then a no-op
    /// and no scheduling happens.
    pub fn take_for_snooze(&mut self) -> Option<MeetingEvent> {
        let event = self.active.as_ref().map(|a| a.event.clone())?;
        self.hide_active();
        Some(event)
    }

    /// Watchdog verdict delivery. Signals for an earlier generation are
    /// ignored: the presentation they were armed for is already gone.
    pub(crate) fn auto_dismiss(&mut self, generation: u64) {
        match &self.active {
            Some(active) if active.generation == generation => {
                debug!(event_id = %active.event.id, "auto-hiding stale overlay");
                self.hide_active();
            }
            _ => debug!(generation, "ignoring watchdog signal for replaced presentation"),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_event(&self) -> Option<&MeetingEvent> {
        self.active.as_ref().map(|a| &a.event)
    }

    pub fn status(&self) -> OverlayStatus {
        OverlayStatus {
            visible: self.active.is_some(),
            event_id: self.active.as_ref().map(|a| a.event.id.clone()),
            from_snooze: self.active.as_ref().is_some_and(|a| a.from_snooze),
            lead_minutes: self.active.as_ref().map_or(0, |a| a.lead_minutes),
            presented_at: self.active.as_ref().map(|a| a.presented_at),
        }
    }

    /// Full hide sequence: cancel timer tasks, clear state, then tell the
    /// presenter. Exactly one `hide` per visible presentation.
    fn hide_active(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        active.countdown_task.abort();
        active.watchdog_task.abort();
        debug!(event_id = %active.event.id, "hiding overlay");
        self.presenter.hide();
    }
}

impl Drop for OverlayLifecycle {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.countdown_task.abort();
            active.watchdog_task.abort();
        }
    }
}

fn spawn_countdown(
    clock: Arc<dyn Clock>,
    start_time: DateTime<Utc>,
    tx: watch::Sender<i64>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(COUNTDOWN_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first interval tick completes immediately; the initial value
        // was already published when the channel was created.
        interval.tick().await;
        loop {
            interval.tick().await;
            // Recomputed from the clock on every tick, never accumulated.
            let remaining = (start_time - clock.now()).num_seconds();
            if tx.send(remaining).is_err() {
                break;
            }
        }
    })
}

fn spawn_watchdog(
    clock: Arc<dyn Clock>,
    start_time: DateTime<Utc>,
    from_snooze: bool,
    generation: u64,
    signal_tx: mpsc::UnboundedSender<OverlaySignal>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let threshold_secs = if from_snooze {
            AUTO_HIDE_SNOOZED_SECS
        } else {
            AUTO_HIDE_REGULAR_SECS
        };
        let mut interval = tokio::time::interval(WATCHDOG_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval.tick().await;
        loop {
            interval.tick().await;
            let elapsed = (clock.now() - start_time).num_seconds();
            if elapsed > threshold_secs {
                let _ = signal_tx.send(OverlaySignal::WatchdogExpired { generation });
                break;
            }
        }
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Presenter call recorded by [`RecordingPresenter`].
    #[derive(Debug)]
    pub(crate) enum PresenterCall {
        Show {
            event_id: String,
            lead_minutes: i64,
            from_snooze: bool,
            countdown: watch::Receiver<i64>,
        },
        Hide,
    }

    /// Test presenter that records every call.
    #[derive(Default)]
    pub(crate) struct RecordingPresenter {
        calls: Mutex<Vec<PresenterCall>>,
    }

    impl RecordingPresenter {
        pub(crate) fn take_calls(&self) -> Vec<PresenterCall> {
            std::mem::take(&mut self.calls.lock().expect("presenter lock"))
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.lock().expect("presenter lock").len()
        }
    }

    impl Presenter for RecordingPresenter {
        fn show(&self, view: OverlayView) {
            self.calls
                .lock()
                .expect("presenter lock")
                .push(PresenterCall::Show {
                    event_id: view.event.id.clone(),
                    lead_minutes: view.lead_minutes,
                    from_snooze: view.from_snooze,
                    countdown: view.countdown,
                });
        }

        fn hide(&self) {
            self.calls
                .lock()
                .expect("presenter lock")
                .push(PresenterCall::Hide);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{PresenterCall, RecordingPresenter};
    use super::*;
    use crate::clock::ManualClock;
    use chrono::Duration;
    use tokio::time;

    fn event(id: &str, start: DateTime<Utc>) -> MeetingEvent {
        MeetingEvent {
            id: id.into(),
            title: format!("Meeting {id}"),
            start_time: start,
            end_time: start + Duration::minutes(30),
            links: Vec::new(),
            provider: None,
        }
    }

    fn lifecycle() -> (
        OverlayLifecycle,
        Arc<RecordingPresenter>,
        Arc<ManualClock>,
        mpsc::UnboundedReceiver<OverlaySignal>,
    ) {
        let presenter = Arc::new(RecordingPresenter::default());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let lifecycle = OverlayLifecycle::new(
            Arc::clone(&presenter) as Arc<dyn Presenter>,
            Arc::clone(&clock) as Arc<dyn Clock>,
            signal_tx,
        );
        (lifecycle, presenter, clock, signal_rx)
    }

    /// Let spawned timer tasks run after a paused-time advance.
    async fn settle() {
        time::sleep(std::time::Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn present_then_dismiss_is_one_show_one_hide() {
        let (mut overlay, presenter, clock, _rx) = lifecycle();
        let start = clock.now() + Duration::minutes(5);

        overlay.present(event("a", start), 5, false);
        assert!(overlay.is_visible());

        overlay.dismiss();
        overlay.dismiss(); // idempotent
        assert!(!overlay.is_visible());

        let calls = presenter.take_calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[0], PresenterCall::Show { .. }));
        assert!(matches!(calls[1], PresenterCall::Hide));
    }

    #[tokio::test(start_paused = true)]
    async fn re_present_same_event_is_noop() {
        let (mut overlay, presenter, clock, _rx) = lifecycle();
        let start = clock.now() + Duration::minutes(5);

        overlay.present(event("a", start), 5, false);
        overlay.present(event("a", start), 5, false);
        overlay.present(event("a", start), 2, true);

        assert_eq!(presenter.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn replacing_event_hides_old_before_showing_new() {
        let (mut overlay, presenter, clock, _rx) = lifecycle();
        let start = clock.now() + Duration::minutes(5);

        overlay.present(event("a", start), 5, false);
        overlay.present(event("b", start), 5, false);

        let calls = presenter.take_calls();
        assert_eq!(calls.len(), 3);
        assert!(matches!(calls[0], PresenterCall::Show { ref event_id, .. } if event_id == "a"));
        assert!(matches!(calls[1], PresenterCall::Hide));
        assert!(matches!(calls[2], PresenterCall::Show { ref event_id, .. } if event_id == "b"));
        assert_eq!(overlay.active_event().map(|e| e.id.as_str()), Some("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn take_for_snooze_requires_active_overlay() {
        let (mut overlay, presenter, clock, _rx) = lifecycle();
        assert!(overlay.take_for_snooze().is_none());
        assert_eq!(presenter.call_count(), 0);

        let start = clock.now() + Duration::minutes(5);
        overlay.present(event("a", start), 5, false);
        let taken = overlay.take_for_snooze().expect("active event");
        assert_eq!(taken.id, "a");
        assert!(!overlay.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn status_tracks_the_active_presentation() {
        let (mut overlay, _presenter, clock, _rx) = lifecycle();
        assert!(!overlay.status().visible);
        assert!(overlay.status().presented_at.is_none());

        let shown_at = clock.now();
        overlay.present(event("a", shown_at + Duration::minutes(5)), 5, false);
        let status = overlay.status();
        assert!(status.visible);
        assert_eq!(status.event_id.as_deref(), Some("a"));
        assert_eq!(status.lead_minutes, 5);
        assert_eq!(status.presented_at, Some(shown_at));

        overlay.dismiss();
        assert!(overlay.status().presented_at.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_is_recomputed_from_the_clock() {
        let (mut overlay, presenter, clock, _rx) = lifecycle();
        let start = clock.now() + Duration::seconds(120);

        overlay.present(event("a", start), 2, false);
        // Let the countdown task start and register its timer before the
        // clock moves.
        settle().await;
        let calls = presenter.take_calls();
        let PresenterCall::Show { countdown, .. } = &calls[0] else {
            panic!("expected show call");
        };
        let mut countdown = countdown.clone();
        assert_eq!(*countdown.borrow(), 120);

        let mut readings = Vec::new();
        for _ in 0..3 {
            clock.advance(Duration::seconds(1));
            time::advance(std::time::Duration::from_secs(1)).await;
            settle().await;
            readings.push(*countdown.borrow_and_update());
        }
        assert_eq!(readings, vec![119, 118, 117]);
    }

    #[tokio::test(start_paused = true)]
    async fn watchdog_fires_for_stale_regular_presentation() {
        let (mut overlay, _presenter, clock, mut rx) = lifecycle();
        // Meeting started 6 minutes ago: past the 5-minute threshold.
        let start = clock.now() - Duration::minutes(6);

        overlay.present(event("a", start), 5, false);
        settle().await;
        time::advance(WATCHDOG_INTERVAL).await;
        settle().await;

        let signal = rx.try_recv().expect("watchdog expired");
        let OverlaySignal::WatchdogExpired { generation } = signal;
        overlay.auto_dismiss(generation);
        assert!(!overlay.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn snoozed_presentation_tolerates_started_meeting() {
        let (mut overlay, _presenter, clock, mut rx) = lifecycle();
        let start = clock.now() - Duration::minutes(6);

        overlay.present(event("a", start), 0, true);
        settle().await;
        time::advance(WATCHDOG_INTERVAL).await;
        settle().await;
        assert!(rx.try_recv().is_err(), "6 minutes is not stale for a snooze");

        // Push past the 30-minute snoozed threshold.
        clock.advance(Duration::minutes(26));
        time::advance(WATCHDOG_INTERVAL).await;
        settle().await;
        assert!(rx.try_recv().is_ok(), "32 minutes after start is stale");
    }

    #[tokio::test(start_paused = true)]
    async fn stale_watchdog_signal_is_ignored_after_replacement() {
        let (mut overlay, presenter, clock, _rx) = lifecycle();
        let start = clock.now() + Duration::minutes(5);

        overlay.present(event("a", start), 5, false); // generation 1
        overlay.present(event("b", start), 5, false); // generation 2

        overlay.auto_dismiss(1);
        assert!(overlay.is_visible());
        assert_eq!(overlay.active_event().map(|e| e.id.as_str()), Some("b"));

        overlay.auto_dismiss(2);
        assert!(!overlay.is_visible());
        // show a, hide a, show b, hide b
        assert_eq!(presenter.call_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn no_countdown_ticks_after_dismiss() {
        let (mut overlay, presenter, clock, _rx) = lifecycle();
        let start = clock.now() + Duration::seconds(60);

        overlay.present(event("a", start), 1, false);
        let calls = presenter.take_calls();
        let PresenterCall::Show { countdown, .. } = &calls[0] else {
            panic!("expected show call");
        };
        let countdown = countdown.clone();

        overlay.dismiss();
        clock.advance(Duration::seconds(5));
        time::advance(std::time::Duration::from_secs(5)).await;
        settle().await;

        // Sender side was aborted with the task; nothing new was published.
        match countdown.has_changed() {
            Ok(changed) => assert!(!changed),
            Err(_) => {} // sender already dropped, no pending publish
        }
    }
}
