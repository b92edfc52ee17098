//! Alert planning.
//!
//! [`plan`] is a pure function: one event plus a preferences snapshot in,
//! pending alerts out. All wall-clock awareness comes through the `now`
//! argument, so every policy here is unit-testable without timers.
//!
//! Past-due policy: a trigger instant at or before `now` is still
//! produced -- the scheduler fires it immediately on insert instead of
//! waiting for the next monitoring tick. Events that already ended are
//! never planned at all.

use chrono::{DateTime, Duration, Utc};

use crate::alert::{AlertKind, PendingAlert};
use crate::error::PlanError;
use crate::event::MeetingEvent;
use crate::prefs::PreferencesSnapshot;

/// Leads beyond this are misconfiguration (the preferences file is
/// user-editable) and clamp instead of overflowing duration arithmetic.
pub const MAX_LEAD_MINUTES: i64 = 7 * 24 * 60;

/// Compute the planned alerts for one event.
///
/// Produces the overlay reminder and, when the sound cue is configured at
/// a different offset, a second independently-timed reminder. A lead of
/// zero minutes is classified as [`AlertKind::MeetingStart`]; leads
/// outside `0..=MAX_LEAD_MINUTES` are clamped.
pub fn plan(
    event: &MeetingEvent,
    prefs: &PreferencesSnapshot,
    now: DateTime<Utc>,
) -> Result<Vec<PendingAlert>, PlanError> {
    if event.end_time < event.start_time {
        return Err(PlanError::InvalidTimeRange {
            event_id: event.id.clone(),
            start: event.start_time,
            end: event.end_time,
        });
    }
    if event.has_ended(now) {
        return Ok(Vec::new());
    }

    let overlay_lead = clamp_lead(prefs.overlay_lead_minutes(event.duration()));
    let mut alerts = vec![planned_alert(event, overlay_lead)];

    if let Some(sound_lead) = prefs.sound_lead_minutes {
        // Clamp before comparing: equal leads collapse into one alert, and
        // two alerts with the same trigger would race to present the same
        // event.
        let sound_lead = clamp_lead(sound_lead);
        if sound_lead != overlay_lead {
            alerts.push(planned_alert(event, sound_lead));
        }
    }

    alerts.sort_by_key(|a| a.trigger_at);
    Ok(alerts)
}

fn clamp_lead(minutes: i64) -> i64 {
    minutes.clamp(0, MAX_LEAD_MINUTES)
}

/// `lead_minutes` must already be clamped.
fn planned_alert(event: &MeetingEvent, lead_minutes: i64) -> PendingAlert {
    let kind = if lead_minutes == 0 {
        AlertKind::MeetingStart
    } else {
        AlertKind::Reminder { lead_minutes }
    };
    PendingAlert {
        event_id: event.id.clone(),
        trigger_at: event.start_time - Duration::minutes(lead_minutes),
        kind,
    }
}
