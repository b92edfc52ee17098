//! Pending alerts: what to fire, for which event, at which instant.

pub mod planner;
pub mod queue;

pub use planner::plan;
pub use queue::AlertQueue;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a fired alert should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlertKind {
    /// Show the overlay ahead of the meeting.
    Reminder { lead_minutes: i64 },
    /// The meeting is starting right now.
    MeetingStart,
    /// A user-requested deferral of an earlier presentation.
    Snooze { until: DateTime<Utc> },
}

impl AlertKind {
    /// Queue slot this kind occupies. `Reminder` and `MeetingStart` share
    /// the planned slot and are replaced wholesale on reschedule; `Snooze`
    /// lives in its own slot and survives replanning.
    pub fn slot(&self) -> AlertSlot {
        match self {
            AlertKind::Reminder { .. } | AlertKind::MeetingStart => AlertSlot::Planned,
            AlertKind::Snooze { .. } => AlertSlot::Snooze,
        }
    }

    /// Lead minutes the overlay should report for this alert.
    pub fn lead_minutes(&self) -> i64 {
        match self {
            AlertKind::Reminder { lead_minutes } => *lead_minutes,
            AlertKind::MeetingStart | AlertKind::Snooze { .. } => 0,
        }
    }

    pub fn is_snooze(&self) -> bool {
        matches!(self, AlertKind::Snooze { .. })
    }
}

/// Kind-category used as the queue key alongside the event id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertSlot {
    Planned,
    Snooze,
}

/// A scheduled instruction to present (or notify about) an event.
///
/// `event_id` is a foreign key -- the scheduler holds the events
/// themselves separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAlert {
    pub event_id: String,
    pub trigger_at: DateTime<Utc>,
    pub kind: AlertKind,
}

impl PendingAlert {
    pub fn is_due(&self, cutoff: DateTime<Utc>) -> bool {
        self.trigger_at <= cutoff
    }
}
