//! Calendar meeting events.
//!
//! Events are read-only inputs: the sync collaborator hands over a full
//! list on every refresh, and an updated event replaces the old one with
//! the same id wholesale -- never merged field by field.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Kind of join link attached to an event, when the sync layer could
/// classify it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Zoom,
    Meet,
    Teams,
    Webex,
    Other,
}

/// A calendar meeting, as delivered by the sync collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingEvent {
    pub id: String,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Join URLs, best candidate first.
    #[serde(default)]
    pub links: Vec<String>,
    /// Classification of the join links, when known.
    #[serde(default)]
    pub provider: Option<Provider>,
}

impl MeetingEvent {
    /// Meeting length. Negative when the event data is malformed; the
    /// planner rejects those.
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end_time <= now
    }

    /// The link the join action should open.
    pub fn primary_link(&self) -> Option<&str> {
        self.links.first().map(String::as_str)
    }
}
