//! User timing preferences.
//!
//! The engine never reads a live settings object. Every reschedule
//! receives a [`PreferencesSnapshot`] by value, so a settings edit racing
//! a planning pass is impossible by construction.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Meeting-duration bucket for length-based lead times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationBucket {
    Short,
    Medium,
    Long,
}

/// Lead-time table keyed by meeting length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthBasedTiming {
    #[serde(default)]
    pub enabled: bool,
    /// Meetings up to this many minutes fall in the Short bucket.
    #[serde(default = "default_short_max")]
    pub short_max_minutes: i64,
    /// Meetings up to this many minutes fall in Medium; longer ones are Long.
    #[serde(default = "default_medium_max")]
    pub medium_max_minutes: i64,
    #[serde(default = "default_short_lead")]
    pub short_lead_minutes: i64,
    #[serde(default = "default_medium_lead")]
    pub medium_lead_minutes: i64,
    #[serde(default = "default_long_lead")]
    pub long_lead_minutes: i64,
}

impl LengthBasedTiming {
    pub fn bucket(&self, duration: Duration) -> DurationBucket {
        let minutes = duration.num_minutes();
        if minutes <= self.short_max_minutes {
            DurationBucket::Short
        } else if minutes <= self.medium_max_minutes {
            DurationBucket::Medium
        } else {
            DurationBucket::Long
        }
    }

    pub fn lead_minutes(&self, bucket: DurationBucket) -> i64 {
        match bucket {
            DurationBucket::Short => self.short_lead_minutes,
            DurationBucket::Medium => self.medium_lead_minutes,
            DurationBucket::Long => self.long_lead_minutes,
        }
    }
}

impl Default for LengthBasedTiming {
    fn default() -> Self {
        Self {
            enabled: false,
            short_max_minutes: default_short_max(),
            medium_max_minutes: default_medium_max(),
            short_lead_minutes: default_short_lead(),
            medium_lead_minutes: default_medium_lead(),
            long_lead_minutes: default_long_lead(),
        }
    }
}

/// Immutable snapshot of the user's alert timing settings.
///
/// Passed by value into `start`/`reschedule`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencesSnapshot {
    /// Overlay lead time when length-based timing is disabled.
    #[serde(default = "default_global_lead")]
    pub global_lead_minutes: i64,
    /// Separate lead for the sound/notification cue. `None` means the cue
    /// fires together with the overlay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_lead_minutes: Option<i64>,
    #[serde(default)]
    pub length_based: LengthBasedTiming,
}

impl PreferencesSnapshot {
    /// Lead time the overlay should use for a meeting of the given length.
    pub fn overlay_lead_minutes(&self, duration: Duration) -> i64 {
        if self.length_based.enabled {
            self.length_based
                .lead_minutes(self.length_based.bucket(duration))
        } else {
            self.global_lead_minutes
        }
    }
}

impl Default for PreferencesSnapshot {
    fn default() -> Self {
        Self {
            global_lead_minutes: default_global_lead(),
            sound_lead_minutes: None,
            length_based: LengthBasedTiming::default(),
        }
    }
}

// Default functions
fn default_global_lead() -> i64 {
    5
}
fn default_short_max() -> i64 {
    30
}
fn default_medium_max() -> i64 {
    60
}
fn default_short_lead() -> i64 {
    2
}
fn default_medium_lead() -> i64 {
    5
}
fn default_long_lead() -> i64 {
    10
}
