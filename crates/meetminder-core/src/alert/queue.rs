//! Pending-alert queue.
//!
//! Purely a data structure: ordered by trigger instant, keyed by
//! `(event_id, slot)`. It owns no timers, so every operation is
//! deterministic under test. Ties on the trigger instant are broken by
//! insertion order.

use chrono::{DateTime, Utc};

use crate::alert::{AlertKind, AlertSlot, PendingAlert};

#[derive(Debug)]
struct Entry {
    alert: PendingAlert,
    seq: u64,
}

/// Mutable store of pending alerts for the currently-known event set.
#[derive(Debug, Default)]
pub struct AlertQueue {
    entries: Vec<Entry>,
    next_seq: u64,
}

impl AlertQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the planned (`Reminder`/`MeetingStart`) entries for one
    /// event. Any `Snooze` entry for the event is left untouched.
    pub fn replace_planned(&mut self, event_id: &str, alerts: Vec<PendingAlert>) {
        self.entries.retain(|e| {
            e.alert.event_id != event_id || e.alert.kind.slot() != AlertSlot::Planned
        });
        for alert in alerts {
            if alert.kind.slot() == AlertSlot::Planned {
                self.push(alert);
            }
        }
    }

    /// Queue a snooze for the event, superseding any earlier one.
    pub fn insert_snooze(&mut self, event_id: &str, until: DateTime<Utc>) {
        self.entries.retain(|e| {
            e.alert.event_id != event_id || e.alert.kind.slot() != AlertSlot::Snooze
        });
        self.push(PendingAlert {
            event_id: event_id.to_owned(),
            trigger_at: until,
            kind: AlertKind::Snooze { until },
        });
    }

    /// Remove and return every entry due by `cutoff`, in ascending
    /// trigger-time order.
    pub fn pop_due(&mut self, cutoff: DateTime<Utc>) -> Vec<PendingAlert> {
        let (mut due, rest): (Vec<Entry>, Vec<Entry>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| e.alert.is_due(cutoff));
        self.entries = rest;
        due.sort_by(|a, b| {
            a.alert
                .trigger_at
                .cmp(&b.alert.trigger_at)
                .then(a.seq.cmp(&b.seq))
        });
        due.into_iter().map(|e| e.alert).collect()
    }

    /// The earliest pending alert, if any.
    pub fn next_due(&self) -> Option<&PendingAlert> {
        self.entries
            .iter()
            .min_by(|a, b| {
                a.alert
                    .trigger_at
                    .cmp(&b.alert.trigger_at)
                    .then(a.seq.cmp(&b.seq))
            })
            .map(|e| &e.alert)
    }

    /// Current snooze entry for an event, if one is queued.
    pub fn snooze_for(&self, event_id: &str) -> Option<&PendingAlert> {
        self.entries
            .iter()
            .map(|e| &e.alert)
            .find(|a| a.event_id == event_id && a.kind.is_snooze())
    }

    pub fn remove_all(&mut self, event_id: &str) {
        self.entries.retain(|e| e.alert.event_id != event_id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingAlert> {
        self.entries.iter().map(|e| &e.alert)
    }

    fn push(&mut self, alert: PendingAlert) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry { alert, seq });
    }
}
