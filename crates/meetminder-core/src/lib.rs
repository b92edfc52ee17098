//! # MeetMinder Core Library
//!
//! Core engine for MeetMinder: it decides when a calendar meeting should
//! interrupt the user and manages the lifecycle of that interruption. The
//! CLI binary and any GUI shell are thin layers over this library.
//!
//! ## Architecture
//!
//! - **AlertPlanner**: pure functions turning an event plus a preferences
//!   snapshot into pending alerts
//! - **AlertQueue**: ordered store of pending alerts, no timers
//! - **Scheduler**: single-writer worker that owns the queue and the
//!   overlay, fires due alerts from a monitoring loop, and fires
//!   already-due alerts immediately on insert
//! - **OverlayLifecycle**: state machine for the one visible overlay,
//!   with a countdown producer and an auto-hide watchdog
//!
//! All mutable state lives behind one command channel; timers and user
//! actions alike are serialized through the worker task.
//!
//! ## Key Components
//!
//! - [`Scheduler`]: handle to the engine worker
//! - [`Presenter`]: contract the rendering collaborator implements
//! - [`plan`]: the alert planner
//! - [`PreferencesSnapshot`]: immutable timing preferences

pub mod alert;
pub mod clock;
pub mod error;
pub mod event;
pub mod overlay;
pub mod prefs;
pub mod scheduler;

pub use alert::{plan, AlertKind, AlertQueue, AlertSlot, PendingAlert};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoreError, PlanError, Result, SchedulerError};
pub use event::{MeetingEvent, Provider};
pub use overlay::{OverlayStatus, OverlayView, Presenter};
pub use prefs::{DurationBucket, LengthBasedTiming, PreferencesSnapshot};
pub use scheduler::{Scheduler, SchedulerStatus};
