//! # Lifecycle events emitted by a controller.
//!
//! The [`EventKind`] enum classifies what happened to a task; the [`Event`]
//! struct carries the task itself plus the kind-specific payload. Together
//! with the task list, the event stream is enough for a renderer to rebuild
//! its whole view.
//!
//! ## Ordering guarantees
//! Each [`Bus`](crate::Bus) stamps events with its own monotonically
//! increasing sequence number (`seq`). Events from a nested list that are
//! forwarded to the parent bus are re-stamped by the parent.

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use crate::tasks::{Task, TaskState};

/// Classification of controller events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A task was added while a run is in flight.
    ///
    /// Sets: `task`
    TaskAdded,

    /// Task entered a new state.
    ///
    /// Sets: `task`, `state`
    StateChanged,

    /// Task title was changed by its body.
    ///
    /// Sets: `task`, `text` (new title)
    TitleChanged,

    /// Task output was changed (body update, skip message, failure message).
    ///
    /// Sets: `task`, `text` (new output)
    OutputChanged,

    /// Task enablement was re-evaluated to a different value.
    ///
    /// Sets: `task`, `enabled`
    EnabledChanged,

    /// Task body returned a nested list; `task.subtasks()` is now populated.
    ///
    /// Sets: `task`
    SubtasksAdded,
}

impl EventKind {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::TaskAdded => "task_added",
            EventKind::StateChanged => "state_changed",
            EventKind::TitleChanged => "title_changed",
            EventKind::OutputChanged => "output_changed",
            EventKind::EnabledChanged => "enabled_changed",
            EventKind::SubtasksAdded => "subtasks_added",
        }
    }
}

/// Controller event with kind-specific payload.
#[derive(Clone)]
pub struct Event {
    /// Per-bus sequence number, assigned on publish.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// The task this event is about.
    pub task: Arc<Task>,
    /// New state (`StateChanged`).
    pub state: Option<TaskState>,
    /// New title or output (`TitleChanged`, `OutputChanged`).
    pub text: Option<Arc<str>>,
    /// New enablement (`EnabledChanged`).
    pub enabled: Option<bool>,
}

impl Event {
    /// Creates a new event of the given kind; `seq` is assigned by the bus.
    pub fn new(kind: EventKind, task: Arc<Task>) -> Self {
        Self {
            seq: 0,
            at: SystemTime::now(),
            kind,
            task,
            state: None,
            text: None,
            enabled: None,
        }
    }

    #[inline]
    pub fn with_state(mut self, state: TaskState) -> Self {
        self.state = Some(state);
        self
    }

    #[inline]
    pub fn with_text(mut self, text: impl Into<Arc<str>>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[inline]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub(crate) fn task_added(task: Arc<Task>) -> Self {
        Event::new(EventKind::TaskAdded, task)
    }

    pub(crate) fn state_changed(task: Arc<Task>, state: TaskState) -> Self {
        Event::new(EventKind::StateChanged, task).with_state(state)
    }

    pub(crate) fn title_changed(task: Arc<Task>, title: &str) -> Self {
        Event::new(EventKind::TitleChanged, task).with_text(title)
    }

    pub(crate) fn output_changed(task: Arc<Task>, output: &str) -> Self {
        Event::new(EventKind::OutputChanged, task).with_text(output)
    }

    pub(crate) fn enabled_changed(task: Arc<Task>, enabled: bool) -> Self {
        Event::new(EventKind::EnabledChanged, task).with_enabled(enabled)
    }

    pub(crate) fn subtasks_added(task: Arc<Task>) -> Self {
        Event::new(EventKind::SubtasksAdded, task)
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("seq", &self.seq)
            .field("kind", &self.kind)
            .field("task", &self.task.title())
            .field("state", &self.state)
            .field("text", &self.text)
            .field("enabled", &self.enabled)
            .finish()
    }
}
