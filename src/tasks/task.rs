//! # Task entity and its state machine.
//!
//! A [`Task`] is created when a [`TaskSpec`] is added to a controller and is
//! kept for the controller's lifetime as display/history state. Renderers
//! read it through `Arc<Task>` handles from the task list or from events.
//!
//! ## States
//! ```text
//! pending ──► skipped                      (skip predicate hit, body never runs)
//! pending ──► running ──► completed
//!                    └──► failed
//! ```
//! Transitions are monotonic: no state is ever revisited. Only the task's own
//! executor moves it forward.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::context::Context;
use crate::core::Controller;
use crate::error::TaskError;
use crate::events::panic_message;
use crate::tasks::body::BodyRef;
use crate::tasks::spec::{Skip, TaskSpec};

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    Pending,
    Skipped,
    Running,
    Completed,
    Failed,
}

impl TaskState {
    /// True for states a task never leaves.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Skipped | TaskState::Completed | TaskState::Failed
        )
    }

    /// Whether `self → next` is a legal edge of the state machine.
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (TaskState::Pending, TaskState::Skipped)
                | (TaskState::Pending, TaskState::Running)
                | (TaskState::Running, TaskState::Completed)
                | (TaskState::Running, TaskState::Failed)
        )
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Skipped => "skipped",
            TaskState::Running => "running",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// One unit of orchestrated work and its display state.
pub struct Task {
    spec: TaskSpec,
    depth: usize,
    title: Mutex<String>,
    output: Mutex<Option<String>>,
    state: Mutex<TaskState>,
    enabled: AtomicBool,
    subtasks: Mutex<Option<Controller>>,
}

impl Task {
    pub(crate) fn new(spec: TaskSpec, depth: usize) -> Arc<Self> {
        Arc::new(Self {
            title: Mutex::new(spec.title().to_string()),
            spec,
            depth,
            output: Mutex::new(None),
            state: Mutex::new(TaskState::Pending),
            enabled: AtomicBool::new(true),
            subtasks: Mutex::new(None),
        })
    }

    /// Current title (the body may change it while running).
    pub fn title(&self) -> String {
        self.title.lock().clone()
    }

    /// Latest output line, if any.
    pub fn output(&self) -> Option<String> {
        self.output.lock().clone()
    }

    pub fn state(&self) -> TaskState {
        *self.state.lock()
    }

    /// Result of the last enablement check.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Nesting level: 0 for tasks of the top-level list.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_pending(&self) -> bool {
        self.state() == TaskState::Pending
    }

    pub fn is_running(&self) -> bool {
        self.state() == TaskState::Running
    }

    pub fn is_completed(&self) -> bool {
        self.state() == TaskState::Completed
    }

    pub fn is_skipped(&self) -> bool {
        self.state() == TaskState::Skipped
    }

    pub fn has_failed(&self) -> bool {
        self.state() == TaskState::Failed
    }

    pub fn has_subtasks(&self) -> bool {
        self.subtasks.lock().is_some()
    }

    /// Tasks of the nested list this task expanded into (empty if none).
    pub fn subtasks(&self) -> Vec<Arc<Task>> {
        self.subtasks
            .lock()
            .as_ref()
            .map(Controller::tasks)
            .unwrap_or_default()
    }

    pub(crate) fn body(&self) -> &BodyRef {
        self.spec.body()
    }

    pub(crate) fn set_title(&self, title: String) {
        *self.title.lock() = title;
    }

    pub(crate) fn set_output(&self, output: String) {
        *self.output.lock() = Some(output);
    }

    /// Moves to `next` if the edge is legal; returns whether it moved.
    pub(crate) fn transition(&self, next: TaskState) -> bool {
        let mut state = self.state.lock();
        if !state.can_transition_to(next) {
            return false;
        }
        *state = next;
        true
    }

    /// Re-evaluates the enable predicate; returns the new flag if it changed.
    ///
    /// A panicking predicate counts as "disabled".
    pub(crate) fn check(&self, ctx: &Context) -> Option<bool> {
        let enabled = panic::catch_unwind(AssertUnwindSafe(|| self.spec.eval_enabled(ctx)))
            .unwrap_or_else(|payload| {
                tracing::warn!(
                    task = %self.title(),
                    info = %panic_message(payload.as_ref()),
                    "enable predicate panicked; task disabled"
                );
                false
            });
        let prev = self.enabled.swap(enabled, Ordering::AcqRel);
        (prev != enabled).then_some(enabled)
    }

    /// Evaluates the skip predicate; a panic becomes [`TaskError::Panicked`].
    pub(crate) fn eval_skip(&self, ctx: &Context) -> Result<Skip, TaskError> {
        panic::catch_unwind(AssertUnwindSafe(|| self.spec.eval_skip(ctx))).map_err(|payload| {
            TaskError::Panicked {
                info: panic_message(payload.as_ref()),
            }
        })
    }

    pub(crate) fn attach_subtasks(&self, list: Controller) {
        *self.subtasks.lock() = Some(list);
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("title", &self.title())
            .field("state", &self.state())
            .field("enabled", &self.is_enabled())
            .field("depth", &self.depth)
            .field("output", &self.output())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> Arc<Task> {
        Task::new(TaskSpec::new("t", |_, _| async { Ok(()) }), 0)
    }

    #[test]
    fn transitions_are_monotonic() {
        let t = task();
        assert!(t.is_pending());
        assert!(!t.transition(TaskState::Completed));
        assert!(t.transition(TaskState::Running));
        assert!(!t.transition(TaskState::Pending));
        assert!(!t.transition(TaskState::Running));
        assert!(t.transition(TaskState::Failed));
        assert!(!t.transition(TaskState::Completed));
        assert!(t.state().is_terminal());
    }

    #[test]
    fn skipped_is_terminal_from_pending() {
        let t = task();
        assert!(t.transition(TaskState::Skipped));
        assert!(!t.transition(TaskState::Running));
        assert!(t.is_skipped());
    }

    #[test]
    fn check_reports_only_changes() {
        let ctx = Context::new();
        let t = Task::new(
            TaskSpec::new("gated", |_, _| async { Ok(()) })
                .enabled(|ctx: &Context| ctx.contains("go")),
            0,
        );
        assert_eq!(t.check(&ctx), Some(false));
        assert_eq!(t.check(&ctx), None);
        ctx.insert("go", ());
        assert_eq!(t.check(&ctx), Some(true));
        assert!(t.is_enabled());
    }

    #[test]
    fn panicking_predicates_are_contained() {
        let ctx = Context::new();
        let t = Task::new(
            TaskSpec::new("fragile", |_, _| async { Ok(()) })
                .enabled(|_: &Context| -> bool { panic!("enable bug") })
                .skip(|_: &Context| -> bool { panic!("skip bug") }),
            0,
        );
        assert_eq!(t.check(&ctx), Some(false));
        assert!(!t.is_enabled());
        assert!(matches!(
            t.eval_skip(&ctx),
            Err(TaskError::Panicked { info }) if info == "skip bug"
        ));
    }
}
