//! # Handle a running body uses to talk to its task.
//!
//! Every body receives a [`TaskHandle`] alongside the shared
//! [`Context`]. Through it the body can update what renderers show
//! (title, output), report a non-fatal error, or append tasks to the list it
//! belongs to while that list is still running.

use std::sync::Arc;

use crate::context::Context;
use crate::core::controller::{Controller, RunState, WeakController};
use crate::error::{BuildError, TaskError};
use crate::events::{Bus, Event};
use crate::tasks::{Task, TaskSpec};

/// Body-side view of one running task.
#[derive(Clone)]
pub struct TaskHandle {
    task: Arc<Task>,
    run: Arc<RunState>,
    bus: Bus,
    list: WeakController,
}

impl TaskHandle {
    pub(crate) fn new(task: Arc<Task>, run: Arc<RunState>, list: &Controller) -> Self {
        Self {
            task,
            run,
            bus: list.events().clone(),
            list: list.downgrade(),
        }
    }

    pub fn title(&self) -> String {
        self.task.title()
    }

    /// Changes the displayed title; publishes `TitleChanged`.
    pub fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        self.task.set_title(title.clone());
        self.bus
            .publish(Event::title_changed(self.task.clone(), &title));
    }

    pub fn output(&self) -> Option<String> {
        self.task.output()
    }

    /// Replaces the task's output line; publishes `OutputChanged`.
    pub fn set_output(&self, output: impl Into<String>) {
        let output = output.into();
        self.task.set_output(output.clone());
        self.bus
            .publish(Event::output_changed(self.task.clone(), &output));
    }

    /// The run's shared context (same as the one passed to the body).
    pub fn context(&self) -> &Context {
        &self.run.context
    }

    pub fn task(&self) -> &Arc<Task> {
        &self.task
    }

    /// Records an error without failing the task.
    ///
    /// The run still ends with an aggregate error listing every report,
    /// whatever the error policy.
    pub fn report(&self, error: impl Into<TaskError>) {
        let error = error.into();
        tracing::debug!(task = %self.task.title(), error = %error, "error reported");
        self.run.push_error(error);
    }

    /// Appends a task to the list this task belongs to.
    ///
    /// The new task is queued behind everything already pending and the
    /// current run waits for it.
    pub fn add(&self, spec: TaskSpec) -> Result<(), BuildError> {
        let list = self.list.upgrade().ok_or(BuildError::Finished)?;
        list.add(spec).map(|_| ())
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("task", &self.task.title())
            .finish()
    }
}
