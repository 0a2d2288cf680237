//! # Execute one task and translate its outcome.
//!
//! Bridges a user [`TaskBody`](crate::TaskBody) to the controller: evaluates the
//! predicates, moves the [`Task`] through its states, publishes the matching
//! events on the [`Bus`](crate::Bus) and applies the run's error policy.
//!
//! ## Event flow
//!
//! ```text
//! Disabled:
//!   (nothing; task stays pending)
//!
//! Skipped:
//!   skip predicate → [OutputChanged(message)] → StateChanged(skipped)
//!
//! Success:
//!   StateChanged(running) → body → Ok(Done) → StateChanged(completed)
//!
//! Nested list:
//!   StateChanged(running) → body → Ok(Subtasks) → SubtasksAdded
//!                         → nested run → StateChanged(completed | failed)
//!
//! Failure:
//!   StateChanged(running) → body → Err / panic → StateChanged(failed)
//!                                              → OutputChanged(message)
//!
//! Skip predicate panics:
//!   StateChanged(running) → StateChanged(failed) → OutputChanged(message)
//! ```
//!
//! ## Rules
//! - Returns `Err` **only** for a fail-fast failure; the queue treats it as fatal.
//! - Under the collect policy the error is appended to the run's error list and
//!   the unit resolves `Ok`.
//! - A nested list's aggregate error is flattened into the parent run's list
//!   and never aborts the parent.
//! - Panics inside a body or a skip predicate are caught and reported as
//!   [`TaskError::Panicked`]. A panicking enable predicate disables the task.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use crate::core::controller::{Controller, RunState};
use crate::core::handle::TaskHandle;
use crate::core::queue::UnitFuture;
use crate::error::{RunError, TaskError};
use crate::events::{panic_message, Event};
use crate::tasks::{Outcome, Subtasks, Task, TaskState};

/// Why a task ended up `failed`.
enum Failure {
    /// A single error, subject to the error policy.
    Error(TaskError),
    /// A nested collect-policy list failed; its errors are already recorded.
    Flattened,
}

/// Runs `task` once as part of `run`.
pub(crate) fn execute(list: Controller, task: Arc<Task>, run: Arc<RunState>) -> UnitFuture {
    async move {
        if list.is_aborted() {
            return Ok(());
        }

        list.check_all(&run.context);
        if !task.is_enabled() {
            tracing::debug!(task = %task.title(), "task disabled; not run");
            return Ok(());
        }

        let skip = match task.eval_skip(&run.context) {
            Ok(skip) => skip,
            Err(err) => {
                // failed is only reachable from running
                transition(&list, &task, TaskState::Running);
                return fail(&list, &task, &run, err);
            }
        };
        if skip.is_skipped() {
            if let Some(msg) = skip.message() {
                task.set_output(msg.to_string());
                list.events().publish(Event::output_changed(task.clone(), msg));
            }
            transition(&list, &task, TaskState::Skipped);
            return Ok(());
        }

        transition(&list, &task, TaskState::Running);

        let handle = TaskHandle::new(task.clone(), run.clone(), &list);
        let res = AssertUnwindSafe(task.body().run(run.context.clone(), handle))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                Err(TaskError::Panicked {
                    info: panic_message(payload.as_ref()),
                })
            });

        let res = match res {
            Ok(Outcome::Done) => Ok(()),
            Ok(Outcome::Subtasks(subtasks)) => run_subtasks(&list, &task, subtasks, &run).await,
            Err(err) => Err(Failure::Error(err)),
        };

        match res {
            Ok(()) => {
                transition(&list, &task, TaskState::Completed);
                Ok(())
            }
            Err(Failure::Flattened) => {
                transition(&list, &task, TaskState::Failed);
                Ok(())
            }
            Err(Failure::Error(err)) => fail(&list, &task, &run, err),
        }
    }
    .boxed()
}

/// Builds the nested controller, attaches it to `task` and runs it on the
/// parent's context.
async fn run_subtasks(
    list: &Controller,
    task: &Arc<Task>,
    subtasks: Subtasks,
    run: &RunState,
) -> Result<(), Failure> {
    let nested = list
        .nested(subtasks)
        .map_err(|e| Failure::Error(TaskError::fail(e)))?;
    task.attach_subtasks(nested.clone());
    list.events().publish(Event::subtasks_added(task.clone()));

    match nested.run_with(run.context.clone()).await {
        Ok(_) => Ok(()),
        Err(RunError::Task { error, .. }) => Err(Failure::Error(error)),
        Err(RunError::Aggregate { errors, .. }) => {
            run.extend_errors(errors);
            Err(Failure::Flattened)
        }
        Err(err @ (RunError::Reentrant | RunError::Interrupted)) => {
            Err(Failure::Error(TaskError::fail(err)))
        }
    }
}

/// Marks `task` failed and applies the error policy.
fn fail(
    list: &Controller,
    task: &Arc<Task>,
    run: &RunState,
    err: TaskError,
) -> Result<(), TaskError> {
    tracing::debug!(task = %task.title(), error = %err, label = err.as_label(), "task failed");
    transition(list, task, TaskState::Failed);

    // the nested list already shows where it went wrong
    if !task.has_subtasks() {
        let msg = err.to_string();
        task.set_output(msg.clone());
        list.events().publish(Event::output_changed(task.clone(), &msg));
    }

    if run.policy.is_fail_fast() {
        Err(err)
    } else {
        run.push_error(err);
        Ok(())
    }
}

fn transition(list: &Controller, task: &Arc<Task>, next: TaskState) {
    if task.transition(next) {
        tracing::debug!(task = %task.title(), state = next.as_label(), "task state changed");
        list.events().publish(Event::state_changed(task.clone(), next));
    } else {
        tracing::warn!(
            task = %task.title(),
            from = task.state().as_label(),
            to = next.as_label(),
            "illegal task transition ignored"
        );
    }
}
