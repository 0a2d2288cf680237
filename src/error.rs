//! Error types used by the taskline controller and task bodies.
//!
//! This module defines three error enums:
//!
//! - [`BuildError`] — malformed arguments, rejected before any task runs.
//! - [`TaskError`] — errors raised by individual task bodies.
//! - [`RunError`] — the outcome of a failed [`Controller::run`](crate::Controller::run).
//!
//! All of them provide `as_label` for logs/metrics.

use thiserror::Error;

use crate::context::Context;

/// # Errors produced while building a controller or adding tasks.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A task spec was given an empty (or whitespace-only) title.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// `Concurrency::Limited(0)` can never make progress.
    #[error("concurrency limit must be at least 1")]
    ZeroConcurrency,

    /// The controller already finished its run and no longer accepts tasks.
    #[error("controller already finished its run")]
    Finished,
}

impl BuildError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BuildError::EmptyTitle => "build_empty_title",
            BuildError::ZeroConcurrency => "build_zero_concurrency",
            BuildError::Finished => "build_finished",
        }
    }
}

/// # Errors produced by task bodies.
///
/// A failing body returns one of these; the controller records it on the task
/// (state `failed`, output = message) and applies the run's error policy.
///
/// # Example
/// ```
/// use taskline::TaskError;
///
/// let err: TaskError = "disk full".into();
/// assert_eq!(err.to_string(), "disk full");
/// assert_eq!(err.as_label(), "task_failed");
/// ```
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// Task body failed; the message is shown verbatim.
    #[error("{error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task body panicked; the panic was caught by the executor.
    #[error("task panicked: {info}")]
    Panicked {
        /// Panic payload, if it was a string.
        info: String,
    },
}

impl TaskError {
    /// Builds a [`TaskError::Fail`] from anything printable.
    pub fn fail(error: impl std::fmt::Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Panicked { .. } => "task_panicked",
        }
    }
}

impl From<&str> for TaskError {
    fn from(error: &str) -> Self {
        TaskError::fail(error)
    }
}

impl From<String> for TaskError {
    fn from(error: String) -> Self {
        TaskError::Fail { error }
    }
}

impl From<anyhow::Error> for TaskError {
    fn from(error: anyhow::Error) -> Self {
        TaskError::Fail {
            error: format!("{error:#}"),
        }
    }
}

/// # Errors produced by a run.
///
/// Both failure variants carry the run's [`Context`] so callers can inspect
/// what the tasks produced before things went wrong.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RunError {
    /// Fail-fast: the first task error, propagated verbatim.
    #[error("{error}")]
    Task {
        /// The task error that aborted the run.
        error: TaskError,
        /// The run's context at the time of failure.
        context: Context,
    },

    /// Collect policy (or reported errors): every error, in the order it happened.
    #[error("{} task(s) failed", errors.len())]
    Aggregate {
        /// Underlying task errors in failure order.
        errors: Vec<TaskError>,
        /// The run's final context.
        context: Context,
    },

    /// `run` was called on a controller that has already been run.
    #[error("controller has already been run")]
    Reentrant,

    /// The run future was dropped or unwound before the run settled.
    ///
    /// Only renderers see this, through [`Render::end`](crate::Render::end).
    #[error("run interrupted before it settled")]
    Interrupted,
}

impl RunError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RunError::Task { .. } => "run_task_failed",
            RunError::Aggregate { .. } => "run_aggregate",
            RunError::Reentrant => "run_reentrant",
            RunError::Interrupted => "run_interrupted",
        }
    }

    /// The run's context, if the run got far enough to have one.
    pub fn context(&self) -> Option<&Context> {
        match self {
            RunError::Task { context, .. } | RunError::Aggregate { context, .. } => Some(context),
            RunError::Reentrant | RunError::Interrupted => None,
        }
    }

    /// Underlying task errors: one for fail-fast, all of them for aggregates.
    pub fn errors(&self) -> &[TaskError] {
        match self {
            RunError::Task { error, .. } => std::slice::from_ref(error),
            RunError::Aggregate { errors, .. } => errors,
            RunError::Reentrant | RunError::Interrupted => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_error_conversions_keep_message() {
        assert_eq!(TaskError::from("boom").to_string(), "boom");
        assert_eq!(TaskError::from(String::from("bang")).to_string(), "bang");

        let any = anyhow::anyhow!("root cause").context("while copying");
        assert_eq!(TaskError::from(any).to_string(), "while copying: root cause");
    }

    #[test]
    fn run_error_exposes_errors_and_context() {
        let ctx = Context::new();
        let err = RunError::Aggregate {
            errors: vec!["a".into(), "b".into()],
            context: ctx.clone(),
        };
        assert_eq!(err.to_string(), "2 task(s) failed");
        assert_eq!(err.errors().len(), 2);
        assert!(err.context().is_some_and(|c| c.ptr_eq(&ctx)));

        let err = RunError::Task {
            error: "boom".into(),
            context: ctx,
        };
        assert_eq!(err.to_string(), "boom");
        assert_eq!(err.errors().len(), 1);
        assert_eq!(err.as_label(), "run_task_failed");

        assert!(RunError::Reentrant.context().is_none());
        assert!(RunError::Interrupted.errors().is_empty());
        assert_eq!(RunError::Interrupted.as_label(), "run_interrupted");
    }
}
