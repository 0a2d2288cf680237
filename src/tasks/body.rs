//! # Task body abstraction.
//!
//! A [`TaskBody`] is the user code behind a task. It receives the run's
//! [`Context`] and a [`TaskHandle`] for reporting progress, and finishes
//! with an [`Outcome`]: either plain success or a nested list of subtasks the
//! controller should run before the task counts as completed.
//!
//! Most callers never implement the trait directly; closures are wrapped by
//! [`TaskFn`](crate::TaskFn) through [`TaskSpec::new`](crate::TaskSpec::new).
//!
//! # Example
//! ```
//! use async_trait::async_trait;
//! use taskline::{Context, Outcome, TaskBody, TaskError, TaskHandle};
//!
//! struct Build;
//!
//! #[async_trait]
//! impl TaskBody for Build {
//!     async fn run(&self, ctx: Context, task: TaskHandle) -> Result<Outcome, TaskError> {
//!         task.set_output("compiling");
//!         ctx.insert("artifact", String::from("target/app"));
//!         Ok(Outcome::Done)
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::core::{Concurrency, ErrorPolicy, TaskHandle};
use crate::error::TaskError;
use crate::tasks::TaskSpec;

/// Asynchronous body of a task.
#[async_trait]
pub trait TaskBody: Send + Sync + 'static {
    /// Executes the task once.
    async fn run(&self, ctx: Context, task: TaskHandle) -> Result<Outcome, TaskError>;
}

/// Shared handle to a task body.
pub type BodyRef = Arc<dyn TaskBody>;

/// What a successful body produced.
pub enum Outcome {
    /// The task is done.
    Done,
    /// The task expands into a nested list; it completes when the list does.
    Subtasks(Subtasks),
}

impl From<()> for Outcome {
    fn from(_: ()) -> Self {
        Outcome::Done
    }
}

impl From<Subtasks> for Outcome {
    fn from(list: Subtasks) -> Self {
        Outcome::Subtasks(list)
    }
}

impl From<Vec<TaskSpec>> for Outcome {
    fn from(specs: Vec<TaskSpec>) -> Self {
        Outcome::Subtasks(Subtasks::new(specs))
    }
}

/// A nested task list returned by a body.
///
/// The nested controller inherits the parent's config; `concurrency` and
/// `error_policy` override it when set. It shares the parent's context.
pub struct Subtasks {
    pub(crate) specs: Vec<TaskSpec>,
    pub(crate) concurrency: Option<Concurrency>,
    pub(crate) error_policy: Option<ErrorPolicy>,
}

impl Subtasks {
    pub fn new(specs: Vec<TaskSpec>) -> Self {
        Self {
            specs,
            concurrency: None,
            error_policy: None,
        }
    }

    /// Overrides the inherited concurrency for this list.
    pub fn concurrency(mut self, concurrency: impl Into<Concurrency>) -> Self {
        self.concurrency = Some(concurrency.into());
        self
    }

    /// Overrides the inherited error policy for this list.
    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = Some(policy);
        self
    }

    /// `exit_on_error = false` collects nested failures.
    pub fn exit_on_error(self, exit_on_error: bool) -> Self {
        self.error_policy(ErrorPolicy::from_exit_on_error(exit_on_error))
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
