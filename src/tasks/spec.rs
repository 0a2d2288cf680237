//! # Task specification.
//!
//! Defines [`TaskSpec`], the validated description of a task handed to a
//! [`Controller`](crate::Controller): a title, a body and two optional
//! predicates evaluated against the run's [`Context`] when the task is
//! dispatched.
//!
//! - `enabled(|ctx| bool)`: a disabled task is silently left out of the run.
//! - `skip(|ctx| ...)`: a skipped task is marked `skipped` without running its
//!   body; a message becomes the task output.
//!
//! ## Rules
//! - The title must not be blank; this is checked when the spec is added.
//! - Predicates run synchronously and see every context write made by tasks
//!   that already finished.
//!
//! ## Example
//! ```rust
//! use taskline::{Context, TaskSpec};
//!
//! let spec = TaskSpec::new("publish", |_ctx, _task| async { Ok(()) })
//!     .enabled(|ctx: &Context| ctx.get::<bool>("release").unwrap_or(false))
//!     .skip(|ctx: &Context| ctx.contains("dry-run").then(|| "dry run".to_string()));
//! assert_eq!(spec.title(), "publish");
//! ```

use std::future::Future;
use std::sync::Arc;

use crate::context::Context;
use crate::core::TaskHandle;
use crate::error::{BuildError, TaskError};
use crate::tasks::body::{BodyRef, Outcome};
use crate::tasks::task_fn::TaskFn;

/// Skip predicate: `Context -> Skip`.
pub type SkipFn = Arc<dyn Fn(&Context) -> Skip + Send + Sync>;

/// Enable predicate: `Context -> bool`.
pub type EnabledFn = Arc<dyn Fn(&Context) -> bool + Send + Sync>;

/// Result of a skip predicate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Skip {
    /// Run the task.
    #[default]
    No,
    /// Skip it without a message.
    Yes,
    /// Skip it and show the message as task output.
    Because(String),
}

impl Skip {
    #[inline]
    pub fn is_skipped(&self) -> bool {
        !matches!(self, Skip::No)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Skip::Because(msg) => Some(msg),
            _ => None,
        }
    }
}

impl From<bool> for Skip {
    fn from(skip: bool) -> Self {
        if skip {
            Skip::Yes
        } else {
            Skip::No
        }
    }
}

impl From<String> for Skip {
    /// An empty message means "do not skip".
    fn from(msg: String) -> Self {
        if msg.is_empty() {
            Skip::No
        } else {
            Skip::Because(msg)
        }
    }
}

impl From<&str> for Skip {
    fn from(msg: &str) -> Self {
        Skip::from(msg.to_string())
    }
}

impl From<Option<String>> for Skip {
    fn from(msg: Option<String>) -> Self {
        msg.map_or(Skip::No, Skip::from)
    }
}

/// Specification of one task.
#[derive(Clone)]
pub struct TaskSpec {
    title: String,
    body: BodyRef,
    skip: Option<SkipFn>,
    enabled: Option<EnabledFn>,
}

impl TaskSpec {
    /// Creates a spec from a title and an async closure.
    ///
    /// The closure returns `Ok(())` for plain success, or `Ok(Subtasks)` /
    /// `Ok(Vec<TaskSpec>)` to expand into a nested list.
    pub fn new<F, Fut, R>(title: impl Into<String>, f: F) -> Self
    where
        F: Fn(Context, TaskHandle) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, TaskError>> + Send + 'static,
        R: Into<Outcome> + 'static,
    {
        Self::from_body(title, TaskFn::arc(f))
    }

    /// Creates a spec from a title and an existing body.
    pub fn from_body(title: impl Into<String>, body: BodyRef) -> Self {
        Self {
            title: title.into(),
            body,
            skip: None,
            enabled: None,
        }
    }

    /// Sets the skip predicate.
    pub fn skip<S, F>(mut self, f: F) -> Self
    where
        F: Fn(&Context) -> S + Send + Sync + 'static,
        S: Into<Skip>,
    {
        self.skip = Some(Arc::new(move |ctx: &Context| f(ctx).into()));
        self
    }

    /// Sets the enable predicate.
    pub fn enabled<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context) -> bool + Send + Sync + 'static,
    {
        self.enabled = Some(Arc::new(f));
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &BodyRef {
        &self.body
    }

    /// Rejects specs that cannot be displayed or run.
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.title.trim().is_empty() {
            return Err(BuildError::EmptyTitle);
        }
        Ok(())
    }

    pub(crate) fn eval_skip(&self, ctx: &Context) -> Skip {
        self.skip.as_ref().map_or(Skip::No, |f| f(ctx))
    }

    pub(crate) fn eval_enabled(&self, ctx: &Context) -> bool {
        self.enabled.as_ref().map_or(true, |f| f(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(title: &str) -> TaskSpec {
        TaskSpec::new(title, |_, _| async { Ok(()) })
    }

    #[test]
    fn blank_title_is_rejected() {
        assert_eq!(noop("  ").validate(), Err(BuildError::EmptyTitle));
        assert!(noop("build").validate().is_ok());
    }

    #[test]
    fn skip_conversions() {
        assert_eq!(Skip::from(false), Skip::No);
        assert_eq!(Skip::from(""), Skip::No);
        assert_eq!(Skip::from(None::<String>), Skip::No);
        assert_eq!(Skip::from("cached").message(), Some("cached"));
        assert!(Skip::from(true).is_skipped());
    }

    #[test]
    fn predicates_default_to_run() {
        let ctx = Context::new();
        let spec = noop("a");
        assert!(spec.eval_enabled(&ctx));
        assert_eq!(spec.eval_skip(&ctx), Skip::No);

        let spec = noop("b")
            .enabled(|ctx: &Context| ctx.contains("go"))
            .skip(|_: &Context| "not today");
        assert!(!spec.eval_enabled(&ctx));
        assert_eq!(spec.eval_skip(&ctx), Skip::Because("not today".into()));
    }
}
