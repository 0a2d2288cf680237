//! # Function-backed task body (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn(Context, TaskHandle) -> Fut`, producing a
//! fresh future per run. The closure may return anything convertible into an
//! [`Outcome`]: `()` for plain success, [`Subtasks`](crate::Subtasks) or a
//! `Vec<TaskSpec>` for a nested list.
//!
//! ## Example
//! ```rust
//! use taskline::{BodyRef, Context, TaskError, TaskFn, TaskHandle};
//!
//! let body: BodyRef = TaskFn::arc(|ctx: Context, _task: TaskHandle| async move {
//!     ctx.insert("ready", true);
//!     Ok::<_, TaskError>(())
//! });
//! # let _ = body;
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::core::TaskHandle;
use crate::error::TaskError;
use crate::tasks::body::{Outcome, TaskBody};

/// Function-backed task body.
pub struct TaskFn<F> {
    f: F,
}

impl<F> TaskFn<F> {
    /// Wraps a closure.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a [`BodyRef`](crate::BodyRef).
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps a closure and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut, R> TaskBody for TaskFn<F>
where
    F: Fn(Context, TaskHandle) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<R, TaskError>> + Send + 'static,
    R: Into<Outcome> + 'static,
{
    async fn run(&self, ctx: Context, task: TaskHandle) -> Result<Outcome, TaskError> {
        (self.f)(ctx, task).await.map(Into::into)
    }
}
