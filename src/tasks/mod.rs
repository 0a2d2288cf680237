//! # Task abstractions and specifications.
//!
//! This module provides the task-related types:
//! - [`TaskBody`] - trait for implementing async task bodies
//! - [`TaskFn`] - closure-based body implementation
//! - [`BodyRef`] - shared reference to a body (`Arc<dyn TaskBody>`)
//! - [`TaskSpec`] - title + body + optional skip/enable predicates
//! - [`Task`] - the entity a controller tracks, with its [`TaskState`]
//! - [`Outcome`], [`Subtasks`] - what a body produced

mod body;
mod spec;
mod task;
mod task_fn;

pub use body::{BodyRef, Outcome, Subtasks, TaskBody};
pub use spec::{EnabledFn, Skip, SkipFn, TaskSpec};
pub use task::{Task, TaskState};
pub use task_fn::TaskFn;
