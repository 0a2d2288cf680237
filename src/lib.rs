//! # taskline
//!
//! **Taskline** runs ordered lists of async tasks with bounded concurrency,
//! nested subtask lists, a shared run context and a live event stream that
//! renderers turn into progress output.
//!
//! It is meant for CLIs and build/deploy tooling: describe the steps, pick a
//! concurrency and an error policy, run, and let a renderer show what happens.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   TaskSpec   │   │   TaskSpec   │   │   TaskSpec   │
//!     │ (title+body) │   │ (title+body) │   │ (title+body) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Controller (one list)                                            │
//! │  - Task list (pending → running → completed/failed, or skipped)   │
//! │  - WorkQueue (FIFO, at most `concurrency` bodies in flight)       │
//! │  - Bus (synchronous event stream)                                 │
//! │  - Renderer (created on run, ended on settlement)                 │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     executor           executor           executor
//!     (predicates,       (body returns      (body fails:
//!      body, state)       Subtasks ──► nested Controller, same Context)
//!        │                  │                  │
//!        └───────── publish(Event) ────────────┘
//!                           ▼
//!                 ┌──────────────────┐
//!                 │  Bus::publish    │──► renderer listener
//!                 │  (seq stamped)   │──► user subscribers / stream()
//!                 └──────────────────┘
//! ```
//!
//! ### Settlement
//! ```text
//! run() ──► queue drains ──┬─ no errors           ─► Ok(Context)
//!                          ├─ collected errors    ─► Err(RunError::Aggregate)
//!                          └─ fail-fast failure   ─► Err(RunError::Task)
//!       ──► bus.complete() ──► renderer.end(error)
//!
//! run() future dropped ──► bus.complete() ──► renderer.end(Interrupted)
//! ```
//!
//! ## Features
//! | Area              | Description                                                | Key types / traits                            |
//! |-------------------|------------------------------------------------------------|-----------------------------------------------|
//! | **Tasks**         | Titles, async bodies, skip/enable predicates               | [`TaskSpec`], [`TaskBody`], [`TaskFn`]        |
//! | **Orchestration** | Bounded concurrency, error policies, dynamic add, nesting  | [`Controller`], [`Config`], [`Subtasks`]      |
//! | **Context**       | Shared key/value data for one run                          | [`Context`]                                   |
//! | **Events**        | Synchronous lifecycle event stream                         | [`Bus`], [`Event`], [`Subscribe`]             |
//! | **Rendering**     | Pluggable output, silent and line-per-event built in       | [`RendererFactory`], [`Render`]               |
//! | **Errors**        | Typed errors for building, tasks and runs                  | [`BuildError`], [`TaskError`], [`RunError`]   |
//!
//! ## Example
//! ```rust
//! use taskline::{Concurrency, Config, Context, Controller, Subtasks, TaskHandle, TaskSpec};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::default()
//!         .with_concurrency(Concurrency::Limited(2))
//!         .with_renderer("silent");
//!
//!     let list = Controller::new(
//!         [
//!             TaskSpec::new("prepare", |ctx: Context, _| async move {
//!                 ctx.insert("target", String::from("release"));
//!                 Ok(())
//!             }),
//!             TaskSpec::new("build", |_, _| async {
//!                 Ok(Subtasks::new(vec![
//!                     TaskSpec::new("lib", |_, _| async { Ok(()) }),
//!                     TaskSpec::new("bin", |_, task: TaskHandle| async move {
//!                         task.set_output("linking");
//!                         Ok(())
//!                     }),
//!                 ])
//!                 .concurrency(true))
//!             }),
//!         ],
//!         cfg,
//!     )?;
//!
//!     let ctx = list.run().await?;
//!     assert_eq!(ctx.get::<String>("target").as_deref(), Some("release"));
//!     Ok(())
//! }
//! ```
mod context;
mod core;
mod error;
mod events;
mod renderers;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use crate::context::Context;
pub use crate::core::{
    Concurrency, Config, Controller, ControllerBuilder, ErrorPolicy, TaskHandle, TaskView,
};
pub use crate::error::{BuildError, RunError, TaskError};
pub use crate::events::{Bus, Event, EventKind};
pub use crate::renderers::{
    Render, RendererFactory, RendererKind, Silent, SilentRenderer, Verbose, VerboseRenderer,
};
pub use crate::subscribers::Subscribe;
pub use crate::tasks::{
    BodyRef, EnabledFn, Outcome, Skip, SkipFn, Subtasks, Task, TaskBody, TaskFn, TaskSpec,
    TaskState,
};
