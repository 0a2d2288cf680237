//! Runtime core: the controller and everything it drives.
//!
//! The public API from this module is [`Controller`] (plus its builder,
//! configuration and the [`TaskHandle`] given to bodies).
//!
//! Internal modules:
//! - [`controller`]: owns the task list, runs it, settles the outcome;
//! - [`executor`]: runs one task, applies predicates and the error policy;
//! - [`queue`]: bounded-concurrency FIFO of deferred units;
//! - [`handle`]: body-side access to title, output, context and the list;
//! - [`builder`]: optional builder-style construction.

mod builder;
mod config;
mod controller;
mod executor;
mod handle;
mod queue;
mod view;


pub use builder::ControllerBuilder;
pub use config::{Concurrency, Config, ErrorPolicy};
pub use controller::Controller;
pub use handle::TaskHandle;
pub use view::TaskView;
