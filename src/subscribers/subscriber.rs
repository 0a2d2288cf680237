//! # Event subscriber trait.
//!
//! Provides [`Subscribe`], the extension point for plugging listeners into a
//! [`Bus`](crate::Bus). Renderers use it to follow a run.
//!
//! ## Rules
//! - `on_event` is called **synchronously** from the publisher, in publish order.
//! - Keep handlers short; a slow handler slows the run down.
//! - Panics are caught by the bus and logged; other listeners are unaffected.
//! - Do not call back into the controller that owns the bus from `on_event`
//!   (e.g. `Controller::add`); use a `TaskHandle` from a task body instead.
//!
//! ## Example
//! ```rust
//! use taskline::{Event, EventKind, Subscribe};
//!
//! struct Failures;
//!
//! impl Subscribe for Failures {
//!     fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::OutputChanged {
//!             // forward to a log file, a metric, ...
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "failures" }
//! }
//! ```

use crate::events::Event;

/// Listener for controller events.
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    fn on_event(&self, event: &Event);

    /// Called once when the bus completes (the run settled).
    fn on_complete(&self) {}

    /// Returns the subscriber name used in logs.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
