//! Controller events: types and the synchronous bus.
//!
//! This module groups the event **data model** and the **bus** a controller
//! publishes task lifecycle changes on.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload
//! - [`Bus`] synchronous multicast channel with an async `stream()` adapter
//!
//! ## Quick reference
//! - **Publishers**: `Controller` (task added, enablement), the executor
//!   (state changes, failure output), `TaskHandle` (title/output).
//! - **Consumers**: the renderer, nested-list forwarders, `Bus::stream` users.

mod bus;
mod event;

pub(crate) use bus::panic_message;
pub use bus::Bus;
pub use event::{Event, EventKind};
