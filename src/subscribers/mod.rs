//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the listener interface of
//! the [`Bus`](crate::Bus), plus a few crate-internal adapters.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   executor ── publish(Event) ──► Bus ──► Subscribe::on_event(&Event)
//!                                              │
//!                                    ┌─────────┼──────────┬───────────┐
//!                                    ▼         ▼          ▼           ▼
//!                                 renderer  Forward   stream()     custom
//!                                          (nested)  (channel)
//! ```

mod adapters;
mod subscriber;

pub(crate) use adapters::{ChannelSubscriber, FnSubscriber, Forward};
pub use subscriber::Subscribe;
