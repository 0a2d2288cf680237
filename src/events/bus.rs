//! # Event bus for controller lifecycle events.
//!
//! [`Bus`] is the controller's event source. Unlike a buffered channel it
//! delivers **synchronously**: `publish()` calls every listener in
//! subscription order before returning, so a renderer always sees a state
//! change before the task moves on.
//!
//! ## Architecture
//! ```text
//! Publishers:                          Listeners:
//!   executor  ──┐                        ┌──► renderer subscriber
//!   controller ─┼──► Bus::publish ───────┼──► nested-list forwarder
//!   TaskHandle ─┘     (seq stamped)      └──► stream() channel ──► async consumer
//! ```
//!
//! ## Rules
//! - **No replay**: a listener only sees events published after it subscribed.
//! - **Panic isolation**: a panicking listener is logged and skipped; the
//!   others still receive the event.
//! - **Completion**: `complete()` notifies every listener once, drops them,
//!   and turns later publishes into no-ops.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::event::Event;
use crate::subscribers::{ChannelSubscriber, FnSubscriber, Subscribe};

struct BusInner {
    seq: AtomicU64,
    completed: AtomicBool,
    listeners: Mutex<Vec<Arc<dyn Subscribe>>>,
}

/// Synchronous multicast channel for [`Event`]s.
///
/// ### Properties
/// - **Cloneable**: cheap to clone (internally an `Arc`).
/// - **Unbuffered**: nothing is kept for late subscribers.
/// - **Ordered**: each event gets the next sequence number of this bus.
#[derive(Clone)]
pub struct Bus {
    inner: Arc<BusInner>,
}

impl Bus {
    /// Creates a new bus with no listeners.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                seq: AtomicU64::new(0),
                completed: AtomicBool::new(false),
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Registers a listener for all subsequent events.
    ///
    /// Subscribing to a completed bus immediately calls `on_complete`.
    pub fn subscribe(&self, listener: Arc<dyn Subscribe>) {
        if self.is_completed() {
            notify_complete(listener.as_ref());
            return;
        }
        self.inner.listeners.lock().push(listener);
    }

    /// Registers a closure as a listener.
    pub fn subscribe_fn<F>(&self, name: &'static str, f: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(FnSubscriber::new(name, f)));
    }

    /// Returns a receiver fed with every subsequent event.
    ///
    /// The receiver yields `None` once the bus is completed.
    pub fn stream(&self) -> mpsc::UnboundedReceiver<Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribe(Arc::new(ChannelSubscriber::new(tx)));
        rx
    }

    /// Stamps `ev` with the next sequence number and delivers it to every listener.
    ///
    /// Dropped silently once the bus is completed.
    pub fn publish(&self, mut ev: Event) {
        if self.is_completed() {
            return;
        }
        ev.seq = self.inner.seq.fetch_add(1, Ordering::Relaxed);

        let listeners = self.inner.listeners.lock().clone();
        for listener in listeners {
            let res = panic::catch_unwind(AssertUnwindSafe(|| listener.on_event(&ev)));
            if let Err(payload) = res {
                tracing::warn!(
                    subscriber = listener.name(),
                    event = ev.kind.as_label(),
                    info = %panic_message(payload.as_ref()),
                    "subscriber panicked"
                );
            }
        }
    }

    /// Marks the stream as finished; listeners are notified once and dropped.
    pub fn complete(&self) {
        if self.inner.completed.swap(true, Ordering::AcqRel) {
            return;
        }
        let listeners = std::mem::take(&mut *self.inner.listeners.lock());
        for listener in listeners {
            notify_complete(listener.as_ref());
        }
    }

    /// True once [`Bus::complete`] was called.
    pub fn is_completed(&self) -> bool {
        self.inner.completed.load(Ordering::Acquire)
    }

    /// Number of active listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

fn notify_complete(listener: &dyn Subscribe) {
    if panic::catch_unwind(AssertUnwindSafe(|| listener.on_complete())).is_err() {
        tracing::warn!(subscriber = listener.name(), "subscriber panicked on complete");
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{Task, TaskSpec, TaskState};

    fn sample_task() -> Arc<Task> {
        Task::new(TaskSpec::new("sample", |_, _| async { Ok(()) }), 0)
    }

    fn recorder(bus: &Bus) -> Arc<Mutex<Vec<u64>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        bus.subscribe_fn("recorder", move |ev| sink.lock().push(ev.seq));
        seen
    }

    #[test]
    fn late_subscriber_misses_earlier_events() {
        let bus = Bus::new();
        let task = sample_task();
        let early = recorder(&bus);

        bus.publish(Event::state_changed(task.clone(), TaskState::Running));
        let late = recorder(&bus);
        bus.publish(Event::state_changed(task, TaskState::Completed));

        assert_eq!(*early.lock(), vec![0, 1]);
        assert_eq!(*late.lock(), vec![1]);
    }

    #[test]
    fn complete_stops_delivery() {
        let bus = Bus::new();
        let seen = recorder(&bus);
        bus.complete();
        bus.publish(Event::task_added(sample_task()));

        assert!(seen.lock().is_empty());
        assert!(bus.is_completed());
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn panicking_listener_is_isolated() {
        let bus = Bus::new();
        bus.subscribe_fn("bad", |_| panic!("listener bug"));
        let seen = recorder(&bus);

        bus.publish(Event::task_added(sample_task()));
        assert_eq!(*seen.lock(), vec![0]);
    }

    #[tokio::test]
    async fn stream_ends_on_complete() {
        let bus = Bus::new();
        let mut rx = bus.stream();
        bus.publish(Event::output_changed(sample_task(), "hello"));
        bus.complete();

        let ev = rx.recv().await.expect("one event");
        assert_eq!(ev.text.as_deref(), Some("hello"));
        assert!(rx.recv().await.is_none());
    }
}
