//! Small [`Subscribe`] adapters used by the bus and the controller.
//!
//! - [`FnSubscriber`]: wraps a closure.
//! - [`ChannelSubscriber`]: feeds an unbounded tokio channel (`Bus::stream`).
//! - [`Forward`]: republishes a nested list's events on the parent bus.

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::Subscribe;
use crate::events::{Bus, Event};

pub(crate) struct FnSubscriber<F> {
    name: &'static str,
    f: F,
}

impl<F> FnSubscriber<F> {
    pub(crate) fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

impl<F> Subscribe for FnSubscriber<F>
where
    F: Fn(&Event) + Send + Sync + 'static,
{
    fn on_event(&self, event: &Event) {
        (self.f)(event)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Sender side of `Bus::stream`; dropped on completion so the receiver ends.
pub(crate) struct ChannelSubscriber {
    tx: Mutex<Option<mpsc::UnboundedSender<Event>>>,
}

impl ChannelSubscriber {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Event>) -> Self {
        Self {
            tx: Mutex::new(Some(tx)),
        }
    }
}

impl Subscribe for ChannelSubscriber {
    fn on_event(&self, event: &Event) {
        let mut guard = self.tx.lock();
        if let Some(tx) = guard.as_ref() {
            if tx.send(event.clone()).is_err() {
                // receiver gone; stop cloning events for nobody
                *guard = None;
            }
        }
    }

    fn on_complete(&self) {
        self.tx.lock().take();
    }

    fn name(&self) -> &'static str {
        "stream"
    }
}

/// Forwards every event to another bus. Completion is not forwarded.
pub(crate) struct Forward {
    parent: Bus,
}

impl Forward {
    pub(crate) fn new(parent: Bus) -> Self {
        Self { parent }
    }
}

impl Subscribe for Forward {
    fn on_event(&self, event: &Event) {
        self.parent.publish(event.clone());
    }

    fn name(&self) -> &'static str {
        "subtask-forward"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::tasks::{Task, TaskSpec};

    #[test]
    fn forward_restamps_on_parent() {
        let parent = Bus::new();
        let child = Bus::new();
        child.subscribe(Arc::new(Forward::new(parent.clone())));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        parent.subscribe_fn("sink", move |ev| sink.lock().push((ev.seq, ev.task.title())));

        let task = Task::new(TaskSpec::new("nested", |_, _| async { Ok(()) }), 1);
        parent.publish(Event::task_added(task.clone()));
        child.publish(Event::task_added(task));
        child.complete();

        assert_eq!(
            *seen.lock(),
            vec![(0, "nested".to_string()), (1, "nested".to_string())]
        );
        assert!(!parent.is_completed());
    }
}
