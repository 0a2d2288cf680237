//! # Bounded-concurrency FIFO work queue.
//!
//! [`WorkQueue`] holds deferred units of work and runs at most `limit` of them
//! at once. Units start in submission order; they may finish in any order.
//!
//! The queue is driven by [`WorkQueue::on_idle`]: all in-flight units are
//! multiplexed onto that one future (cooperative, no extra tasks), and new
//! units pushed while it runs are picked up as soon as a slot is free.
//!
//! ## Flow
//! ```text
//! push(unit) ──► pending (VecDeque) ──► dispatch while in_flight < limit
//!                                            │
//!                                            ▼
//!                                  FuturesUnordered (in flight)
//!                                            │
//!                    Ok ◄────────────────────┴──────────────► Err (fatal)
//!                     │                                          │
//!       pending and in-flight empty?                   abort: drop pending,
//!         └─► close, return Ok                         detach in-flight,
//!                                                      close, return Err
//! ```
//!
//! ## Rules
//! - Start order is strict FIFO; completion order is unconstrained.
//! - After a fatal unit the aborted flag is set: pending units never start and
//!   in-flight ones are detached (spawned) to finish on their own.
//! - Once closed (idle or aborted) the queue rejects further pushes.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::error::TaskError;

/// Result of one unit: `Err` means fatal for the whole queue.
pub(crate) type UnitFuture = BoxFuture<'static, Result<(), TaskError>>;

/// A deferred unit of work; called once when it is dispatched.
pub(crate) type Unit = Box<dyn FnOnce() -> UnitFuture + Send>;

#[derive(Default)]
struct QueueState {
    pending: VecDeque<Unit>,
    closed: bool,
}

/// Push rejected because the queue already drained or aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Closed;

pub(crate) struct WorkQueue {
    limit: Option<usize>,
    state: Mutex<QueueState>,
    wake: Notify,
    aborted: AtomicBool,
}

impl WorkQueue {
    /// Creates a queue; `None` means unbounded.
    pub(crate) fn new(limit: Option<usize>) -> Self {
        Self {
            limit: limit.map(|n| n.max(1)),
            state: Mutex::new(QueueState::default()),
            wake: Notify::new(),
            aborted: AtomicBool::new(false),
        }
    }

    /// Appends a unit; it starts once a slot is free and the queue is driven.
    pub(crate) fn push(&self, unit: Unit) -> Result<(), Closed> {
        {
            let mut state = self.state.lock();
            if state.closed {
                return Err(Closed);
            }
            state.pending.push_back(unit);
        }
        self.wake.notify_one();
        Ok(())
    }

    pub(crate) fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    #[cfg(test)]
    pub(crate) fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Drives the queue until nothing is pending or in flight.
    ///
    /// Returns the first fatal unit error immediately; stragglers keep running
    /// detached and their results are discarded.
    pub(crate) async fn on_idle(&self) -> Result<(), TaskError> {
        let mut in_flight: FuturesUnordered<UnitFuture> = FuturesUnordered::new();

        loop {
            if self.dispatch(&mut in_flight) {
                return Ok(());
            }

            tokio::select! {
                Some(res) = in_flight.next() => {
                    if let Err(err) = res {
                        self.abort(in_flight);
                        return Err(err);
                    }
                }
                _ = self.wake.notified() => {}
            }
        }
    }

    /// Starts pending units while slots are free. Returns `true` (and closes
    /// the queue) once there is nothing left to wait for.
    fn dispatch(&self, in_flight: &mut FuturesUnordered<UnitFuture>) -> bool {
        let ready: Vec<Unit> = {
            let mut state = self.state.lock();
            let free = match self.limit {
                Some(limit) => limit.saturating_sub(in_flight.len()),
                None => state.pending.len(),
            };
            let n = free.min(state.pending.len());
            state.pending.drain(..n).collect()
        };

        for unit in ready {
            in_flight.push(unit());
        }

        if !in_flight.is_empty() {
            return false;
        }
        let mut state = self.state.lock();
        if state.pending.is_empty() {
            state.closed = true;
            return true;
        }
        false
    }

    /// Aborts without driving: drops pending units and rejects further pushes.
    ///
    /// Used when the future driving [`WorkQueue::on_idle`] went away.
    pub(crate) fn close(&self) {
        self.aborted.store(true, Ordering::Release);
        let dropped = {
            let mut state = self.state.lock();
            state.closed = true;
            std::mem::take(&mut state.pending).len()
        };
        tracing::debug!(dropped, "queue closed");
    }

    fn abort(&self, in_flight: FuturesUnordered<UnitFuture>) {
        self.aborted.store(true, Ordering::Release);
        let dropped = {
            let mut state = self.state.lock();
            state.closed = true;
            std::mem::take(&mut state.pending).len()
        };
        tracing::debug!(
            dropped,
            in_flight = in_flight.len(),
            "queue aborted; in-flight units detached"
        );
        if !in_flight.is_empty() {
            tokio::spawn(async move {
                let mut in_flight = in_flight;
                while in_flight.next().await.is_some() {}
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;

    use futures::FutureExt;

    use super::*;

    fn unit<F>(f: F) -> Unit
    where
        F: std::future::Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        Box::new(move || f.boxed())
    }

    #[tokio::test]
    async fn empty_queue_is_idle_immediately() {
        let q = WorkQueue::new(Some(1));
        assert!(q.on_idle().await.is_ok());
        assert!(q.is_closed());
        assert_eq!(q.push(unit(async { Ok(()) })), Err(Closed));
    }

    #[tokio::test]
    async fn starts_in_fifo_order() {
        let q = WorkQueue::new(None);
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..5 {
            let order = order.clone();
            q.push(unit(async move {
                order.lock().push(i);
                tokio::time::sleep(Duration::from_millis(5 * (5 - i))).await;
                Ok(())
            }))
            .expect("open");
        }
        q.on_idle().await.expect("drains");
        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn respects_limit() {
        let q = WorkQueue::new(Some(2));
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        for _ in 0..6 {
            let active = active.clone();
            let peak = peak.clone();
            q.push(unit(async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }))
            .expect("open");
        }
        q.on_idle().await.expect("drains");
        assert_eq!(peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fatal_unit_drops_pending() {
        let q = WorkQueue::new(Some(1));
        let ran = Arc::new(AtomicUsize::new(0));
        q.push(unit(async { Err("boom".into()) })).expect("open");
        for _ in 0..3 {
            let ran = ran.clone();
            q.push(unit(async move {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .expect("open");
        }

        let err = q.on_idle().await.expect_err("fatal");
        assert_eq!(err.to_string(), "boom");
        assert!(q.is_aborted());
        assert_eq!(q.pending(), 0);
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn units_pushed_while_draining_are_picked_up() {
        let q = Arc::new(WorkQueue::new(Some(1)));
        let ran = Arc::new(AtomicUsize::new(0));

        let inner_q = q.clone();
        let inner_ran = ran.clone();
        q.push(unit(async move {
            let ran = inner_ran.clone();
            inner_q
                .push(unit(async move {
                    ran.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }))
                .expect("still open");
            inner_ran.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }))
        .expect("open");

        q.on_idle().await.expect("drains");
        assert_eq!(ran.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn close_drops_pending_and_rejects_pushes() {
        let q = WorkQueue::new(Some(1));
        q.push(unit(async { Ok(()) })).expect("open");
        q.push(unit(async { Ok(()) })).expect("open");

        q.close();
        assert!(q.is_aborted());
        assert!(q.is_closed());
        assert_eq!(q.pending(), 0);
        assert_eq!(q.push(unit(async { Ok(()) })), Err(Closed));
    }
}
