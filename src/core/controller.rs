//! # Controller: owns a task list and runs it to settlement.
//!
//! The [`Controller`] holds an ordered list of [`Task`]s, a bounded-concurrency
//! [`WorkQueue`], the event [`Bus`] and a renderer. `run()` drives every task
//! through the queue and settles once nothing is pending or in flight, or as
//! soon as a fail-fast task fails.
//!
//! ## Architecture
//! ```text
//! Controller::new(specs, cfg)
//!     └─► validate cfg + every spec ─► Task (pending) per spec
//!
//! run_with(ctx):
//!   Idle ──► Running(RunState{ctx, policy, errors})
//!     ├─► renderer.create(view, cfg, bus) → render()
//!     ├─► check_all(ctx)                   (EnabledChanged on change)
//!     ├─► queue.push(unit) per task        (unit = executor::execute)
//!     └─► queue.on_idle().await
//!            ├─ Ok, no errors   → Ok(ctx)
//!            ├─ Ok, errors      → Err(Aggregate{errors, ctx})
//!            └─ Err(fatal)      → Err(Task{error, ctx})
//!   ──► Finished
//!     ├─► bus.complete()
//!     └─► renderer.end(error)
//!
//! add(spec) while Running:
//!   Task ─► list ─► TaskAdded ─► queue.push(unit)   (the run waits for it)
//! ```
//!
//! ## Rules
//! - A controller runs at most once; a second `run` is [`RunError::Reentrant`].
//! - A run always settles, even when its future is dropped or unwinds.
//! - Tasks start in list order; at most `cfg.concurrency` bodies are in flight.
//! - Nested lists (see [`Subtasks`]) are controllers too: they inherit the
//!   parent's config, use the silent renderer and share the parent's context.

use std::sync::{Arc, Weak};

use futures::FutureExt;
use parking_lot::Mutex;

use crate::context::Context;
use crate::core::builder::ControllerBuilder;
use crate::core::config::{Config, ErrorPolicy};
use crate::core::executor;
use crate::core::queue::{Closed, WorkQueue};
use crate::core::view::TaskView;
use crate::error::{BuildError, RunError, TaskError};
use crate::events::{Bus, Event};
use crate::renderers::{self, Render, RendererFactory, RendererKind};
use crate::subscribers::{Forward, Subscribe};
use crate::tasks::{Subtasks, Task, TaskSpec};

/// Per-run state shared by the executor and every [`TaskHandle`](crate::TaskHandle).
pub(crate) struct RunState {
    pub(crate) context: Context,
    pub(crate) policy: ErrorPolicy,
    errors: Mutex<Vec<TaskError>>,
}

impl RunState {
    fn new(context: Context, policy: ErrorPolicy) -> Self {
        Self {
            context,
            policy,
            errors: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn push_error(&self, error: TaskError) {
        self.errors.lock().push(error);
    }

    pub(crate) fn extend_errors(&self, errors: Vec<TaskError>) {
        self.errors.lock().extend(errors);
    }

    fn take_errors(&self) -> Vec<TaskError> {
        std::mem::take(&mut *self.errors.lock())
    }
}

enum Phase {
    Idle,
    Running(Arc<RunState>),
    Finished,
}

struct RendererSlot {
    factory: Arc<dyn RendererFactory>,
    instance: Option<Box<dyn Render>>,
}

struct Inner {
    cfg: Config,
    depth: usize,
    tasks: TaskView,
    queue: WorkQueue,
    bus: Bus,
    renderer: Mutex<RendererSlot>,
    phase: Mutex<Phase>,
}

/// Orchestrates one list of tasks.
///
/// Cheap to clone; clones share the same list.
///
/// ## Example
/// ```rust
/// use taskline::{Config, Context, Controller, TaskSpec};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let list = Controller::new(
///         [
///             TaskSpec::new("fetch", |ctx: Context, _| async move {
///                 ctx.insert("rows", 3u32);
///                 Ok(())
///             }),
///             TaskSpec::new("count", |ctx: Context, task: taskline::TaskHandle| async move {
///                 let rows = ctx.get::<u32>("rows").unwrap_or_default();
///                 task.set_output(format!("{rows} rows"));
///                 Ok(())
///             }),
///         ],
///         Config::default().with_renderer("silent"),
///     )?;
///
///     let ctx = list.run().await?;
///     assert_eq!(ctx.get::<u32>("rows"), Some(3));
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Controller {
    inner: Arc<Inner>,
}

/// Non-owning reference held by queued units and task handles.
#[derive(Clone)]
pub(crate) struct WeakController {
    inner: Weak<Inner>,
}

impl WeakController {
    pub(crate) fn upgrade(&self) -> Option<Controller> {
        self.inner.upgrade().map(|inner| Controller { inner })
    }
}

impl Controller {
    /// Creates a controller over `tasks`.
    ///
    /// Fails if the config is unusable or any spec is malformed; nothing runs
    /// until [`Controller::run`].
    pub fn new(
        tasks: impl IntoIterator<Item = TaskSpec>,
        cfg: Config,
    ) -> Result<Self, BuildError> {
        Self::build(tasks, cfg, 0, Vec::new())
    }

    /// Returns a [`ControllerBuilder`] for more involved setups.
    pub fn builder(cfg: Config) -> ControllerBuilder {
        ControllerBuilder::new(cfg)
    }

    pub(crate) fn build(
        tasks: impl IntoIterator<Item = TaskSpec>,
        cfg: Config,
        depth: usize,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Result<Self, BuildError> {
        cfg.validate()?;
        let specs: Vec<TaskSpec> = tasks.into_iter().collect();
        for spec in &specs {
            spec.validate()?;
        }

        let factory = renderers::resolve(&cfg.renderer, &cfg.non_tty_renderer);
        let bus = Bus::new();
        for sub in subscribers {
            bus.subscribe(sub);
        }

        let tasks = TaskView::default();
        for spec in specs {
            tasks.push(Task::new(spec, depth));
        }

        Ok(Self {
            inner: Arc::new(Inner {
                queue: WorkQueue::new(cfg.concurrency_limit()),
                cfg,
                depth,
                tasks,
                bus,
                renderer: Mutex::new(RendererSlot {
                    factory,
                    instance: None,
                }),
                phase: Mutex::new(Phase::Idle),
            }),
        })
    }

    /// Appends a task.
    ///
    /// Before `run` the task simply joins the list. During a run it is also
    /// announced (`TaskAdded`) and queued; the run does not settle before it
    /// has been processed. After the run it is rejected with
    /// [`BuildError::Finished`].
    pub fn add(&self, spec: TaskSpec) -> Result<&Self, BuildError> {
        spec.validate()?;
        let run = match &*self.inner.phase.lock() {
            Phase::Idle => None,
            Phase::Running(run) => Some(run.clone()),
            Phase::Finished => return Err(BuildError::Finished),
        };

        let task = Task::new(spec, self.inner.depth);
        self.inner.tasks.push(task.clone());

        if let Some(run) = run {
            self.inner.bus.publish(Event::task_added(task.clone()));
            if self.queue_task(task, run).is_err() {
                tracing::warn!(depth = self.inner.depth, "run settled before added task was queued");
                return Err(BuildError::Finished);
            }
        }
        Ok(self)
    }

    /// Appends several tasks; all are validated before any is added.
    pub fn add_all(&self, specs: impl IntoIterator<Item = TaskSpec>) -> Result<&Self, BuildError> {
        let specs: Vec<TaskSpec> = specs.into_iter().collect();
        for spec in &specs {
            spec.validate()?;
        }
        for spec in specs {
            self.add(spec)?;
        }
        Ok(self)
    }

    /// Replaces the renderer. Has no effect once the renderer was created.
    pub fn set_renderer(&self, kind: impl Into<RendererKind>) {
        let mut slot = self.inner.renderer.lock();
        if slot.instance.is_some() {
            tracing::debug!("renderer already created; set_renderer ignored");
            return;
        }
        slot.factory = renderers::resolve(&kind.into(), &self.inner.cfg.non_tty_renderer);
    }

    /// Snapshot of the task list in insertion order.
    pub fn tasks(&self) -> Vec<Arc<Task>> {
        self.inner.tasks.snapshot()
    }

    /// Live view of the task list.
    pub fn view(&self) -> TaskView {
        self.inner.tasks.clone()
    }

    /// True once the renderer has been created (i.e. `run` has started).
    pub fn running(&self) -> bool {
        self.inner.renderer.lock().instance.is_some()
    }

    /// Event stream of this list (and, with `show_subtasks`, of its nested lists).
    pub fn events(&self) -> &Bus {
        &self.inner.bus
    }

    pub fn config(&self) -> &Config {
        &self.inner.cfg
    }

    /// Name of the resolved renderer.
    pub fn renderer_name(&self) -> &'static str {
        self.inner.renderer.lock().factory.name()
    }

    /// Runs the list with a fresh [`Context`].
    ///
    /// Must be polled inside a Tokio runtime; see [`Controller::run_with`].
    pub async fn run(&self) -> Result<Context, RunError> {
        self.run_with(Context::new()).await
    }

    /// Runs the list on `context` and returns it once every task settled.
    ///
    /// ### Errors
    /// - [`RunError::Task`]: fail-fast policy, first failing task.
    /// - [`RunError::Aggregate`]: collect policy, or errors reported through
    ///   [`TaskHandle::report`](crate::TaskHandle::report).
    /// - [`RunError::Reentrant`]: the controller was already run.
    ///
    /// ### Runtime
    /// Must be polled inside a Tokio runtime: after a fail-fast failure the
    /// bodies still in flight are spawned onto it and finish detached.
    ///
    /// Dropping the returned future before it resolves cancels the bodies in
    /// flight and settles the list anyway: the phase becomes finished, the bus
    /// completes and the renderer ends with [`RunError::Interrupted`].
    pub async fn run_with(&self, context: Context) -> Result<Context, RunError> {
        let run = Arc::new(RunState::new(context, self.inner.cfg.error_policy));
        {
            let mut phase = self.inner.phase.lock();
            if !matches!(*phase, Phase::Idle) {
                return Err(RunError::Reentrant);
            }
            *phase = Phase::Running(run.clone());
        }
        let mut guard = SettleOnDrop { list: self, armed: true };

        self.render();
        tracing::debug!(
            tasks = self.inner.tasks.len(),
            depth = self.inner.depth,
            "run started"
        );

        self.check_all(&run.context);
        for task in self.inner.tasks.snapshot() {
            if self.queue_task(task, run.clone()).is_err() {
                break;
            }
        }

        let result = match self.inner.queue.on_idle().await {
            Ok(()) => {
                let errors = run.take_errors();
                if errors.is_empty() {
                    Ok(run.context.clone())
                } else {
                    Err(RunError::Aggregate {
                        errors,
                        context: run.context.clone(),
                    })
                }
            }
            Err(error) => Err(RunError::Task {
                error,
                context: run.context.clone(),
            }),
        };

        guard.armed = false;
        match &result {
            Ok(_) => tracing::debug!(depth = self.inner.depth, "run finished"),
            Err(e) => tracing::debug!(depth = self.inner.depth, error = %e, label = e.as_label(), "run failed"),
        }
        self.settle(result.as_ref().err());
        result
    }

    pub(crate) fn downgrade(&self) -> WeakController {
        WeakController {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub(crate) fn is_aborted(&self) -> bool {
        self.inner.queue.is_aborted()
    }

    /// Re-evaluates every task's enable predicate.
    pub(crate) fn check_all(&self, ctx: &Context) {
        for task in self.inner.tasks.snapshot() {
            if let Some(enabled) = task.check(ctx) {
                self.inner.bus.publish(Event::enabled_changed(task, enabled));
            }
        }
    }

    /// Builds the controller for a nested list returned by a body.
    pub(crate) fn nested(&self, subtasks: Subtasks) -> Result<Controller, BuildError> {
        let mut cfg = self.inner.cfg.clone();
        if let Some(concurrency) = subtasks.concurrency {
            cfg.concurrency = concurrency;
        }
        if let Some(policy) = subtasks.error_policy {
            cfg.error_policy = policy;
        }
        cfg.renderer = RendererKind::named("silent");

        let mut subscribers: Vec<Arc<dyn Subscribe>> = Vec::new();
        if cfg.show_subtasks {
            subscribers.push(Arc::new(Forward::new(self.inner.bus.clone())));
        }
        Self::build(subtasks.specs, cfg, self.inner.depth + 1, subscribers)
    }

    fn queue_task(&self, task: Arc<Task>, run: Arc<RunState>) -> Result<(), Closed> {
        let list = self.downgrade();
        self.inner.queue.push(Box::new(move || match list.upgrade() {
            Some(list) => executor::execute(list, task, run),
            None => futures::future::ready(Ok(())).boxed(),
        }))
    }

    fn render(&self) {
        let mut slot = self.inner.renderer.lock();
        if slot.instance.is_none() {
            let renderer = slot
                .factory
                .create(self.inner.tasks.clone(), &self.inner.cfg, &self.inner.bus);
            slot.instance = Some(renderer);
        }
        if let Some(renderer) = slot.instance.as_mut() {
            renderer.render();
        }
    }

    /// Finished phase, completed bus, ended renderer.
    fn settle(&self, error: Option<&RunError>) {
        *self.inner.phase.lock() = Phase::Finished;
        self.inner.bus.complete();
        if let Some(renderer) = self.inner.renderer.lock().instance.as_mut() {
            renderer.end(error);
        }
    }
}

/// Settles the list if `run_with` is dropped or unwinds before it returns.
struct SettleOnDrop<'a> {
    list: &'a Controller,
    armed: bool,
}

impl Drop for SettleOnDrop<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        tracing::warn!(depth = self.list.inner.depth, "run interrupted before it settled");
        self.list.inner.queue.close();
        self.list.settle(Some(&RunError::Interrupted));
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("depth", &self.inner.depth)
            .field("tasks", &self.inner.tasks.len())
            .field("concurrency", &self.inner.cfg.concurrency)
            .field("error_policy", &self.inner.cfg.error_policy)
            .finish()
    }
}
