//! # Line-per-event renderer.
//!
//! [`VerboseRenderer`] writes one `tracing` record per event, which makes it
//! usable in CI logs and anywhere stdout is not a terminal. It is what
//! `"default"` and `"verbose"` resolve to.
//!
//! ## Output format
//! Every record carries the task's `task` title and `depth` as fields; the
//! message names what happened. With `tracing_subscriber::fmt`:
//! ```text
//!  INFO run started tasks=3
//!  INFO started task=build depth=0
//!  INFO output task=build depth=0 output="compiling 12 crates"
//!  INFO completed task=build depth=0
//!  INFO output task=deploy depth=0 output="dry run"
//!  INFO skipped task=deploy depth=0
//!  WARN failed task=test depth=1
//!  INFO output task=test depth=1 output="3 tests failed"
//!  INFO title changed task=publish depth=0
//!  INFO task added task=cleanup depth=0
//!  INFO subtasks added task=test depth=0
//! ERROR run failed error=3 tests failed label="run_task_failed"
//! ```

use std::sync::Arc;

use crate::core::{Config, TaskView};
use crate::error::RunError;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::Subscribe;
use crate::tasks::TaskState;

use super::{Render, RendererFactory};

/// Factory for [`VerboseRenderer`]; registered as `"verbose"` and `"default"`.
pub struct Verbose;

impl RendererFactory for Verbose {
    fn name(&self) -> &'static str {
        "verbose"
    }

    fn create(&self, tasks: TaskView, _cfg: &Config, events: &Bus) -> Box<dyn Render> {
        Box::new(VerboseRenderer::new(tasks, events.clone()))
    }
}

/// Logs every task event as it happens.
pub struct VerboseRenderer {
    tasks: TaskView,
    events: Bus,
    attached: bool,
}

impl VerboseRenderer {
    pub fn new(tasks: TaskView, events: Bus) -> Self {
        Self {
            tasks,
            events,
            attached: false,
        }
    }
}

impl Render for VerboseRenderer {
    fn render(&mut self) {
        if self.attached {
            return;
        }
        self.attached = true;
        tracing::info!(tasks = self.tasks.len(), "run started");
        self.events.subscribe(Arc::new(EventLog));
    }

    fn end(&mut self, error: Option<&RunError>) {
        match error {
            None => tracing::info!("run finished"),
            Some(err) => tracing::error!(error = %err, label = err.as_label(), "run failed"),
        }
    }
}

/// Bus listener behind [`VerboseRenderer`].
struct EventLog;

impl Subscribe for EventLog {
    fn on_event(&self, e: &Event) {
        let task = e.task.title();
        let depth = e.task.depth();
        match e.kind {
            EventKind::StateChanged => match e.state {
                Some(TaskState::Running) => tracing::info!(%task, depth, "started"),
                Some(TaskState::Completed) => tracing::info!(%task, depth, "completed"),
                Some(TaskState::Skipped) => tracing::info!(%task, depth, "skipped"),
                Some(TaskState::Failed) => tracing::warn!(%task, depth, "failed"),
                Some(TaskState::Pending) | None => {}
            },
            EventKind::OutputChanged => tracing::info!(
                %task,
                depth,
                output = e.text.as_deref().unwrap_or_default(),
                "output"
            ),
            EventKind::TitleChanged => tracing::info!(%task, depth, "title changed"),
            EventKind::TaskAdded => tracing::info!(%task, depth, "task added"),
            EventKind::SubtasksAdded => tracing::info!(%task, depth, "subtasks added"),
            EventKind::EnabledChanged => {
                tracing::debug!(%task, depth, enabled = ?e.enabled, "enabled changed")
            }
        }
    }

    fn name(&self) -> &'static str {
        "verbose-renderer"
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::fmt;

    use parking_lot::Mutex;
    use tracing::field::{Field, Visit};
    use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};
    use tracing_subscriber::Layer;

    use super::*;
    use crate::tasks::{Task, TaskSpec};

    type Record = BTreeMap<&'static str, String>;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<Record>>>);

    struct Fields(Record);

    impl Visit for Fields {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.0.insert(field.name(), format!("{value:?}"));
        }

        fn record_str(&mut self, field: &Field, value: &str) {
            self.0.insert(field.name(), value.to_string());
        }
    }

    impl<S: tracing::Subscriber> Layer<S> for Capture {
        fn on_event(&self, event: &tracing::Event<'_>, _: LayerContext<'_, S>) {
            let mut fields = Fields(Record::new());
            event.record(&mut fields);
            self.0.lock().push(fields.0);
        }
    }

    #[test]
    fn records_carry_task_and_depth_as_fields() {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());

        tracing::subscriber::with_default(subscriber, || {
            let bus = Bus::new();
            let view = TaskView::default();
            let task = Task::new(TaskSpec::new("build", |_, _| async { Ok(()) }), 1);
            view.push(task.clone());

            let mut renderer = VerboseRenderer::new(view, bus.clone());
            renderer.render();
            bus.publish(Event::state_changed(task.clone(), TaskState::Running));
            bus.publish(Event::output_changed(task, "compiling"));
            renderer.end(Some(&RunError::Reentrant));
        });

        let records = capture.0.lock().clone();
        let find = |message: &str| {
            records
                .iter()
                .find(|r| r.get("message").map(String::as_str) == Some(message))
                .cloned()
                .unwrap_or_else(|| panic!("no {message:?} record in {records:?}"))
        };

        assert_eq!(find("run started")["tasks"], "1");

        let started = find("started");
        assert_eq!(started["task"], "build");
        assert_eq!(started["depth"], "1");

        let output = find("output");
        assert_eq!(output["task"], "build");
        assert_eq!(output["output"], "compiling");

        let failed = find("run failed");
        assert_eq!(failed["label"], "run_reentrant");
        assert_eq!(failed["error"], "controller has already been run");
    }
}
