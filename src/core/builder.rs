use std::sync::Arc;

use crate::{
    core::{Config, Controller},
    error::BuildError,
    renderers::RendererKind,
    subscribers::Subscribe,
    tasks::TaskSpec,
};

/// Builder for constructing a [`Controller`] with optional features.
pub struct ControllerBuilder {
    cfg: Config,
    tasks: Vec<TaskSpec>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl ControllerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            tasks: Vec::new(),
            subscribers: Vec::new(),
        }
    }

    /// Appends one task spec.
    pub fn with_task(mut self, spec: TaskSpec) -> Self {
        self.tasks.push(spec);
        self
    }

    /// Appends several task specs, keeping their order.
    pub fn with_tasks(mut self, specs: impl IntoIterator<Item = TaskSpec>) -> Self {
        self.tasks.extend(specs);
        self
    }

    /// Overrides the configured renderer.
    pub fn with_renderer(mut self, renderer: impl Into<RendererKind>) -> Self {
        self.cfg.renderer = renderer.into();
        self
    }

    /// Sets event subscribers.
    ///
    /// Subscribers are attached to the bus before anything is published, so
    /// they observe the whole run, including the initial `EnabledChanged`
    /// events.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Validates everything and returns the controller.
    pub fn build(self) -> Result<Controller, BuildError> {
        Controller::build(self.tasks, self.cfg, 0, self.subscribers)
    }
}
