use crate::core::{Config, TaskView};
use crate::error::RunError;
use crate::events::Bus;

use super::{Render, RendererFactory};

/// Factory for [`SilentRenderer`]; registered as `"silent"`.
///
/// Nested lists always use it: their events reach the user through the
/// parent's renderer.
pub struct Silent;

impl RendererFactory for Silent {
    fn name(&self) -> &'static str {
        "silent"
    }

    fn create(&self, _tasks: TaskView, _cfg: &Config, _events: &Bus) -> Box<dyn Render> {
        Box::new(SilentRenderer)
    }
}

/// Renders nothing.
pub struct SilentRenderer;

impl Render for SilentRenderer {
    fn render(&mut self) {}

    fn end(&mut self, _error: Option<&RunError>) {}
}
