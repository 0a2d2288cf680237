//! # Renderers: turn the task list and its events into user-facing output.
//!
//! A renderer is created once per run from a [`RendererFactory`] and gets the
//! live [`TaskView`], the controller's [`Config`] and its event [`Bus`]. The
//! controller calls [`Render::render`] when the run starts and
//! [`Render::end`] exactly once when it settles.
//!
//! ## Selection
//! ```text
//! RendererKind::Named("default" | "verbose") ─► VerboseRenderer
//! RendererKind::Named("silent")              ─► SilentRenderer
//! RendererKind::Named(<unknown>)             ─► default
//! RendererKind::Custom(factory)              ─► factory
//!
//! factory.requires_tty() && stdout is not a terminal ─► non_tty_renderer
//! ```

mod silent;
mod verbose;

use std::borrow::Cow;
use std::io::IsTerminal;
use std::sync::Arc;

use crate::core::{Config, TaskView};
use crate::error::RunError;
use crate::events::Bus;

pub use silent::{Silent, SilentRenderer};
pub use verbose::{Verbose, VerboseRenderer};

/// A live renderer instance.
pub trait Render: Send + 'static {
    /// Called when the run starts.
    fn render(&mut self);

    /// Called once when the run settles; `error` is the run's failure, if any.
    fn end(&mut self, error: Option<&RunError>);
}

/// Creates renderers; one instance per run.
pub trait RendererFactory: Send + Sync + 'static {
    /// Stable name, used in logs and by [`Controller::renderer_name`](crate::Controller::renderer_name).
    fn name(&self) -> &'static str;

    /// Whether the renderer needs stdout to be a terminal.
    fn requires_tty(&self) -> bool {
        false
    }

    fn create(&self, tasks: TaskView, cfg: &Config, events: &Bus) -> Box<dyn Render>;
}

/// Renderer selection: a built-in name or a custom factory.
#[derive(Clone)]
pub enum RendererKind {
    Named(Cow<'static, str>),
    Custom(Arc<dyn RendererFactory>),
}

impl RendererKind {
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        RendererKind::Named(name.into())
    }

    pub fn custom(factory: impl RendererFactory) -> Self {
        RendererKind::Custom(Arc::new(factory))
    }
}

impl From<&'static str> for RendererKind {
    fn from(name: &'static str) -> Self {
        RendererKind::named(name)
    }
}

impl From<String> for RendererKind {
    fn from(name: String) -> Self {
        RendererKind::named(name)
    }
}

impl From<Arc<dyn RendererFactory>> for RendererKind {
    fn from(factory: Arc<dyn RendererFactory>) -> Self {
        RendererKind::Custom(factory)
    }
}

impl std::fmt::Debug for RendererKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RendererKind::Named(name) => f.debug_tuple("Named").field(name).finish(),
            RendererKind::Custom(factory) => f.debug_tuple("Custom").field(&factory.name()).finish(),
        }
    }
}

/// Picks the factory for `kind`, falling back to `fallback` when it needs a
/// terminal and stdout is not one.
pub(crate) fn resolve(kind: &RendererKind, fallback: &RendererKind) -> Arc<dyn RendererFactory> {
    resolve_with(kind, fallback, std::io::stdout().is_terminal())
}

fn resolve_with(kind: &RendererKind, fallback: &RendererKind, is_tty: bool) -> Arc<dyn RendererFactory> {
    let factory = lookup(kind);
    if factory.requires_tty() && !is_tty {
        tracing::debug!(
            renderer = factory.name(),
            "stdout is not a terminal; using fallback renderer"
        );
        return lookup(fallback);
    }
    factory
}

fn lookup(kind: &RendererKind) -> Arc<dyn RendererFactory> {
    match kind {
        RendererKind::Custom(factory) => factory.clone(),
        RendererKind::Named(name) => match &**name {
            "silent" => Arc::new(Silent),
            "default" | "verbose" => Arc::new(Verbose),
            other => {
                tracing::debug!(renderer = other, "unknown renderer; using default");
                Arc::new(Verbose)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fancy;

    impl RendererFactory for Fancy {
        fn name(&self) -> &'static str {
            "fancy"
        }

        fn requires_tty(&self) -> bool {
            true
        }

        fn create(&self, _: TaskView, _: &Config, _: &Bus) -> Box<dyn Render> {
            Box::new(SilentRenderer)
        }
    }

    #[test]
    fn names_resolve_to_builtins() {
        let fallback = RendererKind::named("verbose");
        assert_eq!(resolve_with(&"silent".into(), &fallback, false).name(), "silent");
        assert_eq!(resolve_with(&"default".into(), &fallback, false).name(), "verbose");
        assert_eq!(resolve_with(&"no-such".into(), &fallback, true).name(), "verbose");
    }

    #[test]
    fn tty_renderer_falls_back_without_terminal() {
        let fancy = RendererKind::custom(Fancy);
        let fallback = RendererKind::named("silent");
        assert_eq!(resolve_with(&fancy, &fallback, true).name(), "fancy");
        assert_eq!(resolve_with(&fancy, &fallback, false).name(), "silent");
    }
}
