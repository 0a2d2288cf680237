//! # Controller configuration.
//!
//! Provides [`Config`], the settings a [`Controller`](crate::Controller) is built with.
//!
//! Config is used in two ways:
//! 1. **Controller creation**: `Controller::new(tasks, config)`
//! 2. **Nested lists**: a subtask list inherits its parent's config and may
//!    override concurrency and error policy (see [`Subtasks`](crate::Subtasks)).
//!
//! ## Conversions
//! - `Concurrency::from(true)` → unbounded
//! - `Concurrency::from(false)` → sequential
//! - `Concurrency::from(n)` → at most `n` in flight (`0` is rejected at build time)

use crate::error::BuildError;
use crate::renderers::RendererKind;

/// How many task bodies may be in flight at once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Concurrency {
    /// One task at a time, in order (default).
    #[default]
    Sequential,
    /// At most `n` tasks at a time.
    Limited(usize),
    /// Every queued task starts immediately.
    Unbounded,
}

impl Concurrency {
    /// Returns the in-flight limit as an `Option`.
    ///
    /// - `None` → unbounded
    /// - `Some(n)` → at most `n` concurrent units
    #[inline]
    pub fn limit(&self) -> Option<usize> {
        match self {
            Concurrency::Sequential => Some(1),
            Concurrency::Limited(n) => Some(*n),
            Concurrency::Unbounded => None,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), BuildError> {
        match self {
            Concurrency::Limited(0) => Err(BuildError::ZeroConcurrency),
            _ => Ok(()),
        }
    }
}

impl From<bool> for Concurrency {
    fn from(concurrent: bool) -> Self {
        if concurrent {
            Concurrency::Unbounded
        } else {
            Concurrency::Sequential
        }
    }
}

impl From<usize> for Concurrency {
    fn from(n: usize) -> Self {
        Concurrency::Limited(n)
    }
}

/// What a failing task does to the rest of the run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// The first failure aborts the run; queued tasks never start (default).
    #[default]
    FailFast,
    /// Failures are recorded and the run drains the whole list, then reports
    /// an aggregate error.
    Collect,
}

impl ErrorPolicy {
    /// Maps the classic `exit_on_error` flag onto a policy.
    pub fn from_exit_on_error(exit_on_error: bool) -> Self {
        if exit_on_error {
            ErrorPolicy::FailFast
        } else {
            ErrorPolicy::Collect
        }
    }

    #[inline]
    pub fn is_fail_fast(&self) -> bool {
        matches!(self, ErrorPolicy::FailFast)
    }
}

/// Settings for one controller.
///
/// ## Field semantics
/// - `concurrency`: in-flight cap for task bodies
/// - `error_policy`: fail-fast or collect
/// - `renderer`: renderer used when stdout is a terminal (or always, for
///   renderers that do not need one)
/// - `non_tty_renderer`: fallback when the chosen renderer needs a terminal
///   and stdout is not one
/// - `show_subtasks`: forward nested list events to this controller's bus
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of task bodies in flight.
    pub concurrency: Concurrency,

    /// Failure propagation policy for this list.
    pub error_policy: ErrorPolicy,

    /// Preferred renderer.
    pub renderer: RendererKind,

    /// Renderer used instead of `renderer` when it needs a terminal and
    /// there is none.
    pub non_tty_renderer: RendererKind,

    /// Whether events of nested subtask lists reach this controller's bus.
    pub show_subtasks: bool,
}

impl Config {
    /// Builder-style setter for [`Config::concurrency`].
    pub fn with_concurrency(mut self, concurrency: impl Into<Concurrency>) -> Self {
        self.concurrency = concurrency.into();
        self
    }

    /// Builder-style setter for [`Config::error_policy`].
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// `exit_on_error = false` switches to [`ErrorPolicy::Collect`].
    pub fn exit_on_error(self, exit_on_error: bool) -> Self {
        self.with_error_policy(ErrorPolicy::from_exit_on_error(exit_on_error))
    }

    /// Builder-style setter for [`Config::renderer`].
    pub fn with_renderer(mut self, renderer: impl Into<RendererKind>) -> Self {
        self.renderer = renderer.into();
        self
    }

    /// Builder-style setter for [`Config::non_tty_renderer`].
    pub fn with_non_tty_renderer(mut self, renderer: impl Into<RendererKind>) -> Self {
        self.non_tty_renderer = renderer.into();
        self
    }

    /// Builder-style setter for [`Config::show_subtasks`].
    pub fn with_show_subtasks(mut self, show: bool) -> Self {
        self.show_subtasks = show;
        self
    }

    /// Returns the in-flight limit (`None` = unbounded).
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        self.concurrency.limit()
    }

    pub(crate) fn validate(&self) -> Result<(), BuildError> {
        self.concurrency.validate()
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `concurrency = Sequential`
    /// - `error_policy = FailFast`
    /// - `renderer = "default"`
    /// - `non_tty_renderer = "verbose"`
    /// - `show_subtasks = true`
    fn default() -> Self {
        Self {
            concurrency: Concurrency::Sequential,
            error_policy: ErrorPolicy::FailFast,
            renderer: RendererKind::named("default"),
            non_tty_renderer: RendererKind::named("verbose"),
            show_subtasks: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrency_conversions() {
        assert_eq!(Concurrency::from(true).limit(), None);
        assert_eq!(Concurrency::from(false).limit(), Some(1));
        assert_eq!(Concurrency::from(4usize).limit(), Some(4));
        assert_eq!(Concurrency::default(), Concurrency::Sequential);
    }

    #[test]
    fn zero_limit_is_rejected() {
        let cfg = Config::default().with_concurrency(0usize);
        assert_eq!(cfg.validate(), Err(BuildError::ZeroConcurrency));
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn exit_on_error_maps_to_policy() {
        assert_eq!(
            Config::default().exit_on_error(false).error_policy,
            ErrorPolicy::Collect
        );
        assert!(Config::default().error_policy.is_fail_fast());
    }
}
