//! Decorator values.

use micro_core::{BoxedHandler, Handler};
use std::fmt;
use std::sync::Arc;

/// When a decorator runs relative to the base handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecoratorPhase {
    /// Runs before the base handler.
    Before,
    /// Runs after the base handler has returned.
    After,
}

impl fmt::Display for DecoratorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => f.write_str("before"),
            Self::After => f.write_str("after"),
        }
    }
}

/// A side-effecting step attached to an endpoint.
///
/// The step has the handler signature: it may write to the response and
/// inspect or annotate the request.
#[derive(Clone)]
pub struct EndpointDecorator {
    phase: DecoratorPhase,
    step: BoxedHandler,
}

impl EndpointDecorator {
    /// Creates a decorator for `phase`.
    pub fn new(phase: DecoratorPhase, step: impl Handler) -> Self {
        Self {
            phase,
            step: Arc::new(step),
        }
    }

    /// Creates a decorator that runs before the base handler.
    pub fn before(step: impl Handler) -> Self {
        Self::new(DecoratorPhase::Before, step)
    }

    /// Creates a decorator that runs after the base handler.
    pub fn after(step: impl Handler) -> Self {
        Self::new(DecoratorPhase::After, step)
    }

    /// Returns the phase.
    #[must_use]
    pub fn phase(&self) -> DecoratorPhase {
        self.phase
    }

    pub(crate) fn into_step(self) -> BoxedHandler {
        self.step
    }
}

impl fmt::Debug for EndpointDecorator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointDecorator")
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}
