//! Lifecycle hooks run around start and stop.
//!
//! Each phase keeps its hooks in registration order. Running a phase stops
//! at the first failure; hooks that already ran are not rolled back.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use micro_core::BoxFuture;
use thiserror::Error;

use crate::error::ServiceError;

/// Failure reported by a lifecycle hook.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HookError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl HookError {
    /// Creates a hook error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a hook error wrapping an underlying error.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for HookError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for HookError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Result type for lifecycle hooks.
pub type HookResult = Result<(), HookError>;

/// A registered hook: a zero-argument async callback.
pub type LifecycleHook = Arc<dyn Fn() -> BoxFuture<'static, HookResult> + Send + Sync>;

/// The point in the lifecycle a hook runs at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    /// Before the server is constructed.
    BeforeStart,
    /// After the listener is bound and serving.
    AfterStart,
    /// Before the server stops accepting connections.
    BeforeStop,
    /// After the server has drained.
    AfterStop,
}

impl HookPhase {
    /// All phases in lifecycle order.
    pub const ALL: [HookPhase; 4] = [
        HookPhase::BeforeStart,
        HookPhase::AfterStart,
        HookPhase::BeforeStop,
        HookPhase::AfterStop,
    ];

    fn index(self) -> usize {
        match self {
            Self::BeforeStart => 0,
            Self::AfterStart => 1,
            Self::BeforeStop => 2,
            Self::AfterStop => 3,
        }
    }
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BeforeStart => "before_start",
            Self::AfterStart => "after_start",
            Self::BeforeStop => "before_stop",
            Self::AfterStop => "after_stop",
        })
    }
}

/// Hooks for all four phases.
#[derive(Clone, Default)]
pub struct LifecycleHooks {
    phases: [Vec<(String, LifecycleHook)>; 4],
}

impl fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for phase in HookPhase::ALL {
            map.entry(&phase, &self.len(phase));
        }
        map.finish()
    }
}

impl LifecycleHooks {
    /// Creates an empty set of hooks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a hook named `<phase>_<index>`.
    pub fn push<F, Fut>(&mut self, phase: HookPhase, hook: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        let name = format!("{phase}_{}", self.len(phase));
        self.push_named(phase, name, hook);
    }

    /// Appends a named hook.
    pub fn push_named<F, Fut>(&mut self, phase: HookPhase, name: impl Into<String>, hook: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        let hook: LifecycleHook = Arc::new(move || Box::pin(hook()));
        self.phases[phase.index()].push((name.into(), hook));
    }

    /// Returns the number of hooks registered for `phase`.
    #[must_use]
    pub fn len(&self, phase: HookPhase) -> usize {
        self.phases[phase.index()].len()
    }

    /// Returns true if no phase has hooks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phases.iter().all(Vec::is_empty)
    }

    /// Runs the hooks of `phase` in order, stopping at the first failure.
    pub async fn run(&self, phase: HookPhase) -> Result<(), ServiceError> {
        for (name, hook) in &self.phases[phase.index()] {
            tracing::debug!(%phase, hook = %name, "Running lifecycle hook");
            if let Err(source) = hook().await {
                tracing::error!(%phase, hook = %name, error = %source, "Lifecycle hook failed");
                return Err(ServiceError::Hook {
                    phase,
                    hook: name.clone(),
                    source,
                });
            }
        }
        Ok(())
    }
}
