//! Route registration errors.

use http::Method;
use thiserror::Error;

/// Errors raised while registering a route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The pattern does not start with `/`.
    #[error("route pattern '{pattern}' must begin with '/'")]
    MissingLeadingSlash {
        /// The rejected pattern.
        pattern: String,
    },

    /// A `*wildcard` segment is followed by more segments.
    #[error("wildcard must be the last segment in route pattern '{pattern}'")]
    WildcardNotLast {
        /// The rejected pattern.
        pattern: String,
    },

    /// A `{}` segment without a name, or a `*` without a name.
    #[error("unnamed parameter in route pattern '{pattern}'")]
    UnnamedParam {
        /// The rejected pattern.
        pattern: String,
    },

    /// Two patterns use different parameter names at the same position.
    #[error("parameter '{{{name}}}' in '{pattern}' conflicts with existing '{{{existing}}}'")]
    ParamConflict {
        /// The rejected pattern.
        pattern: String,
        /// Name used by the new pattern.
        name: String,
        /// Name already registered at that position.
        existing: String,
    },

    /// The (method, pattern) pair is already registered.
    #[error("route {method} {pattern} is already registered")]
    Duplicate {
        /// Method of the duplicate route.
        method: Method,
        /// Pattern of the duplicate route.
        pattern: String,
    },
}
