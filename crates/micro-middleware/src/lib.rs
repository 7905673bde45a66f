//! # Micro Middleware
//!
//! Per-endpoint decorator chains.
//!
//! An endpoint's base handler is wrapped with an ordered list of
//! [`EndpointDecorator`]s. Every [`DecoratorPhase::Before`] decorator runs
//! before the base handler in list order, every [`DecoratorPhase::After`]
//! decorator runs after it, also in list order. Decorators write to the same
//! response and cannot stop the chain.
//!
//! ```
//! use micro_core::{handler_fn, ResponseWriter};
//! use micro_middleware::{decorate, EndpointDecorator};
//! use std::sync::Arc;
//!
//! let world = Arc::new(handler_fn(|w, _| Box::pin(async move { w.write("World"); })));
//! let hello = EndpointDecorator::before(handler_fn(|w, _| Box::pin(async move { w.write("Hello "); })));
//! let bang = EndpointDecorator::after(handler_fn(|w, _| Box::pin(async move { w.write("!"); })));
//!
//! let handler = decorate(world, [hello, bang]);
//! # let _ = handler;
//! ```

#![doc(html_root_url = "https://docs.rs/micro-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod chain;
mod decorator;

pub use chain::{decorate, DecoratorChain};
pub use decorator::{DecoratorPhase, EndpointDecorator};
