//! Subscription Context
//!
//! Immutable metadata supplied by the caller when subscribing. Two surface
//! forms are accepted, a list of key/value pairs and an associative map, and
//! both converge on the same canonical [`Context`] with a single fallible
//! [`Context::get`] lookup.

#[allow(clippy::module_inception)]
mod context;
mod error;

pub mod api;

pub use context::Context;
pub use error::{ContextError, ContextResult};
