//! Public API for subscription contexts
//!
//! External modules should import from here rather than directly from internal modules.

pub use crate::context::context::Context;
pub use crate::context::error::{ContextError, ContextResult};
