//! Configuration
//!
//! Settings come from an optional TOML file and are then overridden by the
//! command line. Library users can build [`Settings`] directly.

mod error;
mod settings;

pub use error::{ConfigError, ConfigResult};
pub use settings::{DemoSettings, LoggingSettings, ProducerSettings, Settings};

#[cfg(test)]
mod tests;
