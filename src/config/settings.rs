//! TOML settings
//!
//! Every section and field is optional; missing values take their defaults.
//!
//! ```toml
//! [logging]
//! level = "debug"
//! format = "ext"
//!
//! [producer]
//! queue_capacity = 256
//! admission = "exclusive"
//! required_context = ["tenant"]
//!
//! [demo]
//! items = 1000
//! subscribers = 4
//! batch = 32
//! ```

use crate::config::error::{ConfigError, ConfigResult};
use crate::core::logging::LogFormat;
use crate::producer::api::{Admission, AdmissionPolicy, DEFAULT_QUEUE_CAPACITY};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = "Reactive";
const CONFIG_FILE: &str = "reactive.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub producer: ProducerSettings,
    pub demo: DemoSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// flexi_logger level specification
    pub level: String,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
    /// `None` colours output only when stdout is a terminal
    pub color: Option<bool>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            file: None,
            color: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProducerSettings {
    /// Items buffered for slow subscribers before publishing fails
    pub queue_capacity: usize,
    pub admission: AdmissionPolicy,
    pub max_subscribers: Option<usize>,
    pub required_context: Vec<String>,
    pub rejection_message: Option<String>,
}

impl Default for ProducerSettings {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            admission: AdmissionPolicy::Open,
            max_subscribers: None,
            required_context: Vec::new(),
            rejection_message: None,
        }
    }
}

impl From<&ProducerSettings> for Admission {
    fn from(settings: &ProducerSettings) -> Self {
        let mut admission = Admission::open()
            .with_policy(settings.admission)
            .with_required_context(settings.required_context.iter().cloned());
        if let Some(max_subscribers) = settings.max_subscribers {
            admission = admission.with_max_subscribers(max_subscribers);
        }
        if let Some(message) = &settings.rejection_message {
            admission = admission.with_rejection_message(message.clone());
        }
        admission
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoSettings {
    /// Items published by the demonstration
    pub items: u64,
    pub subscribers: usize,
    /// Demand each subscriber signals whenever its previous batch is used up
    pub batch: u64,
    /// Attempts per item while the queue is full
    pub publish_attempts: usize,
    pub retry_delay_ms: u64,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            items: 100,
            subscribers: 3,
            batch: 16,
            publish_attempts: 50,
            retry_delay_ms: 2,
        }
    }
}

impl Settings {
    /// Default configuration file location, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load settings from `path`, or from the default location if it exists
    ///
    /// An explicit path must exist. Without one and without a default file,
    /// the built-in defaults are returned.
    pub async fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let path = match path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                })
            }
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => {
                    log::debug!("No configuration file found; using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
        let settings = Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.clone(),
                source,
            },
            other => other,
        })?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(settings)
    }

    /// Parse and validate settings from TOML text
    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        let settings: Settings =
            toml::from_str(contents).map_err(|source| ConfigError::Parse {
                path: PathBuf::new(),
                source,
            })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.producer.queue_capacity == 0 {
            return Err(invalid(
                "producer.queue_capacity",
                "queue capacity must be at least 1",
            ));
        }
        if self.producer.max_subscribers == Some(0) {
            return Err(invalid(
                "producer.max_subscribers",
                "max_subscribers must be at least 1; use admission = \"closed\" to refuse everyone",
            ));
        }
        if self.producer.required_context.iter().any(String::is_empty) {
            return Err(invalid(
                "producer.required_context",
                "required context keys must not be empty",
            ));
        }
        if self.demo.batch == 0 {
            return Err(invalid("demo.batch", "batch demand must be at least 1"));
        }
        if self.demo.publish_attempts == 0 {
            return Err(invalid(
                "demo.publish_attempts",
                "publish_attempts must be at least 1",
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        message: message.to_string(),
    }
}
