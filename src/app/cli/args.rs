//! Command line arguments
//!
//! Every option overrides the matching configuration file setting.

use crate::config::Settings;
use crate::core::logging::LogFormat;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "reactive")]
#[command(about = "Demand-driven publish/subscribe demonstration")]
#[command(version)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Log file path
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Force coloured output
    #[arg(long = "color", conflicts_with = "no_color")]
    pub color: bool,

    /// Disable coloured output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Number of items to publish
    #[arg(short = 'n', long = "items", value_name = "COUNT")]
    pub items: Option<u64>,

    /// Number of subscribers
    #[arg(short = 's', long = "subscribers", value_name = "COUNT")]
    pub subscribers: Option<usize>,

    /// Demand signalled by each subscriber per batch
    #[arg(short = 'b', long = "batch", value_name = "COUNT")]
    pub batch: Option<u64>,

    /// Cap admission at the subscriber count and attempt one subscription too many
    #[arg(long = "reject")]
    pub reject: bool,
}

impl Args {
    /// Overlay command line values onto loaded settings
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(level) = &self.log_level {
            settings.logging.level = level.clone();
        }
        if let Some(format) = self.log_format {
            settings.logging.format = format;
        }
        if let Some(file) = &self.log_file {
            settings.logging.file = Some(file.clone());
        }
        if self.color {
            settings.logging.color = Some(true);
        } else if self.no_color {
            settings.logging.color = Some(false);
        }
        if let Some(items) = self.items {
            settings.demo.items = items;
        }
        if let Some(subscribers) = self.subscribers {
            settings.demo.subscribers = subscribers;
        }
        if let Some(batch) = self.batch {
            settings.demo.batch = batch;
        }
    }
}

/// Colour explicitly configured, otherwise only on a terminal
pub fn use_color(settings: &Settings) -> bool {
    settings
        .logging
        .color
        .unwrap_or_else(|| std::io::stdout().is_terminal())
}
