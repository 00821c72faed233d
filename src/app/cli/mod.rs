//! Command line interface

mod args;

pub use args::{use_color, Args};
