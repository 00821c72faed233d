//! Core infrastructure shared by every component

pub mod error_handling;
pub mod logging;
pub mod retry;
pub mod sync;
