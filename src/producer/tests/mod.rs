//! Test modules for producers
//!
//! Organized by functional area: the delivery engine, each reference
//! producer, the subscribe entry points and concurrent use.

mod entry_points;
