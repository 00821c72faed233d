pub mod app;
pub mod config;
pub mod context;
pub mod core;
pub mod producer;
pub mod subscriber;
pub mod subscription;

#[cfg(test)]
pub(crate) mod testing;

include!(concat!(env!("OUT_DIR"), "/version.rs"));
