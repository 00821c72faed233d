//! Application module

pub mod cli;
pub mod demo;
pub mod startup;

#[cfg(test)]
mod tests;
