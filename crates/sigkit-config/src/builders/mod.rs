//! Builders for constructing configurations in code.

mod config;

pub use config::ConfigBuilder;
