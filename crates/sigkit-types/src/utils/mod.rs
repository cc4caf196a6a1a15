//! Utility functions shared across the workspace.

pub mod formatting;
pub mod helpers;

pub use formatting::short_address;
pub use helpers::current_timestamp;
