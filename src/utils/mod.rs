//! Utility functions and helpers.

pub mod log;
pub mod time;
