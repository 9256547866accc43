//! Reporting utilities for the CLI.

pub mod format;

pub use format::*;
