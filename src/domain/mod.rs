//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - model configuration (`UncertaintyConfig`, `InterpMethod`)
//! - the on-disk grid description (`GridHeader`, `SampleCube`)
//! - derived/exported values (`SmoothingWidths`, `GridFile`)

pub mod types;

pub use types::*;
