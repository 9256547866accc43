//! Data sources other than the bundled grid.

pub mod synth;

pub use synth::*;
