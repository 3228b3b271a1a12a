//! # Utilities Module
//!
//! Vector math shared by the behavior loop.

pub mod math;

pub use math::*;
