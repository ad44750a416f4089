//! Shared geometry, color and error types.

pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod math;
