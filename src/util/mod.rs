//! Utility types shared by every subsystem.
//!
//! - [`Error`] / [`Result`] - fatal errors, [`AssignError`] for refused assignments
//! - Math re-exports from glam plus rotation/matrix conventions
//! - [`logging`] - tracing subscriber setup

mod error;
mod math;
pub mod logging;

pub use error::*;
pub use math::*;
