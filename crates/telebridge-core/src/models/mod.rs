//! Shared data models for the bridge

mod diagnostic;
mod vehicle;

pub use diagnostic::*;
pub use vehicle::*;
