//! Shared value objects, error taxonomy and configuration for the
//! CommercePulse analytics engine.
//!
//! Everything exchanged between pipeline stages lives here as plain,
//! serializable data with no behavior attached.

pub mod calendar;
pub mod config;
pub mod error;
pub mod types;

pub use error::{PulseError, PulseResult};
