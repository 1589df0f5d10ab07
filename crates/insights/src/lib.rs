//! Insight rule engine: a fixed, ordered table of threshold rules over the
//! analytics outputs, emitting ranked, typed insights.

pub mod engine;
pub mod rules;

pub use engine::{evaluate_insights, top, InsightInputs};
pub use rules::{Insight, InsightKind, Priority};
