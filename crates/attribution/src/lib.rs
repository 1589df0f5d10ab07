//! Revenue/spend attribution: joins order revenue with the campaign spend
//! ledger and allocates spend proportionally to compute ROAS per product,
//! category or channel.

pub mod allocator;

pub use allocator::{allocate, AllocationReport, AttributionAllocation, EntityDimension};
