//! Customer lifecycle analytics: feed normalization, customer aggregation,
//! cohort retention, LTV evolution and RFM segmentation.
//!
//! Every pass is a pure function over immutable snapshots; nothing here
//! holds state between runs.

pub mod cohort;
pub mod customer;
pub mod geo;
pub mod ltv;
pub mod normalizer;
pub mod rfm;
pub mod series;

pub use cohort::{CohortReport, CohortRow};
pub use customer::aggregate_customers;
pub use geo::{revenue_by_location, GeoDimension, GeoRevenue};
pub use ltv::{ltv_curve, LtvPoint};
pub use normalizer::{normalize_orders, OrderFeed};
pub use rfm::{RfmPoint, RfmReport, SegmentCount, SegmentLabel};
pub use series::daily_revenue;
