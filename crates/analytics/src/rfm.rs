//! RFM segmentation: recency/frequency/monetary per customer plus fixed
//! behavior-segment counts.
//!
//! Segment predicates are evaluated independently and are NOT mutually
//! exclusive: one customer can be both a Champion and At Risk, and the sum
//! of segment counts can exceed the customer count. Consumers must not
//! deduplicate.

use chrono::NaiveDate;
use pulse_core::calendar::days_between;
use pulse_core::config::RfmConfig;
use pulse_core::types::Customer;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One customer's RFM coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RfmPoint {
    pub customer_key: String,
    pub recency_days: i64,
    pub frequency: u64,
    pub monetary: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentLabel {
    Champions,
    Loyal,
    New,
    AtRisk,
    Lost,
}

impl SegmentLabel {
    pub const ALL: [SegmentLabel; 5] = [
        SegmentLabel::Champions,
        SegmentLabel::Loyal,
        SegmentLabel::New,
        SegmentLabel::AtRisk,
        SegmentLabel::Lost,
    ];
}

/// Independent count for one segment predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentCount {
    pub segment: SegmentLabel,
    pub customers: u64,
    /// Share of the whole base, in percent. Shares across segments can sum
    /// past 100 because membership overlaps.
    pub share_pct: f64,
    pub avg_monetary: f64,
}

/// Segmenter output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RfmReport {
    /// Every customer, sorted by key. Aggregate stats use this list.
    pub points: Vec<RfmPoint>,
    /// Scatter view with outliers removed (`monetary >= outlier_monetary`
    /// or `frequency >= outlier_frequency`).
    pub scatter: Vec<RfmPoint>,
    pub segments: Vec<SegmentCount>,
}

/// Compute RFM points and segment counts for the full customer set.
pub fn segment_customers(
    customers: &[Customer],
    as_of: NaiveDate,
    config: &RfmConfig,
) -> RfmReport {
    let points: Vec<RfmPoint> = customers
        .iter()
        .map(|c| RfmPoint {
            customer_key: c.customer_key.clone(),
            recency_days: days_between(c.last_order_date, as_of).max(0),
            frequency: c.total_orders,
            monetary: c.total_revenue,
        })
        .collect();

    let scatter = points
        .iter()
        .filter(|p| p.monetary < config.outlier_monetary && p.frequency < config.outlier_frequency)
        .cloned()
        .collect();

    let total = customers.len() as u64;
    let segments = SegmentLabel::ALL
        .iter()
        .map(|&segment| {
            let members: Vec<&RfmPoint> = points
                .iter()
                .zip(customers)
                .filter(|(point, customer)| matches_segment(segment, point, customer, as_of, config))
                .map(|(point, _)| point)
                .collect();
            let customers_in = members.len() as u64;
            let monetary_sum: f64 = members.iter().map(|p| p.monetary).sum();
            SegmentCount {
                segment,
                customers: customers_in,
                share_pct: if total > 0 {
                    customers_in as f64 / total as f64 * 100.0
                } else {
                    0.0
                },
                avg_monetary: if customers_in > 0 {
                    monetary_sum / customers_in as f64
                } else {
                    0.0
                },
            }
        })
        .collect();

    debug!(customers = points.len(), "RFM segmentation computed");
    RfmReport {
        points,
        scatter,
        segments,
    }
}

fn matches_segment(
    segment: SegmentLabel,
    point: &RfmPoint,
    customer: &Customer,
    as_of: NaiveDate,
    config: &RfmConfig,
) -> bool {
    match segment {
        SegmentLabel::Champions => {
            point.monetary > config.champion_monetary
                && point.frequency >= config.champion_frequency
        }
        SegmentLabel::Loyal => {
            point.frequency >= config.loyal_frequency
                && point.recency_days <= config.loyal_recency_days
        }
        SegmentLabel::New => {
            days_between(customer.first_order_date, as_of) <= config.new_customer_days
                && point.frequency == 1
        }
        SegmentLabel::AtRisk => {
            point.recency_days > config.at_risk_recency_days && point.frequency >= 1
        }
        SegmentLabel::Lost => point.recency_days > config.lost_recency_days,
    }
}
