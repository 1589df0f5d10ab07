//! Core entities exchanged between the pipeline stages.
//!
//! Raw feed rows are loosely typed on purpose; everything downstream of the
//! normalizer is strict. Derived entities never carry wall-clock timestamps
//! so that two runs over the same snapshot serialize identically.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of the external order feed, exactly as the sync layer hands it
/// over. Dates arrive as `DD/MM/YYYY` (optionally with a trailing time) or
/// `YYYY-MM-DD`; revenue as a locale-formatted decimal string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawOrderRecord {
    pub order_id: Option<String>,
    pub customer_tax_id: Option<String>,
    pub order_date: Option<String>,
    pub revenue: Option<String>,
    pub product_name: Option<String>,
    pub category: Option<String>,
    pub campaign: Option<String>,
    pub channel: Option<String>,
    pub status: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

/// A validated, canonical order. Immutable once produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Original order id; empty ids are normalized to `None`.
    pub order_id: Option<String>,
    /// Tax identifier when present, otherwise a deterministic per-row
    /// `anon:<index>` key that is never merged with other anonymous rows.
    pub customer_key: String,
    pub order_date: NaiveDate,
    pub revenue: f64,
    pub product_name: String,
    pub category: String,
    pub campaign: String,
    pub channel: String,
    /// Free-text status; filtering policy is owned by the caller.
    pub status: String,
    /// Shipping city and state, possibly empty.
    pub city: String,
    pub state: String,
}

/// Aggregated advertising spend per campaign over the active date range.
/// Owned by the external spend feed, read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignSpend {
    pub campaign: String,
    pub spend: f64,
    pub conversions: f64,
}

/// Customer lifecycle entity, one per distinct `customer_key`.
///
/// `first_order_date <= last_order_date` always holds, and `cohort_month`
/// equals the calendar month of the minimum order date regardless of the
/// order in which rows were aggregated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_key: String,
    pub first_order_date: NaiveDate,
    pub last_order_date: NaiveDate,
    /// `YYYY-MM` of the first order.
    pub cohort_month: String,
    pub total_revenue: f64,
    /// Distinct non-empty order ids, falling back to row count when the
    /// feed carries no ids at all.
    pub total_orders: u64,
    pub avg_ticket: f64,
    /// Latest known shipping location: the city/state of the most recent
    /// order carrying one, empty when no order does.
    pub city: String,
    pub state: String,
    /// Owned orders, fully row-sorted (date and id first).
    pub orders: Vec<Order>,
}

/// One point of the daily revenue series derived from normalized orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRevenuePoint {
    pub date: NaiveDate,
    pub revenue: f64,
    pub orders: u64,
}

impl Order {
    /// Total row order used everywhere an order list must be deterministic.
    /// Date and id lead; the remaining fields break ties between line items
    /// that share one order id.
    pub fn cmp_row(&self, other: &Order) -> std::cmp::Ordering {
        self.order_date
            .cmp(&other.order_date)
            .then_with(|| self.order_id.cmp(&other.order_id))
            .then_with(|| self.product_name.cmp(&other.product_name))
            .then_with(|| self.revenue.total_cmp(&other.revenue))
            .then_with(|| self.category.cmp(&other.category))
            .then_with(|| self.campaign.cmp(&other.campaign))
            .then_with(|| self.channel.cmp(&other.channel))
            .then_with(|| self.status.cmp(&other.status))
            .then_with(|| self.city.cmp(&other.city))
            .then_with(|| self.state.cmp(&other.state))
    }
}
