//! The assembled dashboard snapshot plus small display rollups.
//!
//! A snapshot is a pure function of `(feed rows, spend ledger, as_of,
//! config)`. It carries no wall-clock timestamps, so serializing two runs
//! over the same inputs yields byte-identical JSON.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use pulse_analytics::cohort::{CohortReport, CohortRow};
use pulse_analytics::geo::GeoRevenue;
use pulse_analytics::ltv::LtvPoint;
use pulse_analytics::rfm::RfmReport;
use pulse_attribution::AllocationReport;
use pulse_core::types::{Customer, DailyRevenuePoint, Order};
use pulse_insights::Insight;
use serde::{Deserialize, Serialize};

/// Rows kept in the top-customer and top-product rollups.
pub const TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopCustomer {
    pub customer_key: String,
    pub total_revenue: f64,
    pub total_orders: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopProduct {
    pub product_name: String,
    pub revenue: f64,
    pub orders: u64,
}

/// Everything one dashboard render needs, computed in a single pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub as_of: NaiveDate,
    pub customers: Vec<Customer>,
    /// Full retention buckets over the whole history.
    pub cohort: CohortReport,
    /// Display window of the retention matrix.
    pub cohort_window: Vec<CohortRow>,
    pub ltv_curve: Vec<LtvPoint>,
    pub rfm: RfmReport,
    pub by_product: AllocationReport,
    pub by_category: AllocationReport,
    pub by_channel: AllocationReport,
    pub daily_revenue: Vec<DailyRevenuePoint>,
    pub revenue_by_state: Vec<GeoRevenue>,
    pub revenue_by_city: Vec<GeoRevenue>,
    pub top_customers: Vec<TopCustomer>,
    pub top_products: Vec<TopProduct>,
    pub insights: Vec<Insight>,
    /// Feed rows dropped by the normalizer.
    pub malformed_records: u64,
    /// Ledger spend on campaigns with no attributed revenue. Identical
    /// across the three allocation reports; surfaced once for the header.
    pub orphan_spend: f64,
}

/// Highest-revenue customers, key as tie-break.
pub fn top_customers(customers: &[Customer], limit: usize) -> Vec<TopCustomer> {
    let mut rows: Vec<TopCustomer> = customers
        .iter()
        .map(|c| TopCustomer {
            customer_key: c.customer_key.clone(),
            total_revenue: c.total_revenue,
            total_orders: c.total_orders,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.total_revenue
            .partial_cmp(&a.total_revenue)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.customer_key.cmp(&b.customer_key))
    });
    rows.truncate(limit);
    rows
}

/// Highest-revenue products, name as tie-break. Orders with no product name
/// are skipped.
pub fn top_products(orders: &[Order], limit: usize) -> Vec<TopProduct> {
    let mut by_product: BTreeMap<&str, (f64, u64)> = BTreeMap::new();
    for order in orders {
        let name = order.product_name.trim();
        if name.is_empty() {
            continue;
        }
        let entry = by_product.entry(name).or_insert((0.0, 0));
        entry.0 += order.revenue;
        entry.1 += 1;
    }

    let mut rows: Vec<TopProduct> = by_product
        .into_iter()
        .map(|(name, (revenue, orders))| TopProduct {
            product_name: name.to_string(),
            revenue,
            orders,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.revenue
            .partial_cmp(&a.revenue)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    rows.truncate(limit);
    rows
}
