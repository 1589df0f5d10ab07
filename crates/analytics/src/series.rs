//! Daily revenue series over normalized orders.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use pulse_core::types::{DailyRevenuePoint, Order};

/// Sum revenue and order rows per calendar day, ascending by date. Days with
/// no orders are absent, never zero-filled.
pub fn daily_revenue(orders: &[Order]) -> Vec<DailyRevenuePoint> {
    let mut days: BTreeMap<NaiveDate, (f64, u64)> = BTreeMap::new();
    for order in orders {
        let entry = days.entry(order.order_date).or_insert((0.0, 0));
        entry.0 += order.revenue;
        entry.1 += 1;
    }

    days.into_iter()
        .map(|(date, (revenue, orders))| DailyRevenuePoint {
            date,
            revenue,
            orders,
        })
        .collect()
}
