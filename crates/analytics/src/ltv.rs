//! LTV evolution: average cumulative revenue by customer age.
//!
//! Each age bucket averages only customers old enough to have reached it,
//! so the qualifying population shrinks with age. The per-customer curve is
//! non-decreasing; the population average may still dip between buckets
//! because the cohort changes. That is expected, not a defect.

use chrono::NaiveDate;
use pulse_core::calendar::age_in_months;
use pulse_core::config::LtvConfig;
use pulse_core::types::Customer;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One point of the LTV evolution curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LtvPoint {
    pub age_months: u32,
    pub avg_ltv: f64,
    /// Customers old enough to qualify for this bucket.
    pub customers: u64,
}

/// Compute the LTV curve for ages `0..=horizon_months`.
///
/// Buckets with no qualifying customers or a zero average are omitted from
/// the series rather than emitted as zero points.
pub fn ltv_curve(customers: &[Customer], as_of: NaiveDate, config: &LtvConfig) -> Vec<LtvPoint> {
    let mut curve = Vec::new();

    for age in 0..=config.horizon_months {
        let mut qualifying = 0u64;
        let mut cumulative = 0.0;

        for customer in customers {
            if age_in_months(customer.first_order_date, as_of) < age {
                continue;
            }
            qualifying += 1;
            cumulative += customer
                .orders
                .iter()
                .filter(|o| age_in_months(customer.first_order_date, o.order_date) <= age)
                .map(|o| o.revenue)
                .sum::<f64>();
        }

        if qualifying == 0 {
            continue;
        }
        let avg_ltv = cumulative / qualifying as f64;
        if avg_ltv == 0.0 {
            continue;
        }
        curve.push(LtvPoint {
            age_months: age,
            avg_ltv,
            customers: qualifying,
        });
    }

    debug!(points = curve.len(), "LTV evolution computed");
    curve
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::types::Order;

    fn customer(key: &str, orders: Vec<(i32, u32, u32, f64)>) -> Customer {
        let orders: Vec<Order> = orders
            .into_iter()
            .map(|(y, m, d, revenue)| Order {
                order_id: None,
                customer_key: key.to_string(),
                order_date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
                revenue,
                product_name: String::new(),
                category: "uncategorized".to_string(),
                campaign: String::new(),
                channel: "unidentified".to_string(),
                status: String::new(),
                city: String::new(),
                state: String::new(),
            })
            .collect();
        let first = orders.iter().map(|o| o.order_date).min().unwrap();
        let last = orders.iter().map(|o| o.order_date).max().unwrap();
        let total: f64 = orders.iter().map(|o| o.revenue).sum();
        Customer {
            customer_key: key.to_string(),
            first_order_date: first,
            last_order_date: last,
            cohort_month: pulse_core::calendar::month_key(first),
            total_revenue: total,
            total_orders: orders.len() as u64,
            avg_ticket: total / orders.len() as f64,
            city: String::new(),
            state: String::new(),
            orders,
        }
    }

    #[test]
    fn test_curve_accumulates_revenue_by_age() {
        // A: 100 at age 0, +50 at age 1. B: 200 at age 0, nothing later.
        let customers = vec![
            customer("A", vec![(2025, 1, 5, 100.0), (2025, 2, 10, 50.0)]),
            customer("B", vec![(2025, 1, 20, 200.0)]),
        ];
        let as_of = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let curve = ltv_curve(&customers, as_of, &LtvConfig::default());

        let age0 = curve.iter().find(|p| p.age_months == 0).unwrap();
        assert_eq!(age0.customers, 2);
        assert_eq!(age0.avg_ltv, 150.0); // (100 + 200) / 2

        let age1 = curve.iter().find(|p| p.age_months == 1).unwrap();
        assert_eq!(age1.customers, 2);
        assert_eq!(age1.avg_ltv, 175.0); // (150 + 200) / 2
    }

    #[test]
    fn test_young_customers_drop_out_instead_of_zero_fill() {
        // B is only ~20 days old at as_of and must not qualify past age 0.
        let customers = vec![
            customer("A", vec![(2025, 1, 1, 100.0)]),
            customer("B", vec![(2025, 3, 10, 40.0)]),
        ];
        let as_of = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        let curve = ltv_curve(&customers, as_of, &LtvConfig::default());

        let age0 = curve.iter().find(|p| p.age_months == 0).unwrap();
        assert_eq!(age0.customers, 2);
        let age1 = curve.iter().find(|p| p.age_months == 1).unwrap();
        assert_eq!(age1.customers, 1);
        assert_eq!(age1.avg_ltv, 100.0);
    }

    #[test]
    fn test_zero_average_points_are_omitted() {
        let customers = vec![customer("A", vec![(2025, 1, 5, 0.0)])];
        let as_of = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert!(ltv_curve(&customers, as_of, &LtvConfig::default()).is_empty());
    }

    #[test]
    fn test_empty_population() {
        let as_of = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert!(ltv_curve(&[], as_of, &LtvConfig::default()).is_empty());
    }
}
