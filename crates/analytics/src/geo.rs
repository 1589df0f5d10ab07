//! Revenue rollups by shipping location.

use std::collections::BTreeMap;

use pulse_core::types::Order;
use serde::{Deserialize, Serialize};

/// Which location field the rollup groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoDimension {
    City,
    State,
}

impl GeoDimension {
    fn key<'a>(&self, order: &'a Order) -> &'a str {
        match self {
            GeoDimension::City => &order.city,
            GeoDimension::State => &order.state,
        }
    }
}

/// Revenue and order count for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoRevenue {
    pub location: String,
    pub revenue: f64,
    pub orders: u64,
}

/// Group revenue by city or state, descending by revenue with the location
/// as tie-break. Orders without a location land under `"unknown"`.
pub fn revenue_by_location(orders: &[Order], dimension: GeoDimension) -> Vec<GeoRevenue> {
    let mut locations: BTreeMap<&str, (f64, u64)> = BTreeMap::new();
    for order in orders {
        let key = match dimension.key(order) {
            "" => "unknown",
            key => key,
        };
        let entry = locations.entry(key).or_insert((0.0, 0));
        entry.0 += order.revenue;
        entry.1 += 1;
    }

    let mut rows: Vec<GeoRevenue> = locations
        .into_iter()
        .map(|(location, (revenue, orders))| GeoRevenue {
            location: location.to_string(),
            revenue,
            orders,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.revenue
            .partial_cmp(&a.revenue)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.location.cmp(&b.location))
    });
    rows
}
