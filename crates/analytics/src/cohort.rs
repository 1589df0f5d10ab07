//! Cohort engine: month-indexed retention over the full customer
//! population.
//!
//! Cohort assignment uses calendar-month truncation of the first order,
//! while "age" counts 30-day buckets. Retention is observed activity, not a
//! survival curve: a customer may be active at age 3 without appearing at
//! age 2, and such rows are kept as-is.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Days, NaiveDate};
use pulse_core::calendar::{age_in_months, DAYS_PER_AGE_BUCKET};
use pulse_core::config::CohortConfig;
use pulse_core::types::Customer;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Distinct customers of one cohort seen active at one age bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortBucket {
    pub cohort_month: String,
    pub age_months: u32,
    pub active_customers: u64,
}

/// One display row of the retention matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortRow {
    pub cohort_month: String,
    pub cohort_size: u64,
    /// Retention percent per age bucket; `None` where the bucket lies
    /// beyond the as-of date and cannot have data yet.
    pub retention_pct: Vec<Option<f64>>,
}

/// Full cohort computation over an arbitrary range. Display trimming
/// happens in [`CohortReport::window`], never during computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CohortReport {
    /// Sorted by `(cohort_month, age_months)`.
    pub buckets: Vec<CohortBucket>,
}

impl CohortReport {
    /// Build retention buckets from the complete customer set. Requires the
    /// aggregation barrier: partial populations produce wrong denominators.
    pub fn build(customers: &[Customer]) -> Self {
        let mut active: BTreeMap<(String, u32), BTreeSet<&str>> = BTreeMap::new();

        for customer in customers {
            for order in &customer.orders {
                let age = age_in_months(customer.first_order_date, order.order_date);
                active
                    .entry((customer.cohort_month.clone(), age))
                    .or_default()
                    .insert(customer.customer_key.as_str());
            }
        }

        let buckets = active
            .into_iter()
            .map(|((cohort_month, age_months), keys)| CohortBucket {
                cohort_month,
                age_months,
                active_customers: keys.len() as u64,
            })
            .collect::<Vec<_>>();

        debug!(buckets = buckets.len(), "Cohort retention computed");
        Self { buckets }
    }

    /// Customers active at age 0, i.e. the cohort's size. Every customer has
    /// an order at age 0 by construction.
    pub fn cohort_size(&self, cohort_month: &str) -> u64 {
        self.active_at(cohort_month, 0)
    }

    pub fn active_at(&self, cohort_month: &str, age_months: u32) -> u64 {
        self.buckets
            .iter()
            .find(|b| b.cohort_month == cohort_month && b.age_months == age_months)
            .map(|b| b.active_customers)
            .unwrap_or(0)
    }

    /// Retention percent for `(cohort, age)`, 0 when the cohort is empty.
    pub fn retention_pct(&self, cohort_month: &str, age_months: u32) -> f64 {
        let base = self.cohort_size(cohort_month);
        if base == 0 {
            return 0.0;
        }
        self.active_at(cohort_month, age_months) as f64 / base as f64 * 100.0
    }

    /// All cohort months present, ascending.
    pub fn cohort_months(&self) -> Vec<String> {
        let months: BTreeSet<&str> = self
            .buckets
            .iter()
            .map(|b| b.cohort_month.as_str())
            .collect();
        months.into_iter().map(str::to_string).collect()
    }

    /// Display window: the most recent `display_months` cohorts by ages
    /// `0..=max_age_months`. Cells whose age bucket starts after `as_of`
    /// are `None` rather than 0.
    pub fn window(&self, config: &CohortConfig, as_of: NaiveDate) -> Vec<CohortRow> {
        let months = self.cohort_months();
        let start = months.len().saturating_sub(config.display_months);

        months[start..]
            .iter()
            .map(|month| {
                let cohort_size = self.cohort_size(month);
                let retention_pct = (0..=config.max_age_months)
                    .map(|age| {
                        if age_bucket_reachable(month, age, as_of) {
                            Some(self.retention_pct(month, age))
                        } else {
                            None
                        }
                    })
                    .collect();
                CohortRow {
                    cohort_month: month.clone(),
                    cohort_size,
                    retention_pct,
                }
            })
            .collect()
    }
}

/// Whether the given age bucket of a cohort has started by `as_of`.
fn age_bucket_reachable(cohort_month: &str, age_months: u32, as_of: NaiveDate) -> bool {
    let Some(first_day) = parse_month_key(cohort_month) else {
        return true;
    };
    match first_day.checked_add_days(Days::new(age_months as u64 * DAYS_PER_AGE_BUCKET as u64)) {
        Some(bucket_start) => bucket_start <= as_of,
        None => false,
    }
}

fn parse_month_key(key: &str) -> Option<NaiveDate> {
    let (year, month) = key.split_once('-')?;
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
}
