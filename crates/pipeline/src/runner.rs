//! The recompute pass.
//!
//! Stages run strictly in order: normalize, filter, aggregate, then the
//! derived analyses over the frozen customer set. The aggregation barrier
//! matters: cohort sizes, LTV averages and RFM shares all divide by
//! population counts, so no derived stage may observe a partial population.

use chrono::NaiveDate;
use pulse_analytics::cohort::CohortReport;
use pulse_analytics::geo::{revenue_by_location, GeoDimension};
use pulse_analytics::{aggregate_customers, daily_revenue, ltv_curve, normalize_orders};
use pulse_analytics::normalizer::completed_status;
use pulse_analytics::rfm::segment_customers;
use pulse_attribution::{allocate, EntityDimension};
use pulse_core::config::EngineConfig;
use pulse_core::error::{PulseError, PulseResult};
use pulse_core::types::{CampaignSpend, Order, RawOrderRecord};
use pulse_insights::{evaluate_insights, InsightInputs};
use tracing::info;

use crate::cancel::CancellationToken;
use crate::snapshot::{top_customers, top_products, DashboardSnapshot, TOP_N};

/// One run's borrowed inputs. `as_of` anchors every recency and age
/// computation; passing it in keeps the run free of wall-clock reads.
#[derive(Debug, Clone, Copy)]
pub struct PipelineInput<'a> {
    pub orders: &'a [RawOrderRecord],
    pub spends: &'a [CampaignSpend],
    pub as_of: NaiveDate,
}

/// Stateless pipeline: configuration in, snapshot out.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: EngineConfig,
}

impl Pipeline {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Run the full pass with the default completed-order status filter.
    pub fn run(
        &self,
        input: PipelineInput<'_>,
        cancel: &CancellationToken,
    ) -> PulseResult<DashboardSnapshot> {
        self.run_with_status(input, completed_status, cancel)
    }

    /// Run the full pass with a caller-supplied status filter over
    /// normalized orders.
    pub fn run_with_status<F>(
        &self,
        input: PipelineInput<'_>,
        keep_status: F,
        cancel: &CancellationToken,
    ) -> PulseResult<DashboardSnapshot>
    where
        F: Fn(&str) -> bool,
    {
        checkpoint(cancel)?;
        let feed = normalize_orders(input.orders);
        let total_rows = feed.orders.len();

        let orders: Vec<Order> = feed
            .orders
            .into_iter()
            .filter(|o| keep_status(&o.status))
            .collect();
        info!(
            kept = orders.len(),
            filtered = total_rows - orders.len(),
            dropped = feed.malformed_records,
            "Feed normalized and filtered"
        );

        checkpoint(cancel)?;
        let customers = aggregate_customers(&orders);

        checkpoint(cancel)?;
        let cohort = CohortReport::build(&customers);
        let cohort_window = cohort.window(&self.config.cohort, input.as_of);
        let ltv = ltv_curve(&customers, input.as_of, &self.config.ltv);
        let rfm = segment_customers(&customers, input.as_of, &self.config.rfm);

        checkpoint(cancel)?;
        let by_product = allocate(&orders, input.spends, EntityDimension::Product);
        let by_category = allocate(&orders, input.spends, EntityDimension::Category);
        let by_channel = allocate(&orders, input.spends, EntityDimension::Channel);

        checkpoint(cancel)?;
        let daily = daily_revenue(&orders);
        let insights = evaluate_insights(
            InsightInputs {
                orders: &orders,
                rfm: &rfm,
                by_product: Some(&by_product),
                daily_revenue: &daily,
                spend: Some(input.spends),
            },
            &self.config.insight,
        );

        let snapshot = DashboardSnapshot {
            as_of: input.as_of,
            top_customers: top_customers(&customers, TOP_N),
            top_products: top_products(&orders, TOP_N),
            orphan_spend: by_product.orphan_spend,
            customers,
            cohort,
            cohort_window,
            ltv_curve: ltv,
            rfm,
            by_product,
            by_category,
            by_channel,
            daily_revenue: daily,
            revenue_by_state: revenue_by_location(&orders, GeoDimension::State),
            revenue_by_city: revenue_by_location(&orders, GeoDimension::City),
            insights,
            malformed_records: feed.malformed_records,
        };
        info!(
            customers = snapshot.customers.len(),
            insights = snapshot.insights.len(),
            as_of = %snapshot.as_of,
            "Snapshot recomputed"
        );
        Ok(snapshot)
    }
}

fn checkpoint(cancel: &CancellationToken) -> PulseResult<()> {
    if cancel.is_cancelled() {
        return Err(PulseError::Cancelled);
    }
    Ok(())
}
