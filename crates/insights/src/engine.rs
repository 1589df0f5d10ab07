//! Rule evaluation.
//!
//! Rules run in a fixed table order over already-computed analytics outputs.
//! A rule whose inputs are missing (no spend ledger, too little history) is
//! suppressed, never an error. The final list is stable-sorted by priority so
//! equal-priority insights keep table order.

use pulse_analytics::rfm::{RfmReport, SegmentLabel};
use pulse_attribution::AllocationReport;
use pulse_core::config::InsightConfig;
use pulse_core::types::{CampaignSpend, DailyRevenuePoint, Order};
use std::collections::BTreeMap;
use tracing::debug;

use crate::rules::{Insight, InsightKind, Priority};

/// Borrowed view over the analytics outputs one evaluation needs.
#[derive(Debug, Clone, Copy)]
pub struct InsightInputs<'a> {
    pub orders: &'a [Order],
    pub rfm: &'a RfmReport,
    pub by_product: Option<&'a AllocationReport>,
    pub daily_revenue: &'a [DailyRevenuePoint],
    pub spend: Option<&'a [CampaignSpend]>,
}

/// Run the full rule table and return insights sorted by priority.
pub fn evaluate_insights(inputs: InsightInputs<'_>, config: &InsightConfig) -> Vec<Insight> {
    let mut insights = Vec::new();

    if let Some(insight) = overall_roas_rule(&inputs, config) {
        insights.push(insight);
    }
    if let Some(insight) = weekly_trend_rule(inputs.daily_revenue, config) {
        insights.push(insight);
    }
    if let Some(insight) = product_concentration_rule(&inputs, config) {
        insights.push(insight);
    }
    if let Some(insight) = underexploited_categories_rule(inputs.orders) {
        insights.push(insight);
    }
    if let Some(insight) = at_risk_share_rule(inputs.rfm, config) {
        insights.push(insight);
    }
    if let Some(insight) = orphan_spend_rule(&inputs, config) {
        insights.push(insight);
    }

    insights.sort_by_key(|i| i.priority);
    debug!(count = insights.len(), "Insight rules evaluated");
    insights
}

/// Display truncation: the first `limit` insights by priority.
pub fn top(insights: &[Insight], limit: usize) -> &[Insight] {
    &insights[..insights.len().min(limit)]
}

/// Blended ROAS across the whole spend ledger: below the warning threshold
/// the blend loses money after margin, at or above the scale threshold it is
/// headroom for more budget. Suppressed without spend, or with zero spend.
fn overall_roas_rule(inputs: &InsightInputs<'_>, config: &InsightConfig) -> Option<Insight> {
    let spend = inputs.spend?;
    let total_spend: f64 = spend.iter().map(|s| s.spend).sum();
    if total_spend <= 0.0 {
        return None;
    }
    let total_revenue: f64 = inputs.orders.iter().map(|o| o.revenue).sum();
    let roas = total_revenue / total_spend;

    if roas < config.roas_warning_threshold {
        Some(Insight {
            kind: InsightKind::Warning,
            priority: Priority::High,
            title: "Blended ROAS below break-even band".to_string(),
            description: format!(
                "Every ad unit returns {roas:.2} in revenue, under the {:.1}x floor. \
                 Review campaign targeting and pause the worst performers.",
                config.roas_warning_threshold
            ),
            metric: Some(format!("ROAS {roas:.2}")),
            impact: Some(format!("{total_spend:.2} at risk")),
        })
    } else if roas >= config.roas_scale_threshold {
        Some(Insight {
            kind: InsightKind::Opportunity,
            priority: Priority::High,
            title: "Ad spend has headroom to scale".to_string(),
            description: format!(
                "Blended ROAS of {roas:.2} clears the {:.1}x scale threshold. \
                 Current budgets are likely under-invested.",
                config.roas_scale_threshold
            ),
            metric: Some(format!("ROAS {roas:.2}")),
            impact: None,
        })
    } else {
        None
    }
}

/// Trailing week versus the week before it. Needs at least 14 daily points;
/// fires only past the configured change bound.
fn weekly_trend_rule(daily: &[DailyRevenuePoint], config: &InsightConfig) -> Option<Insight> {
    if daily.len() < 14 {
        return None;
    }
    let recent: f64 = daily[daily.len() - 7..].iter().map(|p| p.revenue).sum();
    let prior: f64 = daily[daily.len() - 14..daily.len() - 7]
        .iter()
        .map(|p| p.revenue)
        .sum();
    if prior <= 0.0 {
        return None;
    }
    let change_pct = (recent - prior) / prior * 100.0;
    if change_pct.abs() < config.trend_change_pct {
        return None;
    }

    let priority = if change_pct.abs() >= config.trend_high_pct {
        Priority::High
    } else {
        Priority::Medium
    };
    if change_pct > 0.0 {
        Some(Insight {
            kind: InsightKind::Trend,
            priority,
            title: "Revenue accelerating week over week".to_string(),
            description: format!(
                "Trailing 7-day revenue is up {change_pct:.1}% against the prior week."
            ),
            metric: Some(format!("{change_pct:+.1}%")),
            impact: None,
        })
    } else {
        Some(Insight {
            kind: InsightKind::Warning,
            priority,
            title: "Revenue slowing week over week".to_string(),
            description: format!(
                "Trailing 7-day revenue is down {:.1}% against the prior week.",
                change_pct.abs()
            ),
            metric: Some(format!("{change_pct:+.1}%")),
            impact: None,
        })
    }
}

/// Catalogue concentration: when the top fraction of products carries more
/// than the configured share of attributed revenue, the business is exposed
/// to a handful of SKUs.
fn product_concentration_rule(
    inputs: &InsightInputs<'_>,
    config: &InsightConfig,
) -> Option<Insight> {
    let report = inputs.by_product?;
    if report.allocations.len() < 2 {
        return None;
    }
    let total: f64 = report
        .allocations
        .iter()
        .map(|a| a.allocated_revenue)
        .sum();
    if total <= 0.0 {
        return None;
    }
    let top_n = ((report.allocations.len() as f64 * config.top_product_fraction).ceil() as usize)
        .max(1);
    // Allocations arrive sorted by revenue descending.
    let top_revenue: f64 = report
        .allocations
        .iter()
        .take(top_n)
        .map(|a| a.allocated_revenue)
        .sum();
    let share_pct = top_revenue / total * 100.0;
    if share_pct <= config.concentration_share_pct {
        return None;
    }

    Some(Insight {
        kind: InsightKind::Warning,
        priority: Priority::Medium,
        title: "Revenue concentrated in few products".to_string(),
        description: format!(
            "The top {top_n} products carry {share_pct:.1}% of revenue. \
             A supply or demand shock on any of them hits the whole business."
        ),
        metric: Some(format!("{share_pct:.1}% in top {top_n}")),
        impact: None,
    })
}

/// Categories with an above-average ticket but a below-average slice of
/// revenue convert well when they sell; they are promotion candidates.
fn underexploited_categories_rule(orders: &[Order]) -> Option<Insight> {
    let total_revenue: f64 = orders.iter().map(|o| o.revenue).sum();
    if orders.is_empty() || total_revenue <= 0.0 {
        return None;
    }
    let overall_ticket = total_revenue / orders.len() as f64;

    let mut by_category: BTreeMap<&str, (f64, u64)> = BTreeMap::new();
    for order in orders {
        let entry = by_category.entry(order.category.as_str()).or_insert((0.0, 0));
        entry.0 += order.revenue;
        entry.1 += 1;
    }
    if by_category.len() < 2 {
        return None;
    }
    let mean_category_revenue = total_revenue / by_category.len() as f64;

    let candidates: Vec<&str> = by_category
        .iter()
        .filter(|(_, (revenue, count))| {
            *count > 0
                && revenue / *count as f64 > overall_ticket
                && *revenue < mean_category_revenue * 0.5
        })
        .map(|(category, _)| *category)
        .take(3)
        .collect();
    if candidates.is_empty() {
        return None;
    }

    Some(Insight {
        kind: InsightKind::Recommendation,
        priority: Priority::Medium,
        title: "High-ticket categories underexploited".to_string(),
        description: format!(
            "{} sell above the average ticket but bring in well under the \
             average category revenue. Worth a dedicated push.",
            candidates.join(", ")
        ),
        metric: Some(format!("{} categories", candidates.len())),
        impact: None,
    })
}

/// Fires when the At Risk segment crosses the configured share of the base.
fn at_risk_share_rule(rfm: &RfmReport, config: &InsightConfig) -> Option<Insight> {
    let at_risk = rfm
        .segments
        .iter()
        .find(|s| s.segment == SegmentLabel::AtRisk)?;
    if at_risk.customers == 0 || at_risk.share_pct < config.at_risk_share_pct {
        return None;
    }

    Some(Insight {
        kind: InsightKind::Warning,
        priority: Priority::Medium,
        title: "Large share of customers going quiet".to_string(),
        description: format!(
            "{} customers ({:.1}% of the base) have not ordered recently. \
             A win-back campaign is cheaper than replacing them.",
            at_risk.customers, at_risk.share_pct
        ),
        metric: Some(format!("{:.1}% at risk", at_risk.share_pct)),
        impact: Some(format!(
            "{:.2} avg customer value",
            at_risk.avg_monetary
        )),
    })
}

/// Spend recorded against campaigns that never attributed revenue. A small
/// residue is normal (naming drift between feeds); past the threshold it is
/// budget leaking through the join.
fn orphan_spend_rule(inputs: &InsightInputs<'_>, config: &InsightConfig) -> Option<Insight> {
    let report = inputs.by_product?;
    if report.total_spend <= 0.0 {
        return None;
    }
    let share_pct = report.orphan_spend / report.total_spend * 100.0;
    if share_pct <= config.orphan_spend_share_pct {
        return None;
    }

    Some(Insight {
        kind: InsightKind::Warning,
        priority: Priority::Medium,
        title: "Ad spend unmatched to any sale".to_string(),
        description: format!(
            "{:.2} of spend ({share_pct:.1}%) sits on campaigns with no \
             attributed revenue. Check campaign naming between the ad and \
             order feeds.",
            report.orphan_spend
        ),
        metric: Some(format!("{share_pct:.1}% orphaned")),
        impact: Some(format!("{:.2} unattributed", report.orphan_spend)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pulse_analytics::rfm::segment_customers;
    use pulse_attribution::{allocate, EntityDimension};
    use pulse_core::config::RfmConfig;
    use pulse_core::types::Customer;

    fn order(product: &str, category: &str, campaign: &str, revenue: f64) -> Order {
        Order {
            order_id: Some("1".to_string()),
            customer_key: "A".to_string(),
            order_date: NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
            revenue,
            product_name: product.to_string(),
            category: category.to_string(),
            campaign: campaign.to_string(),
            channel: "google_ads".to_string(),
            status: "complete".to_string(),
            city: "Campinas".to_string(),
            state: "SP".to_string(),
        }
    }

    fn spend(campaign: &str, amount: f64) -> CampaignSpend {
        CampaignSpend {
            campaign: campaign.to_string(),
            spend: amount,
            conversions: 0.0,
        }
    }

    fn daily_series(values: &[f64]) -> Vec<DailyRevenuePoint> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &revenue)| DailyRevenuePoint {
                date: start + chrono::Days::new(i as u64),
                revenue,
                orders: 1,
            })
            .collect()
    }

    fn empty_inputs<'a>(
        orders: &'a [Order],
        rfm: &'a RfmReport,
        daily: &'a [DailyRevenuePoint],
    ) -> InsightInputs<'a> {
        InsightInputs {
            orders,
            rfm,
            by_product: None,
            daily_revenue: daily,
            spend: None,
        }
    }

    #[test]
    fn test_low_roas_fires_warning() {
        let orders = [order("W", "Cat", "C1", 100.0)];
        let spends = [spend("C1", 80.0)];
        let rfm = RfmReport::default();
        let mut inputs = empty_inputs(&orders, &rfm, &[]);
        inputs.spend = Some(&spends);

        let insights = evaluate_insights(inputs, &InsightConfig::default());
        let roas = insights
            .iter()
            .find(|i| i.title.contains("ROAS"))
            .expect("roas rule should fire");
        assert_eq!(roas.kind, InsightKind::Warning);
        assert_eq!(roas.priority, Priority::High);
        assert_eq!(roas.metric.as_deref(), Some("ROAS 1.25"));
    }

    #[test]
    fn test_high_roas_fires_opportunity() {
        let orders = [order("W", "Cat", "C1", 500.0)];
        let spends = [spend("C1", 100.0)];
        let rfm = RfmReport::default();
        let mut inputs = empty_inputs(&orders, &rfm, &[]);
        inputs.spend = Some(&spends);

        let insights = evaluate_insights(inputs, &InsightConfig::default());
        let roas = insights.iter().find(|i| i.title.contains("headroom")).unwrap();
        assert_eq!(roas.kind, InsightKind::Opportunity);
    }

    #[test]
    fn test_roas_rules_suppressed_without_spend() {
        let orders = [order("W", "Cat", "C1", 100.0)];
        let rfm = RfmReport::default();
        let insights = evaluate_insights(
            empty_inputs(&orders, &rfm, &[]),
            &InsightConfig::default(),
        );
        assert!(insights.iter().all(|i| !i.title.contains("ROAS")));
    }

    #[test]
    fn test_weekly_trend_down_is_warning() {
        let mut values = vec![100.0; 7];
        values.extend(vec![70.0; 7]);
        let daily = daily_series(&values);
        let rfm = RfmReport::default();

        let insights = evaluate_insights(
            empty_inputs(&[], &rfm, &daily),
            &InsightConfig::default(),
        );
        let trend = insights.iter().find(|i| i.title.contains("week")).unwrap();
        assert_eq!(trend.kind, InsightKind::Warning);
        // 30% drop clears the high bound.
        assert_eq!(trend.priority, Priority::High);
        assert_eq!(trend.metric.as_deref(), Some("-30.0%"));
    }

    #[test]
    fn test_weekly_trend_up_is_trend() {
        let mut values = vec![100.0; 7];
        values.extend(vec![115.0; 7]);
        let daily = daily_series(&values);
        let rfm = RfmReport::default();

        let insights = evaluate_insights(
            empty_inputs(&[], &rfm, &daily),
            &InsightConfig::default(),
        );
        let trend = insights.iter().find(|i| i.title.contains("week")).unwrap();
        assert_eq!(trend.kind, InsightKind::Trend);
        assert_eq!(trend.priority, Priority::Medium);
    }

    #[test]
    fn test_trend_needs_two_weeks_of_history() {
        let daily = daily_series(&[100.0; 10]);
        let rfm = RfmReport::default();
        let insights = evaluate_insights(
            empty_inputs(&[], &rfm, &daily),
            &InsightConfig::default(),
        );
        assert!(insights.is_empty());
    }

    #[test]
    fn test_product_concentration() {
        // One product at 90% of revenue across ten products.
        let mut orders = vec![order("Star", "Cat", "C1", 900.0)];
        for i in 0..9 {
            orders.push(order(&format!("P{i}"), "Cat", "C1", 100.0 / 9.0));
        }
        let report = allocate(&orders, &[], EntityDimension::Product);
        let rfm = RfmReport::default();
        let mut inputs = empty_inputs(&orders, &rfm, &[]);
        inputs.by_product = Some(&report);

        let insights = evaluate_insights(inputs, &InsightConfig::default());
        let conc = insights
            .iter()
            .find(|i| i.title.contains("concentrated"))
            .expect("concentration rule should fire");
        // 900 + 100/9 of the 1000 total lands in the top two.
        assert_eq!(conc.metric.as_deref(), Some("91.1% in top 2"));
    }

    #[test]
    fn test_underexploited_categories() {
        // "Premium" has a high ticket but little total revenue next to the
        // bulk category.
        let mut orders = vec![order("Lux", "Premium", "C1", 300.0)];
        for i in 0..20 {
            orders.push(order(&format!("B{i}"), "Bulk", "C1", 100.0));
        }
        let rfm = RfmReport::default();

        let insights = evaluate_insights(
            empty_inputs(&orders, &rfm, &[]),
            &InsightConfig::default(),
        );
        let rec = insights
            .iter()
            .find(|i| i.kind == InsightKind::Recommendation)
            .expect("category rule should fire");
        assert!(rec.description.contains("Premium"));
    }

    #[test]
    fn test_at_risk_share_rule() {
        let as_of = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let old = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        let customers: Vec<Customer> = (0..4)
            .map(|i| Customer {
                customer_key: format!("C{i}"),
                first_order_date: old,
                last_order_date: old,
                cohort_month: "2025-01".to_string(),
                total_revenue: 100.0,
                total_orders: 1,
                avg_ticket: 100.0,
                city: String::new(),
                state: String::new(),
                orders: vec![],
            })
            .collect();
        let rfm = segment_customers(&customers, as_of, &RfmConfig::default());

        let insights = evaluate_insights(
            empty_inputs(&[], &rfm, &[]),
            &InsightConfig::default(),
        );
        let at_risk = insights.iter().find(|i| i.title.contains("quiet")).unwrap();
        assert_eq!(at_risk.metric.as_deref(), Some("100.0% at risk"));
    }

    #[test]
    fn test_orphan_spend_rule() {
        let orders = [order("W", "Cat", "C1", 1000.0)];
        let spends = [spend("C1", 300.0), spend("GHOST", 100.0)];
        let report = allocate(&orders, &spends, EntityDimension::Product);
        let rfm = RfmReport::default();
        let mut inputs = empty_inputs(&orders, &rfm, &[]);
        inputs.by_product = Some(&report);
        inputs.spend = Some(&spends);

        let insights = evaluate_insights(inputs, &InsightConfig::default());
        let orphan = insights
            .iter()
            .find(|i| i.title.contains("unmatched"))
            .expect("orphan rule should fire");
        assert_eq!(orphan.metric.as_deref(), Some("25.0% orphaned"));
    }

    #[test]
    fn test_top_truncates_to_the_limit() {
        assert!(top(&[], 3).is_empty());

        let orders = [order("W", "Cat", "C1", 100.0)];
        let spends = [spend("C1", 80.0), spend("GHOST", 20.0)];
        let report = allocate(&orders, &spends, EntityDimension::Product);
        let rfm = RfmReport::default();
        let mut inputs = empty_inputs(&orders, &rfm, &[]);
        inputs.by_product = Some(&report);
        inputs.spend = Some(&spends);

        let insights = evaluate_insights(inputs, &InsightConfig::default());
        assert!(insights.len() >= 2);
        assert_eq!(top(&insights, insights.len() + 5), &insights[..]);
        assert_eq!(top(&insights, 1), &insights[..1]);
    }

    #[test]
    fn test_sorted_by_priority_high_first() {
        // Low ROAS (high) plus orphan spend (medium) in one run.
        let orders = [order("W", "Cat", "C1", 100.0)];
        let spends = [spend("C1", 80.0), spend("GHOST", 20.0)];
        let report = allocate(&orders, &spends, EntityDimension::Product);
        let rfm = RfmReport::default();
        let mut inputs = empty_inputs(&orders, &rfm, &[]);
        inputs.by_product = Some(&report);
        inputs.spend = Some(&spends);

        let insights = evaluate_insights(inputs, &InsightConfig::default());
        assert!(insights.len() >= 2);
        for pair in insights.windows(2) {
            assert!(pair[0].priority <= pair[1].priority);
        }
        assert_eq!(insights[0].priority, Priority::High);
    }
}
