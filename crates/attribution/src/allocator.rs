//! Two-sided proportional allocation.
//!
//! Orders and the spend ledger are joined only by the campaign name, a soft
//! key. Spend is distributed across entities in proportion to each entity's
//! share of that campaign's attributed revenue. Spend on campaigns with no
//! attributed revenue at all is orphan spend: it stays in the totals but is
//! never pushed onto an entity.

use std::collections::BTreeMap;

use pulse_core::types::{CampaignSpend, Order};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which order field acts as the allocation entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityDimension {
    Product,
    Category,
    Channel,
}

impl EntityDimension {
    fn key<'a>(&self, order: &'a Order) -> &'a str {
        match self {
            EntityDimension::Product => &order.product_name,
            EntityDimension::Category => &order.category,
            EntityDimension::Channel => &order.channel,
        }
    }
}

/// Revenue, allocated spend and ROAS for one entity.
///
/// `roas` is `None` ("not applicable", serialized as `null`) whenever the
/// allocated investment is zero; it is never reported as 0 or infinity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionAllocation {
    pub entity_key: String,
    pub allocated_revenue: f64,
    pub allocated_investment: f64,
    pub roas: Option<f64>,
}

/// Allocation output for one entity dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationReport {
    pub dimension: EntityDimension,
    /// Sorted by allocated revenue descending, entity key as tie-break.
    pub allocations: Vec<AttributionAllocation>,
    /// Every unit of ledger spend, orphaned or not.
    pub total_spend: f64,
    /// Spend on campaigns with no attributed revenue.
    pub orphan_spend: f64,
}

/// Join revenue-by-campaign with the spend ledger for one entity dimension.
///
/// Rows with an empty entity key carry no usable grouping value and are
/// skipped; their campaigns still count toward campaign revenue totals so
/// the remaining entities' shares stay honest.
pub fn allocate(
    orders: &[Order],
    spends: &[CampaignSpend],
    dimension: EntityDimension,
) -> AllocationReport {
    // revenue(entity, campaign) and revenue(*, campaign)
    let mut entity_campaign: BTreeMap<(String, String), f64> = BTreeMap::new();
    let mut campaign_revenue: BTreeMap<String, f64> = BTreeMap::new();

    for order in orders {
        let campaign = order.campaign.trim().to_string();
        *campaign_revenue.entry(campaign.clone()).or_insert(0.0) += order.revenue;

        let entity = dimension.key(order).trim();
        if entity.is_empty() {
            continue;
        }
        *entity_campaign
            .entry((entity.to_string(), campaign))
            .or_insert(0.0) += order.revenue;
    }

    let mut spend_by_campaign: BTreeMap<String, f64> = BTreeMap::new();
    for spend in spends {
        *spend_by_campaign
            .entry(spend.campaign.trim().to_string())
            .or_insert(0.0) += spend.spend;
    }

    let total_spend: f64 = spend_by_campaign.values().sum();
    let orphan_spend: f64 = spend_by_campaign
        .iter()
        .filter(|(campaign, _)| {
            campaign_revenue
                .get(*campaign)
                .map(|revenue| *revenue <= 0.0)
                .unwrap_or(true)
        })
        .map(|(_, spend)| spend)
        .sum();

    let mut entities: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for ((entity, campaign), revenue) in &entity_campaign {
        let entry = entities.entry(entity.clone()).or_insert((0.0, 0.0));
        entry.0 += revenue;

        let campaign_total = campaign_revenue.get(campaign).copied().unwrap_or(0.0);
        if campaign_total <= 0.0 {
            continue;
        }
        let spend = spend_by_campaign.get(campaign).copied().unwrap_or(0.0);
        entry.1 += spend * revenue / campaign_total;
    }

    let mut allocations: Vec<AttributionAllocation> = entities
        .into_iter()
        .map(|(entity_key, (revenue, investment))| AttributionAllocation {
            entity_key,
            allocated_revenue: revenue,
            allocated_investment: investment,
            roas: if investment > 0.0 {
                Some(revenue / investment)
            } else {
                None
            },
        })
        .collect();

    allocations.sort_by(|a, b| {
        b.allocated_revenue
            .partial_cmp(&a.allocated_revenue)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.entity_key.cmp(&b.entity_key))
    });

    debug!(
        dimension = ?dimension,
        entities = allocations.len(),
        orphan_spend,
        "Attribution allocation computed"
    );

    AllocationReport {
        dimension,
        allocations,
        total_spend,
        orphan_spend,
    }
}
