use serde::Deserialize;

/// Engine configuration. Loaded from environment variables with the prefix
/// `COMMERCE_PULSE__` and a `__` section separator; every field has a
/// default so an empty environment yields a working engine.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub cohort: CohortConfig,
    #[serde(default)]
    pub ltv: LtvConfig,
    #[serde(default)]
    pub rfm: RfmConfig,
    #[serde(default)]
    pub insight: InsightConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CohortConfig {
    /// Cohort months kept in the display window (most recent first).
    #[serde(default = "default_display_months")]
    pub display_months: usize,
    /// Highest age bucket shown in the retention matrix (ages 0..=N).
    #[serde(default = "default_max_age_months")]
    pub max_age_months: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LtvConfig {
    /// LTV curve horizon, in 30-day age buckets (0..=N).
    #[serde(default = "default_ltv_horizon_months")]
    pub horizon_months: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RfmConfig {
    #[serde(default = "default_champion_monetary")]
    pub champion_monetary: f64,
    #[serde(default = "default_champion_frequency")]
    pub champion_frequency: u64,
    #[serde(default = "default_loyal_frequency")]
    pub loyal_frequency: u64,
    #[serde(default = "default_loyal_recency_days")]
    pub loyal_recency_days: i64,
    #[serde(default = "default_new_customer_days")]
    pub new_customer_days: i64,
    #[serde(default = "default_at_risk_recency_days")]
    pub at_risk_recency_days: i64,
    #[serde(default = "default_lost_recency_days")]
    pub lost_recency_days: i64,
    /// Scatter outlier cut: points at or above either bound are kept in
    /// aggregate stats but excluded from scatter output.
    #[serde(default = "default_outlier_monetary")]
    pub outlier_monetary: f64,
    #[serde(default = "default_outlier_frequency")]
    pub outlier_frequency: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsightConfig {
    #[serde(default = "default_roas_warning_threshold")]
    pub roas_warning_threshold: f64,
    #[serde(default = "default_roas_scale_threshold")]
    pub roas_scale_threshold: f64,
    /// Revenue change (percent, absolute) over the trailing week that
    /// triggers the trend rule.
    #[serde(default = "default_trend_change_pct")]
    pub trend_change_pct: f64,
    /// Change beyond this bound upgrades the trend insight to high priority.
    #[serde(default = "default_trend_high_pct")]
    pub trend_high_pct: f64,
    /// Fraction of the catalogue counted as "top products".
    #[serde(default = "default_top_product_fraction")]
    pub top_product_fraction: f64,
    #[serde(default = "default_concentration_share_pct")]
    pub concentration_share_pct: f64,
    #[serde(default = "default_at_risk_share_pct")]
    pub at_risk_share_pct: f64,
    #[serde(default = "default_orphan_spend_share_pct")]
    pub orphan_spend_share_pct: f64,
}

// Default functions
fn default_display_months() -> usize {
    6
}
fn default_max_age_months() -> u32 {
    5
}
fn default_ltv_horizon_months() -> u32 {
    6
}
fn default_champion_monetary() -> f64 {
    2000.0
}
fn default_champion_frequency() -> u64 {
    3
}
fn default_loyal_frequency() -> u64 {
    3
}
fn default_loyal_recency_days() -> i64 {
    60
}
fn default_new_customer_days() -> i64 {
    30
}
fn default_at_risk_recency_days() -> i64 {
    60
}
fn default_lost_recency_days() -> i64 {
    180
}
fn default_outlier_monetary() -> f64 {
    10_000.0
}
fn default_outlier_frequency() -> u64 {
    20
}
fn default_roas_warning_threshold() -> f64 {
    2.0
}
fn default_roas_scale_threshold() -> f64 {
    4.0
}
fn default_trend_change_pct() -> f64 {
    10.0
}
fn default_trend_high_pct() -> f64 {
    20.0
}
fn default_top_product_fraction() -> f64 {
    0.2
}
fn default_concentration_share_pct() -> f64 {
    70.0
}
fn default_at_risk_share_pct() -> f64 {
    20.0
}
fn default_orphan_spend_share_pct() -> f64 {
    10.0
}

impl Default for CohortConfig {
    fn default() -> Self {
        Self {
            display_months: default_display_months(),
            max_age_months: default_max_age_months(),
        }
    }
}

impl Default for LtvConfig {
    fn default() -> Self {
        Self {
            horizon_months: default_ltv_horizon_months(),
        }
    }
}

impl Default for RfmConfig {
    fn default() -> Self {
        Self {
            champion_monetary: default_champion_monetary(),
            champion_frequency: default_champion_frequency(),
            loyal_frequency: default_loyal_frequency(),
            loyal_recency_days: default_loyal_recency_days(),
            new_customer_days: default_new_customer_days(),
            at_risk_recency_days: default_at_risk_recency_days(),
            lost_recency_days: default_lost_recency_days(),
            outlier_monetary: default_outlier_monetary(),
            outlier_frequency: default_outlier_frequency(),
        }
    }
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            roas_warning_threshold: default_roas_warning_threshold(),
            roas_scale_threshold: default_roas_scale_threshold(),
            trend_change_pct: default_trend_change_pct(),
            trend_high_pct: default_trend_high_pct(),
            top_product_fraction: default_top_product_fraction(),
            concentration_share_pct: default_concentration_share_pct(),
            at_risk_share_pct: default_at_risk_share_pct(),
            orphan_spend_share_pct: default_orphan_spend_share_pct(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cohort: CohortConfig::default(),
            ltv: LtvConfig::default(),
            rfm: RfmConfig::default(),
            insight: InsightConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn load() -> crate::error::PulseResult<Self> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("COMMERCE_PULSE")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .and_then(config::Config::try_deserialize)
            .map_err(|e| crate::error::PulseError::Config(e.to_string()))
    }
}
