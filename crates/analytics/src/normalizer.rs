//! Record normalizer: turns loosely typed feed rows into strict [`Order`]
//! entities at the boundary, so no dynamic data reaches the aggregation
//! stages.
//!
//! Policy: a row without a parseable date is dropped and counted (cohort and
//! LTV math cannot place it in time); a row without a parseable revenue is
//! kept with revenue 0.

use chrono::NaiveDate;
use pulse_core::types::{Order, RawOrderRecord};
use tracing::{debug, warn};

/// Normalizer output: the canonical order list plus the count of rows that
/// had to be dropped.
#[derive(Debug, Clone, Default)]
pub struct OrderFeed {
    pub orders: Vec<Order>,
    pub malformed_records: u64,
}

/// Validate and canonicalize raw feed rows.
///
/// Anonymous rows (no tax identifier) receive a deterministic `anon:<index>`
/// key so reruns over the same snapshot are byte-identical; anonymous rows
/// are never merged with each other.
pub fn normalize_orders(rows: &[RawOrderRecord]) -> OrderFeed {
    let mut feed = OrderFeed::default();

    for (index, row) in rows.iter().enumerate() {
        let date = match row.order_date.as_deref().and_then(parse_order_date) {
            Some(date) => date,
            None => {
                feed.malformed_records += 1;
                continue;
            }
        };

        let customer_key = match non_empty(row.customer_tax_id.as_deref()) {
            Some(tax_id) => tax_id.to_string(),
            None => format!("anon:{index}"),
        };

        let revenue = row
            .revenue
            .as_deref()
            .and_then(parse_revenue)
            .unwrap_or(0.0);

        feed.orders.push(Order {
            order_id: non_empty(row.order_id.as_deref()).map(str::to_string),
            customer_key,
            order_date: date,
            revenue,
            product_name: trimmed(row.product_name.as_deref()),
            category: non_empty(row.category.as_deref())
                .unwrap_or("uncategorized")
                .to_string(),
            campaign: trimmed(row.campaign.as_deref()),
            channel: non_empty(row.channel.as_deref())
                .unwrap_or("unidentified")
                .to_string(),
            status: trimmed(row.status.as_deref()),
            city: trimmed(row.city.as_deref()),
            state: trimmed(row.state.as_deref()),
        });
    }

    if feed.malformed_records > 0 {
        warn!(
            dropped = feed.malformed_records,
            kept = feed.orders.len(),
            "Dropped feed rows without a parseable date"
        );
    }
    debug!(orders = feed.orders.len(), "Order feed normalized");

    feed
}

/// Default status predicate matching the source dashboard: completed, paid,
/// shipped, invoiced, delivered, or unset. Callers are free to supply their
/// own predicate to the pipeline instead.
pub fn completed_status(status: &str) -> bool {
    let status = status.trim().to_lowercase();
    status.is_empty()
        || ["complete", "completo", "pago", "enviado", "faturado", "entregue"]
            .iter()
            .any(|keyword| status.contains(keyword))
}

/// Parse `DD/MM/YYYY` or `YYYY-MM-DD`, tolerating a trailing ` HH:MM:SS`.
fn parse_order_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let head = raw.get(..10)?;
    if head.contains('/') {
        NaiveDate::parse_from_str(head, "%d/%m/%Y").ok()
    } else if head.contains('-') {
        NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
    } else {
        None
    }
}

/// Parse a locale-formatted decimal. A comma marks the Brazilian convention
/// (`1.234,56`); everything else goes straight to `f64`.
fn parse_revenue(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let clean = if raw.contains(',') {
        raw.replace('.', "").replace(',', ".")
    } else {
        raw.to_string()
    };
    clean.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn trimmed(value: Option<&str>) -> String {
    value.unwrap_or("").trim().to_string()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(date: Option<&str>, revenue: Option<&str>) -> RawOrderRecord {
        RawOrderRecord {
            order_id: Some("1001".to_string()),
            customer_tax_id: Some("123.456.789-00".to_string()),
            order_date: date.map(str::to_string),
            revenue: revenue.map(str::to_string),
            product_name: Some("Widget".to_string()),
            category: Some("Widgets".to_string()),
            campaign: Some("summer".to_string()),
            channel: Some("google_ads".to_string()),
            status: Some("complete".to_string()),
            city: Some("Campinas".to_string()),
            state: Some("SP".to_string()),
        }
    }

    #[test]
    fn test_parses_both_date_formats() {
        let feed = normalize_orders(&[
            row(Some("05/01/2025"), Some("10")),
            row(Some("2025-01-05"), Some("10")),
            row(Some("05/01/2025 13:45:12"), Some("10")),
        ]);
        assert_eq!(feed.orders.len(), 3);
        assert_eq!(feed.malformed_records, 0);
        let expected = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        assert!(feed.orders.iter().all(|o| o.order_date == expected));
    }

    #[test]
    fn test_row_without_date_is_dropped_and_counted() {
        let feed = normalize_orders(&[
            row(None, Some("10")),
            row(Some("garbage"), Some("10")),
            row(Some("05/01/2025"), Some("10")),
        ]);
        assert_eq!(feed.orders.len(), 1);
        assert_eq!(feed.malformed_records, 2);
    }

    #[test]
    fn test_missing_revenue_defaults_to_zero() {
        let feed = normalize_orders(&[
            row(Some("05/01/2025"), None),
            row(Some("05/01/2025"), Some("not a number")),
        ]);
        assert_eq!(feed.orders.len(), 2);
        assert!(feed.orders.iter().all(|o| o.revenue == 0.0));
    }

    #[test]
    fn test_brazilian_and_plain_decimals() {
        let feed = normalize_orders(&[
            row(Some("05/01/2025"), Some("1.234,56")),
            row(Some("05/01/2025"), Some("1234.56")),
            row(Some("05/01/2025"), Some("99")),
        ]);
        assert_eq!(feed.orders[0].revenue, 1234.56);
        assert_eq!(feed.orders[1].revenue, 1234.56);
        assert_eq!(feed.orders[2].revenue, 99.0);
    }

    #[test]
    fn test_anonymous_rows_get_distinct_deterministic_keys() {
        let mut anon = row(Some("05/01/2025"), Some("10"));
        anon.customer_tax_id = None;
        let feed = normalize_orders(&[anon.clone(), anon]);
        assert_eq!(feed.orders[0].customer_key, "anon:0");
        assert_eq!(feed.orders[1].customer_key, "anon:1");
    }

    #[test]
    fn test_empty_order_id_becomes_none() {
        let mut r = row(Some("05/01/2025"), Some("10"));
        r.order_id = Some("  ".to_string());
        let feed = normalize_orders(&[r]);
        assert_eq!(feed.orders[0].order_id, None);
    }

    #[test]
    fn test_missing_location_normalizes_to_empty() {
        let mut r = row(Some("05/01/2025"), Some("10"));
        r.city = None;
        r.state = Some("  ".to_string());
        let feed = normalize_orders(&[r]);
        assert_eq!(feed.orders[0].city, "");
        assert_eq!(feed.orders[0].state, "");
    }

    #[test]
    fn test_completed_status_predicate() {
        assert!(completed_status("Complete"));
        assert!(completed_status("Pedido Faturado"));
        assert!(completed_status(""));
        assert!(!completed_status("Cancelado"));
        assert!(!completed_status("Pagamento Pendente"));
    }
}
