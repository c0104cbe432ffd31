use std::collections::HashMap;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use kiosk_catalog::ProductRepository;
use kiosk_core::{CompanyId, CoreResult, ProductId};
use kiosk_ledger::LedgerRepository;

use crate::math::{average_daily_consumption, days_until_stockout, order_quantity};

/// History and supply window fed into `average_daily_consumption` for each
/// product, per `spec.md` §4.3 ("the last 30 days of history").
const HISTORY_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSuggestion {
    pub product_id: ProductId,
    pub avg_daily: f64,
    pub days_left: f64,
    pub deficit_weight: f64,
    pub boxes: i64,
    pub cost: f64,
    pub urgent: bool,
}

/// `Forecaster` (`spec.md` §4.3): reads `Ledger` and `Catalog`; does not
/// itself depend on `OrderBook` — `pending_weight` per product is supplied
/// by the caller (typically the facade, which does own both).
pub struct ForecastService<R, P> {
    ledger: R,
    products: P,
}

impl<R, P> ForecastService<R, P>
where
    R: LedgerRepository,
    P: ProductRepository,
{
    pub fn new(ledger: R, products: P) -> Self {
        Self { ledger, products }
    }

    /// For each product's latest snapshot, enriches with `avg_daily` over
    /// the last 30 days, computes `days_left` over `(current + pending)`,
    /// and includes the product when `days_left <= threshold_days` and
    /// `order_quantity` produces `boxes > 0`. Sorted ascending by
    /// `days_left`; items with `days_left <= 3.0` are tagged urgent.
    pub async fn select_items_to_order(
        &self,
        company_id: CompanyId,
        horizon_days: i64,
        threshold_days: f64,
        pending_weights: &HashMap<ProductId, f64>,
        use_02_rule: bool,
    ) -> CoreResult<Vec<OrderSuggestion>> {
        let latest = self.ledger.latest_snapshot_per_product(company_id).await?;
        let mut suggestions = Vec::new();

        for snapshot in latest {
            let Some(product) = self.products.get(snapshot.product_id).await? else {
                continue;
            };

            let since = snapshot.date - Duration::days(HISTORY_WINDOW_DAYS);
            let history = self
                .ledger
                .history_since(company_id, snapshot.product_id, since)
                .await?;
            let supplies = self
                .ledger
                .supplies_in_range(company_id, Some(snapshot.product_id), since, snapshot.date)
                .await?;

            let (avg_daily, _days_with_data, _warning) = average_daily_consumption(&history, &supplies);
            let pending = pending_weights.get(&snapshot.product_id).copied().unwrap_or(0.0);
            let days_left = days_until_stockout(snapshot.weight + pending, avg_daily);

            let (deficit_weight, boxes) = order_quantity(
                avg_daily,
                horizon_days as f64,
                snapshot.weight,
                product.box_weight,
                pending,
                use_02_rule,
            );

            if days_left <= threshold_days && boxes > 0 {
                suggestions.push(OrderSuggestion {
                    product_id: snapshot.product_id,
                    avg_daily,
                    days_left,
                    deficit_weight,
                    boxes,
                    cost: boxes as f64 * product.price_per_box,
                    urgent: days_left <= 3.0,
                });
            }
        }

        suggestions.sort_by(|a, b| a.days_left.partial_cmp(&b.days_left).unwrap());
        Ok(suggestions)
    }

    /// `(items, total_cost, should_notify)`. `should_notify` is
    /// `total_cost >= threshold_amount` — the default threshold is
    /// `crate::DEFAULT_NOTIFY_THRESHOLD`.
    pub fn summary(&self, items: Vec<OrderSuggestion>, threshold_amount: f64) -> (Vec<OrderSuggestion>, f64, bool) {
        let total_cost: f64 = items.iter().map(|i| i.cost).sum();
        let should_notify = total_cost >= threshold_amount;
        (items, total_cost, should_notify)
    }
}
