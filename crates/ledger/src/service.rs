use chrono::{DateTime, NaiveDate, Utc};

use kiosk_catalog::ProductRepository;
use kiosk_core::{CompanyId, CoreError, CoreResult, OrderId, ProductId};

use crate::consumption::period_consumption;
use crate::{LedgerRepository, StockSnapshot, SupplyEvent};

/// `Ledger` (`spec.md` §4.2): stock snapshots, supplies, and the derived
/// consumption view. Depends on `Catalog` for the per-product weight
/// derivation constants (`package_weight`, `box_weight`, `price_per_box`).
pub struct LedgerService<R, P> {
    ledger: R,
    products: P,
}

impl<R, P> LedgerService<R, P>
where
    R: LedgerRepository,
    P: ProductRepository,
{
    pub fn new(ledger: R, products: P) -> Self {
        Self { ledger, products }
    }

    pub async fn record_snapshot(
        &self,
        company_id: CompanyId,
        product_id: ProductId,
        date: NaiveDate,
        quantity: f64,
        now: DateTime<Utc>,
    ) -> CoreResult<StockSnapshot> {
        let product = self
            .products
            .get(product_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("product {product_id}")))?;
        if product.company_id != company_id {
            return Err(CoreError::forbidden("product belongs to a different company"));
        }
        let weight = quantity * product.package_weight;
        self.ledger
            .upsert_snapshot(StockSnapshot {
                company_id,
                product_id,
                date,
                quantity,
                weight,
                created_at: now,
            })
            .await
    }

    pub async fn record_supply(
        &self,
        company_id: CompanyId,
        product_id: ProductId,
        date: NaiveDate,
        boxes: f64,
    ) -> CoreResult<SupplyEvent> {
        let product = self
            .products
            .get(product_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("product {product_id}")))?;
        if product.company_id != company_id {
            return Err(CoreError::forbidden("product belongs to a different company"));
        }
        let weight = boxes * product.box_weight;
        let cost = boxes * product.price_per_box;
        self.ledger
            .insert_supply(SupplyEvent {
                company_id,
                product_id,
                date,
                boxes,
                weight,
                cost,
                order_id: None,
            })
            .await
    }

    /// Emits a supply for a completed order item. Unlike `record_supply`,
    /// `weight`/`cost` are taken as given rather than re-derived from the
    /// product's *current* `box_weight`/`price_per_box` -- they must equal
    /// the order item's own stored values, which were fixed at order
    /// creation and may no longer match the product if its packaging or
    /// price changed in the meantime (`spec.md` §4.4). Keying the row on
    /// `order_id` makes re-running this for the same order idempotent.
    pub async fn record_order_supply(
        &self,
        company_id: CompanyId,
        order_id: OrderId,
        product_id: ProductId,
        date: NaiveDate,
        boxes: f64,
        weight: f64,
        cost: f64,
    ) -> CoreResult<SupplyEvent> {
        self.ledger
            .insert_supply(SupplyEvent {
                company_id,
                product_id,
                date,
                boxes,
                weight,
                cost,
                order_id: Some(order_id),
            })
            .await
    }

    pub async fn latest_snapshot_per_product(&self, company_id: CompanyId) -> CoreResult<Vec<StockSnapshot>> {
        self.ledger.latest_snapshot_per_product(company_id).await
    }

    pub async fn snapshot_on(&self, company_id: CompanyId, date: NaiveDate) -> CoreResult<Vec<StockSnapshot>> {
        self.ledger.snapshot_on(company_id, date).await
    }

    /// Anchored to the product's own latest snapshot date, not wall-clock
    /// today (`spec.md` §4.2, §9).
    pub async fn history(&self, company_id: CompanyId, product_id: ProductId, window_days: i64) -> CoreResult<Vec<StockSnapshot>> {
        let anchor = self.ledger.latest_date_for_product(company_id, product_id).await?;
        let Some(anchor) = anchor else {
            return Ok(Vec::new());
        };
        let since = anchor - chrono::Duration::days(window_days);
        self.ledger.history_since(company_id, product_id, since).await
    }

    /// Half-open `(start, end]`: supplies dated on the start boundary are
    /// excluded, since that boundary is itself a snapshot instant.
    pub async fn supplies_between(
        &self,
        company_id: CompanyId,
        product_id: Option<ProductId>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CoreResult<Vec<SupplyEvent>> {
        let rows = self.ledger.supplies_in_range(company_id, product_id, start, end).await?;
        Ok(rows.into_iter().filter(|s| s.date > start).collect())
    }

    /// The §4.2 accounting identity for a single period, fetching the
    /// inclusive-both-ends supply window itself so the start-boundary
    /// double-count guard can see the `s1`-dated row.
    pub async fn compute_period_consumption(
        &self,
        company_id: CompanyId,
        s1: &StockSnapshot,
        s2: &StockSnapshot,
    ) -> CoreResult<Option<(f64, i64)>> {
        let supplies = self
            .ledger
            .supplies_in_range(company_id, Some(s1.product_id), s1.date, s2.date)
            .await?;
        Ok(period_consumption(s1, s2, &supplies))
    }
}
