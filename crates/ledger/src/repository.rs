use async_trait::async_trait;
use chrono::NaiveDate;

use kiosk_core::{CompanyId, CoreResult, ProductId};

use crate::{StockSnapshot, SupplyEvent};

/// Persistence seam for `Ledger` (`spec.md` §4.2). Implemented against
/// Postgres by `kiosk-infra`.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Upserts on `(company_id, product_id, date)` — no history retained
    /// beyond the latest value for that key.
    async fn upsert_snapshot(&self, snapshot: StockSnapshot) -> CoreResult<StockSnapshot>;

    /// Append-only: multiple rows per `(product_id, date)` permitted.
    async fn insert_supply(&self, supply: SupplyEvent) -> CoreResult<SupplyEvent>;

    /// For each product with any history, the row with the maximum date.
    async fn latest_snapshot_per_product(&self, company_id: CompanyId) -> CoreResult<Vec<StockSnapshot>>;

    async fn snapshot_on(&self, company_id: CompanyId, date: NaiveDate) -> CoreResult<Vec<StockSnapshot>>;

    async fn latest_date_for_product(&self, company_id: CompanyId, product_id: ProductId) -> CoreResult<Option<NaiveDate>>;

    /// Ascending by date, `date >= since`.
    async fn history_since(&self, company_id: CompanyId, product_id: ProductId, since: NaiveDate) -> CoreResult<Vec<StockSnapshot>>;

    /// Inclusive both ends: `start <= date <= end`. `product_id = None` means
    /// all products for the company. Callers apply their own boundary rules
    /// on top (half-open for reporting, start-inclusive for the consumption
    /// identity's double-count guard).
    async fn supplies_in_range(
        &self,
        company_id: CompanyId,
        product_id: Option<ProductId>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CoreResult<Vec<SupplyEvent>>;
}
