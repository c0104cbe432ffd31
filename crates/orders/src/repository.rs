use async_trait::async_trait;

use kiosk_core::{CompanyId, CoreResult, OrderId, ProductId};

use crate::{OrderItem, PendingOrder};

/// Persistence seam for `OrderBook` (`spec.md` §4.4). Implemented against
/// Postgres by `kiosk-infra`.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Opens a pending order and all its items atomically.
    async fn insert(&self, order: PendingOrder, items: Vec<OrderItem>) -> CoreResult<(PendingOrder, Vec<OrderItem>)>;

    async fn get(&self, id: OrderId) -> CoreResult<Option<PendingOrder>>;

    async fn get_items(&self, id: OrderId) -> CoreResult<Vec<OrderItem>>;

    async fn list_pending(&self, company_id: CompanyId) -> CoreResult<Vec<PendingOrder>>;

    /// Sets `status = completed`. Callers have already emitted the
    /// corresponding supply rows in the same transaction.
    async fn mark_completed(&self, id: OrderId) -> CoreResult<()>;

    async fn mark_cancelled(&self, id: OrderId) -> CoreResult<()>;

    /// Σ `item.weight_ordered` over pending orders for this product
    /// (`spec.md` §4.4 `in_transit_weight`).
    async fn in_transit_weight(&self, company_id: CompanyId, product_id: ProductId) -> CoreResult<f64>;
}
