use chrono::{DateTime, NaiveDate, Utc};

use kiosk_catalog::ProductRepository;
use kiosk_core::{CompanyId, CoreError, CoreResult, OrderId, ProductId};

use crate::order::{decide_cancel, decide_complete, CompleteDecision};
use crate::{NewOrderItem, OrderItem, OrderRepository, OrderStatus, PendingOrder};

/// `OrderBook` (`spec.md` §4.4): pending purchase orders and their
/// transit-to-completion lifecycle. Depends on `Catalog` for per-product
/// weight/cost derivation; does not depend on `Ledger` — supply emission on
/// completion is orchestrated by the caller (see `CompleteDecision`), which
/// also owns making that emission atomic with `finalize_complete`.
pub struct OrderService<R, P> {
    orders: R,
    products: P,
}

impl<R, P> OrderService<R, P>
where
    R: OrderRepository,
    P: ProductRepository,
{
    pub fn new(orders: R, products: P) -> Self {
        Self { orders, products }
    }

    /// Opens a pending order atomically with all items; `total_cost =
    /// Σ item.cost`.
    pub async fn create(
        &self,
        id: OrderId,
        company_id: CompanyId,
        items: Vec<NewOrderItem>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> CoreResult<(PendingOrder, Vec<OrderItem>)> {
        if items.is_empty() {
            return Err(CoreError::validation("an order must have at least one item"));
        }

        let mut resolved = Vec::with_capacity(items.len());
        let mut total_cost = 0.0;
        for item in items {
            if item.boxes_ordered <= 0.0 {
                return Err(CoreError::validation("boxes_ordered must be positive"));
            }
            let product = self
                .products
                .get(item.product_id)
                .await?
                .ok_or_else(|| CoreError::not_found(format!("product {}", item.product_id)))?;
            if product.company_id != company_id {
                return Err(CoreError::forbidden("product belongs to a different company"));
            }
            let weight_ordered = item.boxes_ordered * product.box_weight;
            let cost = item.boxes_ordered * product.price_per_box;
            total_cost += cost;
            resolved.push(OrderItem {
                order_id: id,
                product_id: item.product_id,
                boxes_ordered: item.boxes_ordered,
                weight_ordered,
                cost,
            });
        }

        let order = PendingOrder {
            id,
            company_id,
            created_at: now,
            status: OrderStatus::Pending,
            total_cost,
            notes,
        };
        self.orders.insert(order, resolved).await
    }

    pub async fn get_order(&self, id: OrderId) -> CoreResult<(PendingOrder, Vec<OrderItem>)> {
        let order = self
            .orders
            .get(id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("order {id}")))?;
        let items = self.orders.get_items(id).await?;
        Ok((order, items))
    }

    pub async fn list_pending(&self, company_id: CompanyId) -> CoreResult<Vec<PendingOrder>> {
        self.orders.list_pending(company_id).await
    }

    pub async fn in_transit_weight(&self, company_id: CompanyId, product_id: ProductId) -> CoreResult<f64> {
        self.orders.in_transit_weight(company_id, product_id).await
    }

    /// Validates the transition and returns what the caller must do next
    /// (see `CompleteDecision`). Does not itself emit supplies or flip
    /// status to completed — pass the returned `items` to `Ledger` inside a
    /// transaction, then call `finalize_complete`. The caller supplies
    /// `today` (its working date, `spec.md` §4.7) rather than this method
    /// computing `Utc::now()` itself, since emitted supplies are
    /// date-keyed writes and must use the same working-day rule as every
    /// other write.
    pub async fn prepare_complete(&self, id: OrderId, today: NaiveDate) -> CoreResult<(NaiveDate, CompleteDecision)> {
        let order = self
            .orders
            .get(id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("order {id}")))?;
        let items = self.orders.get_items(id).await?;
        let decision = decide_complete(&order, items)?;
        Ok((today, decision))
    }

    /// Called after the caller has durably emitted every item's
    /// `SupplyEvent` in the same transaction as this status flip.
    pub async fn finalize_complete(&self, id: OrderId) -> CoreResult<()> {
        self.orders.mark_completed(id).await
    }

    pub async fn cancel(&self, id: OrderId) -> CoreResult<()> {
        let order = self
            .orders
            .get(id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("order {id}")))?;
        decide_cancel(&order)?;
        self.orders.mark_cancelled(id).await
    }
}
