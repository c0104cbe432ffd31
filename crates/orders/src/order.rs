use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use kiosk_core::{CompanyId, CoreError, CoreResult, OrderId, ProductId};

/// `spec.md` §4.4: pending ──complete──▶ completed (terminal, emits
/// supplies); pending ──cancel──▶ cancelled (terminal, no ledger effect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOrder {
    pub id: OrderId,
    pub company_id: CompanyId,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub total_cost: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub boxes_ordered: f64,
    pub weight_ordered: f64,
    pub cost: f64,
}

/// Unvalidated input to `OrderService::create`.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub boxes_ordered: f64,
}

/// What a caller must do to honor `complete(order_id)`'s atomicity
/// requirement: the supply rows are emitted (against `kiosk-ledger`, in the
/// same DB transaction) before `OrderRepository::mark_completed` runs.
/// `kiosk-orders` does not depend on `kiosk-ledger` (`spec.md` §4: "OrderBook
/// depends on Catalog"), so this orchestration lives in the facade.
#[derive(Debug, Clone, PartialEq)]
pub enum CompleteDecision {
    /// The order was already completed; re-invocation is a no-op and no
    /// further supplies should be emitted.
    AlreadyCompleted,
    /// The order is pending: emit one supply per item dated `today`, then
    /// call `OrderRepository::mark_completed`.
    Proceed { items: Vec<OrderItem> },
}

impl PendingOrder {
    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }
}

/// Validates a `complete(order_id)` request against the current order
/// status (`spec.md` §4.4, §8 round-trip notes). Completing an
/// already-completed order is a benign no-op; completing a cancelled order
/// is a `Conflict` — those are reached via different transitions and are
/// not equivalent retries.
pub fn decide_complete(order: &PendingOrder, items: Vec<OrderItem>) -> CoreResult<CompleteDecision> {
    match order.status {
        OrderStatus::Pending => Ok(CompleteDecision::Proceed { items }),
        OrderStatus::Completed => Ok(CompleteDecision::AlreadyCompleted),
        OrderStatus::Cancelled => Err(CoreError::conflict(format!(
            "order {} is cancelled and cannot be completed",
            order.id
        ))),
    }
}

/// `cancel(order_id)`: only a pending order can be cancelled.
pub fn decide_cancel(order: &PendingOrder) -> CoreResult<()> {
    if !order.is_pending() {
        return Err(CoreError::conflict(format!(
            "order {} is not pending and cannot be cancelled",
            order.id
        )));
    }
    Ok(())
}

/// Computes each item's derived weight/cost and the order total. `today` is
/// the caller's working date (`spec.md` §4.7), used to dated the
/// `SupplyEvent`s emitted on completion.
pub struct OrderDraft {
    pub items: Vec<OrderItem>,
    pub total_cost: f64,
    pub today: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(status: OrderStatus) -> PendingOrder {
        PendingOrder {
            id: OrderId::from_raw(1),
            company_id: CompanyId::from_raw(1),
            created_at: Utc::now(),
            status,
            total_cost: 100.0,
            notes: None,
        }
    }

    #[test]
    fn completing_pending_order_proceeds() {
        let decision = decide_complete(&order(OrderStatus::Pending), vec![]).unwrap();
        assert!(matches!(decision, CompleteDecision::Proceed { .. }));
    }

    #[test]
    fn completing_already_completed_order_is_noop() {
        let decision = decide_complete(&order(OrderStatus::Completed), vec![]).unwrap();
        assert_eq!(decision, CompleteDecision::AlreadyCompleted);
    }

    #[test]
    fn completing_cancelled_order_is_conflict() {
        let err = decide_complete(&order(OrderStatus::Cancelled), vec![]).unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[test]
    fn cancelling_non_pending_order_is_conflict() {
        let err = decide_cancel(&order(OrderStatus::Completed)).unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }
}
