use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use kiosk_core::{CompanyId, OrderId, ProductId};

/// Measured on-hand quantity at the end of a working day (`spec.md` §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub company_id: CompanyId,
    pub product_id: ProductId,
    pub date: NaiveDate,
    pub quantity: f64,
    /// `quantity * package_weight`, enforced on write.
    pub weight: f64,
    pub created_at: DateTime<Utc>,
}

/// An inbound shipment received on a date (`spec.md` §3). Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyEvent {
    pub company_id: CompanyId,
    pub product_id: ProductId,
    pub date: NaiveDate,
    pub boxes: f64,
    /// `boxes * box_weight` (кг-like units) or `boxes * units_per_box` (шт).
    pub weight: f64,
    /// `boxes * price_per_box` at the time of entry.
    pub cost: f64,
    /// The order this supply was emitted for on completion, if any. `None`
    /// for supplies entered directly through `record_supply`. Used as the
    /// idempotency key that makes re-running order completion safe.
    pub order_id: Option<OrderId>,
}
