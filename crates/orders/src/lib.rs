//! `OrderBook` (`spec.md` §4.4): pending purchase orders and their
//! transit-to-completion lifecycle. Depends on `Catalog`.

mod order;
mod repository;
mod service;

pub use order::{CompleteDecision, NewOrderItem, OrderItem, OrderStatus, PendingOrder};
pub use repository::OrderRepository;
pub use service::OrderService;

