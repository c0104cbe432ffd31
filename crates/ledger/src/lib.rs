//! `Ledger` (`spec.md` §4.2): stock snapshots, supplies, and the derived
//! consumption view. Depends on `Catalog`.

mod consumption;
mod repository;
mod service;
mod snapshot;

pub use consumption::period_consumption;
pub use repository::LedgerRepository;
pub use service::LedgerService;
pub use snapshot::{StockSnapshot, SupplyEvent};

