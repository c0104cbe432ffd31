//! Postgres-backed adapters for every domain crate's repository trait, plus
//! the ambient concerns (`config`, `pool`, `errors`) and the two purely
//! process-local stores (`ids`, `draft_cache`) that don't belong to any one
//! domain crate. The one crate in the workspace allowed to depend on `sqlx`
//! and talk to the database.

pub mod catalog_postgres;
pub mod config;
pub mod draft_cache;
pub mod errors;
pub mod ids;
pub mod ledger_postgres;
pub mod orders_postgres;
pub mod pool;
pub mod submissions_postgres;
pub mod tenant_postgres;

pub use catalog_postgres::PostgresProductRepository;
pub use config::{Config, ConfigError, PoolConfig};
pub use draft_cache::DraftOrderCache;
pub use errors::map_sqlx_error;
pub use ledger_postgres::PostgresLedgerRepository;
pub use orders_postgres::PostgresOrderRepository;
pub use submissions_postgres::PostgresSubmissionRepository;
pub use tenant_postgres::{PostgresCompanyRepository, PostgresUserRepository};
