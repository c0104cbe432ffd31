//! `Catalog` (`spec.md` §4.1's leaf module): per-company product lists.

mod product;
mod repository;
mod service;

pub use product::{NewProduct, Product};
pub use repository::ProductRepository;
pub use service::CatalogService;
