use async_trait::async_trait;

use kiosk_core::{CompanyId, CoreResult, ProductId};

use crate::Product;

/// Persistence seam for `Catalog` (`spec.md` §4.1). Implemented against
/// Postgres by `kiosk-infra`.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn insert(&self, product: Product) -> CoreResult<Product>;
    async fn get(&self, id: ProductId) -> CoreResult<Option<Product>>;
    async fn get_by_internal_name(&self, company_id: CompanyId, name_internal: &str) -> CoreResult<Option<Product>>;
    async fn list(&self, company_id: CompanyId) -> CoreResult<Vec<Product>>;
    async fn update(&self, product: Product) -> CoreResult<Product>;
}
