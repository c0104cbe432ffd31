use kiosk_core::{CompanyId, CoreError, CoreResult, ProductId};

use crate::{NewProduct, Product, ProductRepository};

/// `Catalog` (`spec.md` §4.1): per-company product lists. A leaf module —
/// no dependency on `TenantStore` or anything else.
pub struct CatalogService<R> {
    products: R,
}

impl<R> CatalogService<R>
where
    R: ProductRepository,
{
    pub fn new(products: R) -> Self {
        Self { products }
    }

    /// Validates units and positive numerics, derives `box_weight`, and
    /// rejects a duplicate `(company_id, name_internal)`.
    pub async fn add_product(&self, new_product: NewProduct, next_id: ProductId) -> CoreResult<Product> {
        let box_weight = new_product.validate()?;
        if self
            .products
            .get_by_internal_name(new_product.company_id, &new_product.name_internal)
            .await?
            .is_some()
        {
            return Err(CoreError::conflict(format!(
                "product '{}' already exists for this company",
                new_product.name_internal
            )));
        }
        self.products
            .insert(Product {
                id: next_id,
                company_id: new_product.company_id,
                name_internal: new_product.name_internal,
                name_russian: new_product.name_russian,
                name_chinese: new_product.name_chinese,
                package_weight: new_product.package_weight,
                units_per_box: new_product.units_per_box,
                box_weight,
                price_per_box: new_product.price_per_box,
                unit: new_product.unit,
            })
            .await
    }

    pub async fn get_by_internal_name(&self, company_id: CompanyId, name_internal: &str) -> CoreResult<Product> {
        self.products
            .get_by_internal_name(company_id, name_internal)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("product '{name_internal}'")))
    }

    pub async fn get(&self, id: ProductId) -> CoreResult<Product> {
        self.products
            .get(id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("product {id}")))
    }

    /// No cross-company listing method exists — every call is scoped to a
    /// single tenant (`spec.md` §4.1).
    pub async fn list(&self, company_id: CompanyId) -> CoreResult<Vec<Product>> {
        self.products.list(company_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use kiosk_core::Unit;

    #[derive(Default)]
    struct InMemoryProducts {
        rows: Mutex<HashMap<i64, Product>>,
    }

    #[async_trait]
    impl ProductRepository for InMemoryProducts {
        async fn insert(&self, product: Product) -> CoreResult<Product> {
            self.rows.lock().unwrap().insert(product.id.as_i64(), product.clone());
            Ok(product)
        }

        async fn get(&self, id: ProductId) -> CoreResult<Option<Product>> {
            Ok(self.rows.lock().unwrap().get(&id.as_i64()).cloned())
        }

        async fn get_by_internal_name(&self, company_id: CompanyId, name_internal: &str) -> CoreResult<Option<Product>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .find(|p| p.company_id == company_id && p.name_internal == name_internal)
                .cloned())
        }

        async fn list(&self, company_id: CompanyId) -> CoreResult<Vec<Product>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|p| p.company_id == company_id)
                .cloned()
                .collect())
        }

        async fn update(&self, product: Product) -> CoreResult<Product> {
            self.rows.lock().unwrap().insert(product.id.as_i64(), product.clone());
            Ok(product)
        }
    }

    fn new_product(company_id: CompanyId, name: &str) -> NewProduct {
        NewProduct {
            company_id,
            name_internal: name.into(),
            name_russian: "Ванильный рожок".into(),
            name_chinese: "香草甜筒".into(),
            package_weight: 3.0,
            units_per_box: 8.0,
            price_per_box: 56000.0,
            unit: Unit::Kg,
        }
    }

    #[tokio::test]
    async fn duplicate_internal_name_is_a_conflict() {
        let svc = CatalogService::new(InMemoryProducts::default());
        let company = CompanyId::from_raw(1);
        svc.add_product(new_product(company, "vanilla_cone"), ProductId::from_raw(1))
            .await
            .unwrap();

        let err = svc
            .add_product(new_product(company, "vanilla_cone"), ProductId::from_raw(2))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn same_name_is_allowed_in_different_companies() {
        let svc = CatalogService::new(InMemoryProducts::default());
        svc.add_product(new_product(CompanyId::from_raw(1), "vanilla_cone"), ProductId::from_raw(1))
            .await
            .unwrap();
        let ok = svc
            .add_product(new_product(CompanyId::from_raw(2), "vanilla_cone"), ProductId::from_raw(2))
            .await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn list_is_scoped_to_company() {
        let svc = CatalogService::new(InMemoryProducts::default());
        let a = CompanyId::from_raw(1);
        let b = CompanyId::from_raw(2);
        svc.add_product(new_product(a, "vanilla_cone"), ProductId::from_raw(1))
            .await
            .unwrap();
        svc.add_product(new_product(b, "choco_cone"), ProductId::from_raw(2))
            .await
            .unwrap();

        let listed = svc.list(a).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name_internal, "vanilla_cone");
    }
}
