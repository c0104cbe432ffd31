//! Postgres-backed `ProductRepository` (`kiosk_catalog::repository`).

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use kiosk_catalog::{Product, ProductRepository};
use kiosk_core::{CompanyId, CoreResult, ProductId, Unit};

use crate::errors::map_sqlx_error;

#[derive(Clone)]
pub struct PostgresProductRepository {
    pool: PgPool,
}

impl PostgresProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_product(row: &sqlx::postgres::PgRow) -> sqlx::Result<Product> {
    let unit: String = row.try_get("unit")?;
    Ok(Product {
        id: ProductId::from_raw(row.try_get("id")?),
        company_id: CompanyId::from_raw(row.try_get("company_id")?),
        name_internal: row.try_get("name_internal")?,
        name_russian: row.try_get("name_russian")?,
        name_chinese: row.try_get("name_chinese")?,
        package_weight: row.try_get("package_weight")?,
        units_per_box: row.try_get("units_per_box")?,
        box_weight: row.try_get("box_weight")?,
        price_per_box: row.try_get("price_per_box")?,
        unit: Unit::from_db_str(&unit).unwrap_or(Unit::Kg),
    })
}

const SELECT_COLUMNS: &str =
    "id, company_id, name_internal, name_russian, name_chinese, package_weight, units_per_box, box_weight, price_per_box, unit";

#[async_trait]
impl ProductRepository for PostgresProductRepository {
    /// `product.id` is caller-assigned (`CatalogService::add_product`
    /// resolves `next_id` before calling in); the row's real primary key is
    /// still `BIGSERIAL`, so this inserts the given id explicitly rather
    /// than letting Postgres generate one.
    #[instrument(skip(self, product))]
    async fn insert(&self, product: Product) -> CoreResult<Product> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO products (id, company_id, name_internal, name_russian, name_chinese, package_weight, units_per_box, box_weight, price_per_box, unit, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, now())
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(product.id.as_i64())
        .bind(product.company_id.as_i64())
        .bind(&product.name_internal)
        .bind(&product.name_russian)
        .bind(&product.name_chinese)
        .bind(product.package_weight)
        .bind(product.units_per_box)
        .bind(product.box_weight)
        .bind(product.price_per_box)
        .bind(product.unit.as_db_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("product.insert", e))?;

        row_to_product(&row).map_err(|e| map_sqlx_error("product.insert", e))
    }

    #[instrument(skip(self))]
    async fn get(&self, id: ProductId) -> CoreResult<Option<Product>> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("product.get", e))?;

        row.map(|r| row_to_product(&r)).transpose().map_err(|e| map_sqlx_error("product.get", e))
    }

    #[instrument(skip(self))]
    async fn get_by_internal_name(&self, company_id: CompanyId, name_internal: &str) -> CoreResult<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM products WHERE company_id = $1 AND name_internal = $2"
        ))
        .bind(company_id.as_i64())
        .bind(name_internal)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("product.get_by_internal_name", e))?;

        row.map(|r| row_to_product(&r)).transpose().map_err(|e| map_sqlx_error("product.get_by_internal_name", e))
    }

    /// No cross-company listing method exists at this layer (`spec.md`
    /// §4.1) -- every query here takes `company_id`.
    #[instrument(skip(self))]
    async fn list(&self, company_id: CompanyId) -> CoreResult<Vec<Product>> {
        let rows = sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM products WHERE company_id = $1 ORDER BY id"))
            .bind(company_id.as_i64())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("product.list", e))?;

        rows.iter().map(row_to_product).collect::<sqlx::Result<_>>().map_err(|e| map_sqlx_error("product.list", e))
    }

    #[instrument(skip(self, product))]
    async fn update(&self, product: Product) -> CoreResult<Product> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE products SET
                name_russian = $2, name_chinese = $3, package_weight = $4,
                units_per_box = $5, box_weight = $6, price_per_box = $7, unit = $8
            WHERE id = $1
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(product.id.as_i64())
        .bind(&product.name_russian)
        .bind(&product.name_chinese)
        .bind(product.package_weight)
        .bind(product.units_per_box)
        .bind(product.box_weight)
        .bind(product.price_per_box)
        .bind(product.unit.as_db_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("product.update", e))?;

        row_to_product(&row).map_err(|e| map_sqlx_error("product.update", e))
    }
}
