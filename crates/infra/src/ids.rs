//! `Catalog::add_product`, `OrderBook::create`, and `SubmissionQueue::submit`
//! all take a caller-resolved id rather than generating one themselves (see
//! e.g. `kiosk_catalog::CatalogService::add_product`'s `next_id` parameter) —
//! unlike `Company`, whose id is assigned by the database on insert. The
//! facade resolves these ids from the same `BIGSERIAL` sequence Postgres
//! would have used anyway, via `nextval`, so a caller-assigned id and a
//! database-assigned one draw from the same id space.

use sqlx::PgPool;

use kiosk_core::{CoreResult, OrderId, ProductId, SubmissionId};

use crate::errors::map_sqlx_error;

async fn nextval(pool: &PgPool, sequence: &str) -> CoreResult<i64> {
    sqlx::query_scalar::<_, i64>("SELECT nextval($1)")
        .bind(sequence)
        .fetch_one(pool)
        .await
        .map_err(|e| map_sqlx_error("ids.nextval", e))
}

pub async fn next_product_id(pool: &PgPool) -> CoreResult<ProductId> {
    nextval(pool, "products_id_seq").await.map(ProductId::from_raw)
}

pub async fn next_order_id(pool: &PgPool) -> CoreResult<OrderId> {
    nextval(pool, "pending_orders_id_seq").await.map(OrderId::from_raw)
}

pub async fn next_submission_id(pool: &PgPool) -> CoreResult<SubmissionId> {
    nextval(pool, "pending_stock_submissions_id_seq").await.map(SubmissionId::from_raw)
}
