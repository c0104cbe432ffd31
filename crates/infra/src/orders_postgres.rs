//! Postgres-backed `OrderRepository` (`kiosk_orders::repository`).

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use kiosk_core::{CompanyId, CoreResult, OrderId, ProductId};
use kiosk_orders::{OrderItem, OrderRepository, OrderStatus, PendingOrder};

use crate::errors::map_sqlx_error;

#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn status_from_str(s: &str) -> OrderStatus {
    match s {
        "completed" => OrderStatus::Completed,
        "cancelled" => OrderStatus::Cancelled,
        _ => OrderStatus::Pending,
    }
}

fn row_to_order(row: &sqlx::postgres::PgRow) -> sqlx::Result<PendingOrder> {
    let status: String = row.try_get("status")?;
    Ok(PendingOrder {
        id: OrderId::from_raw(row.try_get("id")?),
        company_id: CompanyId::from_raw(row.try_get("company_id")?),
        created_at: row.try_get("created_at")?,
        status: status_from_str(&status),
        total_cost: row.try_get("total_cost")?,
        notes: row.try_get("notes")?,
    })
}

fn row_to_item(row: &sqlx::postgres::PgRow) -> sqlx::Result<OrderItem> {
    Ok(OrderItem {
        order_id: OrderId::from_raw(row.try_get("order_id")?),
        product_id: ProductId::from_raw(row.try_get("product_id")?),
        boxes_ordered: row.try_get("boxes_ordered")?,
        weight_ordered: row.try_get("weight_ordered")?,
        cost: row.try_get("cost")?,
    })
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    /// Opens the order and every item in one transaction so the creation is
    /// atomic (`spec.md` §4.4 `create`).
    #[instrument(skip(self, order, items))]
    async fn insert(&self, order: PendingOrder, items: Vec<OrderItem>) -> CoreResult<(PendingOrder, Vec<OrderItem>)> {
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error("order.insert", e))?;

        let order_row = sqlx::query(
            r#"
            INSERT INTO pending_orders (id, company_id, created_at, status, total_cost, notes)
            VALUES ($1, $2, $3, 'pending', $4, $5)
            RETURNING id, company_id, created_at, status, total_cost, notes
            "#,
        )
        .bind(order.id.as_i64())
        .bind(order.company_id.as_i64())
        .bind(order.created_at)
        .bind(order.total_cost)
        .bind(&order.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("order.insert", e))?;

        let mut inserted_items = Vec::with_capacity(items.len());
        for item in &items {
            let row = sqlx::query(
                r#"
                INSERT INTO pending_order_items (order_id, product_id, boxes_ordered, weight_ordered, cost)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING order_id, product_id, boxes_ordered, weight_ordered, cost
                "#,
            )
            .bind(item.order_id.as_i64())
            .bind(item.product_id.as_i64())
            .bind(item.boxes_ordered)
            .bind(item.weight_ordered)
            .bind(item.cost)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("order.insert_item", e))?;
            inserted_items.push(row_to_item(&row).map_err(|e| map_sqlx_error("order.insert_item", e))?);
        }

        tx.commit().await.map_err(|e| map_sqlx_error("order.insert", e))?;

        let order = row_to_order(&order_row).map_err(|e| map_sqlx_error("order.insert", e))?;
        Ok((order, inserted_items))
    }

    #[instrument(skip(self))]
    async fn get(&self, id: OrderId) -> CoreResult<Option<PendingOrder>> {
        let row = sqlx::query("SELECT id, company_id, created_at, status, total_cost, notes FROM pending_orders WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("order.get", e))?;

        row.map(|r| row_to_order(&r)).transpose().map_err(|e| map_sqlx_error("order.get", e))
    }

    #[instrument(skip(self))]
    async fn get_items(&self, id: OrderId) -> CoreResult<Vec<OrderItem>> {
        let rows = sqlx::query("SELECT order_id, product_id, boxes_ordered, weight_ordered, cost FROM pending_order_items WHERE order_id = $1")
            .bind(id.as_i64())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("order.get_items", e))?;

        rows.iter().map(row_to_item).collect::<sqlx::Result<_>>().map_err(|e| map_sqlx_error("order.get_items", e))
    }

    #[instrument(skip(self))]
    async fn list_pending(&self, company_id: CompanyId) -> CoreResult<Vec<PendingOrder>> {
        let rows = sqlx::query(
            "SELECT id, company_id, created_at, status, total_cost, notes FROM pending_orders WHERE company_id = $1 AND status = 'pending' ORDER BY created_at",
        )
        .bind(company_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("order.list_pending", e))?;

        rows.iter().map(row_to_order).collect::<sqlx::Result<_>>().map_err(|e| map_sqlx_error("order.list_pending", e))
    }

    /// `notes` is never touched here -- it survives the transition unchanged
    /// (`SPEC_FULL.md` §12, "order notes on completion are preserved"). The
    /// `status = 'pending'` predicate (`spec.md` §5) means a losing
    /// concurrent caller updates zero rows; that is surfaced as a
    /// `Conflict` rather than a silent no-op so a caller that already
    /// re-checked via `prepare_complete` doesn't assume success.
    #[instrument(skip(self))]
    async fn mark_completed(&self, id: OrderId) -> CoreResult<()> {
        let result = sqlx::query("UPDATE pending_orders SET status = 'completed' WHERE id = $1 AND status = 'pending'")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("order.mark_completed", e))?;
        if result.rows_affected() == 0 {
            return Err(kiosk_core::CoreError::conflict(format!("order {id} is no longer pending")));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn mark_cancelled(&self, id: OrderId) -> CoreResult<()> {
        let result = sqlx::query("UPDATE pending_orders SET status = 'cancelled' WHERE id = $1 AND status = 'pending'")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("order.mark_cancelled", e))?;
        if result.rows_affected() == 0 {
            return Err(kiosk_core::CoreError::conflict(format!("order {id} is no longer pending")));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn in_transit_weight(&self, company_id: CompanyId, product_id: ProductId) -> CoreResult<f64> {
        let row = sqlx::query(
            r#"
            SELECT coalesce(sum(i.weight_ordered), 0.0) AS total
            FROM pending_order_items i
            JOIN pending_orders o ON o.id = i.order_id
            WHERE o.company_id = $1 AND o.status = 'pending' AND i.product_id = $2
            "#,
        )
        .bind(company_id.as_i64())
        .bind(product_id.as_i64())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("order.in_transit_weight", e))?;

        row.try_get::<f64, _>("total").map_err(|e| map_sqlx_error("order.in_transit_weight", e))
    }
}
