//! Postgres-backed `LedgerRepository` (`kiosk_ledger::repository`).

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use tracing::instrument;

use kiosk_core::{CompanyId, CoreResult, OrderId, ProductId};
use kiosk_ledger::{LedgerRepository, StockSnapshot, SupplyEvent};

use crate::errors::map_sqlx_error;

#[derive(Clone)]
pub struct PostgresLedgerRepository {
    pool: PgPool,
}

impl PostgresLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_snapshot(row: &sqlx::postgres::PgRow) -> sqlx::Result<StockSnapshot> {
    Ok(StockSnapshot {
        company_id: CompanyId::from_raw(row.try_get("company_id")?),
        product_id: ProductId::from_raw(row.try_get("product_id")?),
        date: row.try_get("date")?,
        quantity: row.try_get("quantity")?,
        weight: row.try_get("weight")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_supply(row: &sqlx::postgres::PgRow) -> sqlx::Result<SupplyEvent> {
    Ok(SupplyEvent {
        company_id: CompanyId::from_raw(row.try_get("company_id")?),
        product_id: ProductId::from_raw(row.try_get("product_id")?),
        date: row.try_get("date")?,
        boxes: row.try_get("boxes")?,
        weight: row.try_get("weight")?,
        cost: row.try_get("cost")?,
        order_id: row.try_get::<Option<i64>, _>("order_id")?.map(OrderId::from_raw),
    })
}

#[async_trait]
impl LedgerRepository for PostgresLedgerRepository {
    /// `ON CONFLICT (company_id, product_id, date) DO UPDATE` -- upsert on
    /// the key, last-writer-wins (`spec.md` §4.2, §5: "acceptable because
    /// snapshots are idempotent corrections").
    #[instrument(skip(self, snapshot))]
    async fn upsert_snapshot(&self, snapshot: StockSnapshot) -> CoreResult<StockSnapshot> {
        let row = sqlx::query(
            r#"
            INSERT INTO stock (company_id, product_id, date, quantity, weight, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (company_id, product_id, date) DO UPDATE SET
                quantity = EXCLUDED.quantity, weight = EXCLUDED.weight, created_at = EXCLUDED.created_at
            RETURNING company_id, product_id, date, quantity, weight, created_at
            "#,
        )
        .bind(snapshot.company_id.as_i64())
        .bind(snapshot.product_id.as_i64())
        .bind(snapshot.date)
        .bind(snapshot.quantity)
        .bind(snapshot.weight)
        .bind(snapshot.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("ledger.upsert_snapshot", e))?;

        row_to_snapshot(&row).map_err(|e| map_sqlx_error("ledger.upsert_snapshot", e))
    }

    /// Append-only for manually entered supplies (`order_id` is `NULL`):
    /// multiple rows per `(product_id, date)` permitted (`spec.md` §4.2).
    /// When `order_id` is set, the partial unique index on `(order_id,
    /// product_id)` makes this idempotent -- completing the same order
    /// twice (retry after a crash, or a losing concurrent caller) updates
    /// the existing row to the same values instead of appending a
    /// duplicate.
    #[instrument(skip(self, supply))]
    async fn insert_supply(&self, supply: SupplyEvent) -> CoreResult<SupplyEvent> {
        let row = sqlx::query(
            r#"
            INSERT INTO supplies (company_id, product_id, date, boxes, weight, cost, order_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, now())
            ON CONFLICT (order_id, product_id) WHERE order_id IS NOT NULL DO UPDATE SET
                date = EXCLUDED.date, boxes = EXCLUDED.boxes, weight = EXCLUDED.weight, cost = EXCLUDED.cost
            RETURNING company_id, product_id, date, boxes, weight, cost, order_id
            "#,
        )
        .bind(supply.company_id.as_i64())
        .bind(supply.product_id.as_i64())
        .bind(supply.date)
        .bind(supply.boxes)
        .bind(supply.weight)
        .bind(supply.cost)
        .bind(supply.order_id.map(|id| id.as_i64()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("ledger.insert_supply", e))?;

        row_to_supply(&row).map_err(|e| map_sqlx_error("ledger.insert_supply", e))
    }

    /// `DISTINCT ON (product_id) ... ORDER BY product_id, date DESC`: the
    /// row with the maximum date per product, using the `(company_id,
    /// product_id, date DESC)` index named in `spec.md` §4.2.
    #[instrument(skip(self))]
    async fn latest_snapshot_per_product(&self, company_id: CompanyId) -> CoreResult<Vec<StockSnapshot>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT ON (product_id) company_id, product_id, date, quantity, weight, created_at
            FROM stock
            WHERE company_id = $1
            ORDER BY product_id, date DESC
            "#,
        )
        .bind(company_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("ledger.latest_snapshot_per_product", e))?;

        rows.iter()
            .map(row_to_snapshot)
            .collect::<sqlx::Result<_>>()
            .map_err(|e| map_sqlx_error("ledger.latest_snapshot_per_product", e))
    }

    #[instrument(skip(self))]
    async fn snapshot_on(&self, company_id: CompanyId, date: NaiveDate) -> CoreResult<Vec<StockSnapshot>> {
        let rows = sqlx::query(
            "SELECT company_id, product_id, date, quantity, weight, created_at FROM stock WHERE company_id = $1 AND date = $2",
        )
        .bind(company_id.as_i64())
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("ledger.snapshot_on", e))?;

        rows.iter().map(row_to_snapshot).collect::<sqlx::Result<_>>().map_err(|e| map_sqlx_error("ledger.snapshot_on", e))
    }

    #[instrument(skip(self))]
    async fn latest_date_for_product(&self, company_id: CompanyId, product_id: ProductId) -> CoreResult<Option<NaiveDate>> {
        let row = sqlx::query("SELECT max(date) AS max_date FROM stock WHERE company_id = $1 AND product_id = $2")
            .bind(company_id.as_i64())
            .bind(product_id.as_i64())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("ledger.latest_date_for_product", e))?;

        row.try_get::<Option<NaiveDate>, _>("max_date")
            .map_err(|e| map_sqlx_error("ledger.latest_date_for_product", e))
    }

    #[instrument(skip(self))]
    async fn history_since(&self, company_id: CompanyId, product_id: ProductId, since: NaiveDate) -> CoreResult<Vec<StockSnapshot>> {
        let rows = sqlx::query(
            r#"
            SELECT company_id, product_id, date, quantity, weight, created_at
            FROM stock
            WHERE company_id = $1 AND product_id = $2 AND date >= $3
            ORDER BY date ASC
            "#,
        )
        .bind(company_id.as_i64())
        .bind(product_id.as_i64())
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("ledger.history_since", e))?;

        rows.iter().map(row_to_snapshot).collect::<sqlx::Result<_>>().map_err(|e| map_sqlx_error("ledger.history_since", e))
    }

    /// `start <= date <= end`: callers layer their own boundary rule on top
    /// (half-open for `supplies_between`, inclusive-start for the
    /// consumption identity's double-count guard) -- see
    /// `kiosk_ledger::LedgerRepository::supplies_in_range`.
    #[instrument(skip(self))]
    async fn supplies_in_range(
        &self,
        company_id: CompanyId,
        product_id: Option<ProductId>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CoreResult<Vec<SupplyEvent>> {
        let rows = match product_id {
            Some(product_id) => {
                sqlx::query(
                    r#"
                    SELECT company_id, product_id, date, boxes, weight, cost, order_id
                    FROM supplies
                    WHERE company_id = $1 AND product_id = $2 AND date >= $3 AND date <= $4
                    ORDER BY date ASC
                    "#,
                )
                .bind(company_id.as_i64())
                .bind(product_id.as_i64())
                .bind(start)
                .bind(end)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT company_id, product_id, date, boxes, weight, cost, order_id
                    FROM supplies
                    WHERE company_id = $1 AND date >= $2 AND date <= $3
                    ORDER BY date ASC
                    "#,
                )
                .bind(company_id.as_i64())
                .bind(start)
                .bind(end)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| map_sqlx_error("ledger.supplies_in_range", e))?;

        rows.iter().map(row_to_supply).collect::<sqlx::Result<_>>().map_err(|e| map_sqlx_error("ledger.supplies_in_range", e))
    }
}
