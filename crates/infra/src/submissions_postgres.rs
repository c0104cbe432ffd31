//! Postgres-backed `SubmissionRepository` (`kiosk_submissions::repository`).

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;

use kiosk_core::{CompanyId, CoreResult, ProductId, SubmissionId, UserId};
use kiosk_submissions::{SubmissionItem, SubmissionRepository, SubmissionStatus, StockSubmission};

use crate::errors::map_sqlx_error;

#[derive(Clone)]
pub struct PostgresSubmissionRepository {
    pool: PgPool,
}

impl PostgresSubmissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn status_from_str(s: &str) -> SubmissionStatus {
    match s {
        "approved" => SubmissionStatus::Approved,
        "rejected" => SubmissionStatus::Rejected,
        _ => SubmissionStatus::Pending,
    }
}

fn row_to_submission(row: &sqlx::postgres::PgRow) -> sqlx::Result<StockSubmission> {
    let status: String = row.try_get("status")?;
    let reviewed_by: Option<i64> = row.try_get("reviewed_by")?;
    Ok(StockSubmission {
        id: SubmissionId::from_raw(row.try_get("id")?),
        company_id: CompanyId::from_raw(row.try_get("company_id")?),
        submitted_by: UserId::from_raw(row.try_get("submitted_by")?),
        submission_date: row.try_get("submission_date")?,
        status: status_from_str(&status),
        created_at: row.try_get("created_at")?,
        reviewed_at: row.try_get("reviewed_at")?,
        reviewed_by: reviewed_by.map(UserId::from_raw),
        rejection_reason: row.try_get("rejection_reason")?,
    })
}

fn row_to_item(row: &sqlx::postgres::PgRow) -> sqlx::Result<SubmissionItem> {
    Ok(SubmissionItem {
        submission_id: SubmissionId::from_raw(row.try_get("submission_id")?),
        product_id: ProductId::from_raw(row.try_get("product_id")?),
        quantity: row.try_get("quantity")?,
        weight: row.try_get("weight")?,
        edited_quantity: row.try_get("edited_quantity")?,
        edited_weight: row.try_get("edited_weight")?,
    })
}

const SUBMISSION_COLUMNS: &str =
    "id, company_id, submitted_by, submission_date, status, created_at, reviewed_at, reviewed_by, rejection_reason";

#[async_trait]
impl SubmissionRepository for PostgresSubmissionRepository {
    /// One transaction for the submission row and every item
    /// (`spec.md` §4.5 `submit`). The partial unique index on `(company_id,
    /// submitted_by, submission_date) WHERE status = 'pending'` is the
    /// database-level backstop for the "at most one pending submission"
    /// invariant; a concurrent double-submit surfaces here as a unique
    /// violation, mapped to `Conflict` by `map_sqlx_error`.
    #[instrument(skip(self, submission, items))]
    async fn insert(&self, submission: StockSubmission, items: Vec<SubmissionItem>) -> CoreResult<(StockSubmission, Vec<SubmissionItem>)> {
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error("submission.insert", e))?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO pending_stock_submissions (id, company_id, submitted_by, submission_date, status, created_at, reviewed_at, reviewed_by, rejection_reason)
            VALUES ($1, $2, $3, $4, 'pending', $5, NULL, NULL, NULL)
            RETURNING {SUBMISSION_COLUMNS}
            "#
        ))
        .bind(submission.id.as_i64())
        .bind(submission.company_id.as_i64())
        .bind(submission.submitted_by.as_i64())
        .bind(submission.submission_date)
        .bind(submission.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("submission.insert", e))?;

        let mut inserted_items = Vec::with_capacity(items.len());
        for item in &items {
            let item_row = sqlx::query(
                r#"
                INSERT INTO pending_stock_items (submission_id, product_id, quantity, weight, edited_quantity, edited_weight)
                VALUES ($1, $2, $3, $4, NULL, NULL)
                RETURNING submission_id, product_id, quantity, weight, edited_quantity, edited_weight
                "#,
            )
            .bind(item.submission_id.as_i64())
            .bind(item.product_id.as_i64())
            .bind(item.quantity)
            .bind(item.weight)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("submission.insert_item", e))?;
            inserted_items.push(row_to_item(&item_row).map_err(|e| map_sqlx_error("submission.insert_item", e))?);
        }

        tx.commit().await.map_err(|e| map_sqlx_error("submission.insert", e))?;

        let submission = row_to_submission(&row).map_err(|e| map_sqlx_error("submission.insert", e))?;
        Ok((submission, inserted_items))
    }

    #[instrument(skip(self))]
    async fn get(&self, id: SubmissionId) -> CoreResult<Option<StockSubmission>> {
        let row = sqlx::query(&format!("SELECT {SUBMISSION_COLUMNS} FROM pending_stock_submissions WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("submission.get", e))?;

        row.map(|r| row_to_submission(&r)).transpose().map_err(|e| map_sqlx_error("submission.get", e))
    }

    #[instrument(skip(self))]
    async fn get_items(&self, id: SubmissionId) -> CoreResult<Vec<SubmissionItem>> {
        let rows = sqlx::query(
            "SELECT submission_id, product_id, quantity, weight, edited_quantity, edited_weight FROM pending_stock_items WHERE submission_id = $1",
        )
        .bind(id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("submission.get_items", e))?;

        rows.iter().map(row_to_item).collect::<sqlx::Result<_>>().map_err(|e| map_sqlx_error("submission.get_items", e))
    }

    #[instrument(skip(self))]
    async fn find_pending(&self, company_id: CompanyId, submitted_by: UserId, date: NaiveDate) -> CoreResult<Option<StockSubmission>> {
        let row = sqlx::query(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM pending_stock_submissions WHERE company_id = $1 AND submitted_by = $2 AND submission_date = $3 AND status = 'pending'"
        ))
        .bind(company_id.as_i64())
        .bind(submitted_by.as_i64())
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("submission.find_pending", e))?;

        row.map(|r| row_to_submission(&r)).transpose().map_err(|e| map_sqlx_error("submission.find_pending", e))
    }

    #[instrument(skip(self))]
    async fn list_pending_for_company(&self, company_id: CompanyId) -> CoreResult<Vec<StockSubmission>> {
        let rows = sqlx::query(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM pending_stock_submissions WHERE company_id = $1 AND status = 'pending' ORDER BY created_at"
        ))
        .bind(company_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("submission.list_pending_for_company", e))?;

        rows.iter()
            .map(row_to_submission)
            .collect::<sqlx::Result<_>>()
            .map_err(|e| map_sqlx_error("submission.list_pending_for_company", e))
    }

    #[instrument(skip(self))]
    async fn list_by_user(&self, submitted_by: UserId) -> CoreResult<Vec<StockSubmission>> {
        let rows = sqlx::query(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM pending_stock_submissions WHERE submitted_by = $1 ORDER BY created_at DESC"
        ))
        .bind(submitted_by.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("submission.list_by_user", e))?;

        rows.iter()
            .map(row_to_submission)
            .collect::<sqlx::Result<_>>()
            .map_err(|e| map_sqlx_error("submission.list_by_user", e))
    }

    #[instrument(skip(self))]
    async fn set_item_edits(&self, id: SubmissionId, product_id: ProductId, edited_quantity: f64, edited_weight: f64) -> CoreResult<()> {
        let result = sqlx::query(
            "UPDATE pending_stock_items SET edited_quantity = $3, edited_weight = $4 WHERE submission_id = $1 AND product_id = $2",
        )
        .bind(id.as_i64())
        .bind(product_id.as_i64())
        .bind(edited_quantity)
        .bind(edited_weight)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("submission.set_item_edits", e))?;

        if result.rows_affected() == 0 {
            return Err(kiosk_core::CoreError::not_found("submission item"));
        }
        Ok(())
    }

    /// `WHERE status = 'pending'` (`spec.md` §5): a losing concurrent
    /// approval/rejection updates zero rows and is surfaced as `Conflict`.
    #[instrument(skip(self))]
    async fn mark_approved(&self, id: SubmissionId, reviewed_by: UserId, reviewed_at: DateTime<Utc>) -> CoreResult<()> {
        let result = sqlx::query(
            "UPDATE pending_stock_submissions SET status = 'approved', reviewed_by = $2, reviewed_at = $3 WHERE id = $1 AND status = 'pending'",
        )
        .bind(id.as_i64())
        .bind(reviewed_by.as_i64())
        .bind(reviewed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("submission.mark_approved", e))?;

        if result.rows_affected() == 0 {
            return Err(kiosk_core::CoreError::conflict(format!("submission {id} is no longer pending")));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn mark_rejected(&self, id: SubmissionId, reviewed_by: UserId, reviewed_at: DateTime<Utc>, reason: String) -> CoreResult<()> {
        let result = sqlx::query(
            "UPDATE pending_stock_submissions SET status = 'rejected', reviewed_by = $2, reviewed_at = $3, rejection_reason = $4 WHERE id = $1 AND status = 'pending'",
        )
        .bind(id.as_i64())
        .bind(reviewed_by.as_i64())
        .bind(reviewed_at)
        .bind(reason)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("submission.mark_rejected", e))?;

        if result.rows_affected() == 0 {
            return Err(kiosk_core::CoreError::conflict(format!("submission {id} is no longer pending")));
        }
        Ok(())
    }
}
