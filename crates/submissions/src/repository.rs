use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use kiosk_core::{CompanyId, CoreResult, SubmissionId, UserId};

use crate::{SubmissionItem, StockSubmission};

/// Persistence seam for `SubmissionQueue` (`spec.md` §4.5). Implemented
/// against Postgres by `kiosk-infra`.
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    async fn insert(&self, submission: StockSubmission, items: Vec<SubmissionItem>) -> CoreResult<(StockSubmission, Vec<SubmissionItem>)>;

    async fn get(&self, id: SubmissionId) -> CoreResult<Option<StockSubmission>>;

    async fn get_items(&self, id: SubmissionId) -> CoreResult<Vec<SubmissionItem>>;

    /// At most one pending submission per `(company, submitted_by, date)`
    /// — used to enforce `spec.md` §4.5's submit conflict rule.
    async fn find_pending(&self, company_id: CompanyId, submitted_by: UserId, date: NaiveDate) -> CoreResult<Option<StockSubmission>>;

    /// `ListPendingForCompany` (`spec.md` §6): the admin moderation queue.
    async fn list_pending_for_company(&self, company_id: CompanyId) -> CoreResult<Vec<StockSubmission>>;

    /// `UserSubmissions` (`spec.md` §6): a single employee's submission
    /// history, any status.
    async fn list_by_user(&self, submitted_by: UserId) -> CoreResult<Vec<StockSubmission>>;

    async fn set_item_edits(&self, id: SubmissionId, product_id: kiosk_core::ProductId, edited_quantity: f64, edited_weight: f64) -> CoreResult<()>;

    async fn mark_approved(&self, id: SubmissionId, reviewed_by: UserId, reviewed_at: DateTime<Utc>) -> CoreResult<()>;

    async fn mark_rejected(&self, id: SubmissionId, reviewed_by: UserId, reviewed_at: DateTime<Utc>, reason: String) -> CoreResult<()>;
}
