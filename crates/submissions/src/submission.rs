use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use kiosk_core::{CompanyId, ProductId, SubmissionId, UserId};

/// `spec.md` §4.5: pending ──approve──▶ approved (terminal, ledger upsert
/// of every item); pending ──reject──▶ rejected (terminal, requires reason).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSubmission {
    pub id: SubmissionId,
    pub company_id: CompanyId,
    pub submitted_by: UserId,
    pub submission_date: NaiveDate,
    pub status: SubmissionStatus,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<UserId>,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionItem {
    pub submission_id: SubmissionId,
    pub product_id: ProductId,
    pub quantity: f64,
    pub weight: f64,
    pub edited_quantity: Option<f64>,
    pub edited_weight: Option<f64>,
}

impl SubmissionItem {
    /// `COALESCE(edited_*, original)` — the effective value promoted into
    /// the ledger on approval (`spec.md` §3, §4.5).
    pub fn effective(&self) -> (f64, f64) {
        (
            self.edited_quantity.unwrap_or(self.quantity),
            self.edited_weight.unwrap_or(self.weight),
        )
    }
}

/// Unvalidated input to `SubmissionService::submit`.
#[derive(Debug, Clone)]
pub struct NewSubmissionItem {
    pub product_id: ProductId,
    pub quantity: f64,
}

/// `submission_summary` payload for `Notifier::on_new_submission`
/// (`SPEC_FULL.md` §12).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionSummary {
    pub submitter: UserId,
    pub submission_date: NaiveDate,
    pub item_count: usize,
    pub total_weight: f64,
}
