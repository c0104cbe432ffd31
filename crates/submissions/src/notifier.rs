use async_trait::async_trait;

use kiosk_core::{CompanyId, UserId};

use crate::SubmissionSummary;

/// Port for the "new submission" notification (`spec.md` §4.5). Best-effort:
/// implementations must not let a delivery failure fail the submission —
/// they log and swallow their own errors.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn on_new_submission(&self, company_id: CompanyId, summary: &SubmissionSummary, admin_ids: &[UserId]);
}

/// A notifier that does nothing. Useful for tests and for tenants with no
/// configured delivery channel.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn on_new_submission(&self, _company_id: CompanyId, _summary: &SubmissionSummary, _admin_ids: &[UserId]) {}
}
