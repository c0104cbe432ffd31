//! Concrete `Notifier` (`spec.md` §4.5) implementations. Delivery is
//! best-effort: failures are logged, never propagated, per the port's
//! contract in `kiosk-submissions`.

use async_trait::async_trait;

use kiosk_core::{CompanyId, UserId};
use kiosk_submissions::{Notifier, SubmissionSummary};

/// Logs the new-submission event at `info` instead of delivering it
/// anywhere — the default until a real channel (Telegram, email, webhook)
/// is wired in. Never fails.
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn on_new_submission(&self, company_id: CompanyId, summary: &SubmissionSummary, admin_ids: &[UserId]) {
        tracing::info!(
            company_id = %company_id,
            submitter = %summary.submitter,
            submission_date = %summary.submission_date,
            item_count = summary.item_count,
            total_weight = summary.total_weight,
            admin_count = admin_ids.len(),
            "new stock submission awaiting review"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn logging_notifier_never_panics_on_empty_admins() {
        let notifier = LoggingNotifier;
        let summary = SubmissionSummary {
            submitter: UserId::from_raw(1),
            submission_date: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            item_count: 2,
            total_weight: 12.0,
        };
        notifier.on_new_submission(CompanyId::from_raw(1), &summary, &[]).await;
    }
}
