use chrono::{DateTime, NaiveDate, Utc};

use kiosk_access::{authorize, Action, Principal};
use kiosk_catalog::ProductRepository;
use kiosk_core::{CompanyId, CoreError, CoreResult, ProductId, SubmissionId, UserId};
use kiosk_ledger::{LedgerRepository, StockSnapshot};

use crate::notifier::Notifier;
use crate::{NewSubmissionItem, SubmissionItem, SubmissionRepository, SubmissionStatus, SubmissionSummary, StockSubmission};

/// `SubmissionQueue` (`spec.md` §4.5): employee-submitted stock counts and
/// their admin-moderated promotion into the `Ledger`. Depends on `Ledger`
/// and `AccessPolicy`.
pub struct SubmissionService<R, L, P, N> {
    submissions: R,
    ledger: L,
    products: P,
    notifier: N,
}

impl<R, L, P, N> SubmissionService<R, L, P, N>
where
    R: SubmissionRepository,
    L: LedgerRepository,
    P: ProductRepository,
    N: Notifier,
{
    pub fn new(submissions: R, ledger: L, products: P, notifier: N) -> Self {
        Self {
            submissions,
            ledger,
            products,
            notifier,
        }
    }

    /// Rejects a second pending submission from the same user for the same
    /// date (`spec.md` §4.5, §8 scenario S6). Sends the new-submission
    /// notification to `admin_ids` (derived by the caller via
    /// `TenantStoreService::admins_of`, since this crate does not depend on
    /// `TenantStore`).
    pub async fn submit(
        &self,
        id: SubmissionId,
        actor: &Principal,
        company_id: CompanyId,
        date: NaiveDate,
        items: Vec<NewSubmissionItem>,
        admin_ids: &[UserId],
        now: DateTime<Utc>,
    ) -> CoreResult<(StockSubmission, Vec<SubmissionItem>)> {
        authorize(actor, Action::LedgerWriteSnapshotViaSubmission, company_id)
            .map_err(|e| CoreError::forbidden(e.to_string()))?;
        if items.is_empty() {
            return Err(CoreError::validation("a submission must have at least one item"));
        }

        if self
            .submissions
            .find_pending(company_id, actor.user_id, date)
            .await?
            .is_some()
        {
            return Err(CoreError::conflict(format!(
                "user {} already has a pending submission for {date}",
                actor.user_id
            )));
        }

        let mut resolved = Vec::with_capacity(items.len());
        let mut total_weight = 0.0;
        for item in items {
            if item.quantity <= 0.0 {
                return Err(CoreError::validation("quantity must be positive"));
            }
            let product = self
                .products
                .get(item.product_id)
                .await?
                .ok_or_else(|| CoreError::not_found(format!("product {}", item.product_id)))?;
            if product.company_id != company_id {
                return Err(CoreError::forbidden("product belongs to a different company"));
            }
            let weight = item.quantity * product.package_weight;
            total_weight += weight;
            resolved.push(SubmissionItem {
                submission_id: id,
                product_id: item.product_id,
                quantity: item.quantity,
                weight,
                edited_quantity: None,
                edited_weight: None,
            });
        }

        let submission = StockSubmission {
            id,
            company_id,
            submitted_by: actor.user_id,
            submission_date: date,
            status: SubmissionStatus::Pending,
            created_at: now,
            reviewed_at: None,
            reviewed_by: None,
            rejection_reason: None,
        };
        let (submission, items) = self.submissions.insert(submission, resolved).await?;

        let summary = SubmissionSummary {
            submitter: submission.submitted_by,
            submission_date: submission.submission_date,
            item_count: items.len(),
            total_weight,
        };
        self.notifier.on_new_submission(company_id, &summary, admin_ids).await;

        Ok((submission, items))
    }

    /// Permitted only while pending.
    pub async fn edit_item(
        &self,
        actor: &Principal,
        submission_id: SubmissionId,
        product_id: ProductId,
        edited_quantity: f64,
        edited_weight: f64,
    ) -> CoreResult<()> {
        let submission = self.get_submission(submission_id).await?;
        authorize(actor, Action::SubmissionReview, submission.company_id)
            .map_err(|e| CoreError::forbidden(e.to_string()))?;
        if submission.status != SubmissionStatus::Pending {
            return Err(CoreError::conflict(format!(
                "submission {submission_id} is not pending and cannot be edited"
            )));
        }
        self.submissions
            .set_item_edits(submission_id, product_id, edited_quantity, edited_weight)
            .await
    }

    /// Upserts a `StockSnapshot` per item using `COALESCE(edited, original)`
    /// keyed by `(company, product, submission_date)`, then transitions to
    /// approved. Returns the submitter's id for notification.
    ///
    /// Approving an already-approved submission is a `Conflict`, not a
    /// second application (`spec.md` §8).
    pub async fn approve(&self, actor: &Principal, submission_id: SubmissionId, now: DateTime<Utc>) -> CoreResult<UserId> {
        let submission = self.get_submission(submission_id).await?;
        authorize(actor, Action::SubmissionReview, submission.company_id)
            .map_err(|e| CoreError::forbidden(e.to_string()))?;
        if submission.status != SubmissionStatus::Pending {
            return Err(CoreError::conflict(format!(
                "submission {submission_id} is not pending and cannot be approved"
            )));
        }

        let items = self.submissions.get_items(submission_id).await?;
        for item in &items {
            let (quantity, weight) = item.effective();
            self.ledger
                .upsert_snapshot(StockSnapshot {
                    company_id: submission.company_id,
                    product_id: item.product_id,
                    date: submission.submission_date,
                    quantity,
                    weight,
                    created_at: now,
                })
                .await?;
        }

        self.submissions.mark_approved(submission_id, actor.user_id, now).await?;
        Ok(submission.submitted_by)
    }

    /// Requires a non-empty reason. Returns the submitter's id for
    /// notification.
    pub async fn reject(&self, actor: &Principal, submission_id: SubmissionId, reason: String, now: DateTime<Utc>) -> CoreResult<UserId> {
        if reason.trim().is_empty() {
            return Err(CoreError::validation("rejection reason must not be empty"));
        }
        let submission = self.get_submission(submission_id).await?;
        authorize(actor, Action::SubmissionReview, submission.company_id)
            .map_err(|e| CoreError::forbidden(e.to_string()))?;
        if submission.status != SubmissionStatus::Pending {
            return Err(CoreError::conflict(format!(
                "submission {submission_id} is not pending and cannot be rejected"
            )));
        }
        self.submissions
            .mark_rejected(submission_id, actor.user_id, now, reason)
            .await?;
        Ok(submission.submitted_by)
    }

    pub async fn get_submission(&self, id: SubmissionId) -> CoreResult<StockSubmission> {
        self.submissions
            .get(id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("submission {id}")))
    }

    pub async fn get_items(&self, id: SubmissionId) -> CoreResult<Vec<SubmissionItem>> {
        self.submissions.get_items(id).await
    }

    pub async fn list_pending_for_company(&self, company_id: CompanyId) -> CoreResult<Vec<StockSubmission>> {
        self.submissions.list_pending_for_company(company_id).await
    }

    pub async fn user_submissions(&self, submitted_by: UserId) -> CoreResult<Vec<StockSubmission>> {
        self.submissions.list_by_user(submitted_by).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use kiosk_catalog::Product;
    use kiosk_core::{Role, Unit};
    use kiosk_ledger::SupplyEvent;

    #[derive(Default)]
    struct InMemorySubmissions {
        rows: Mutex<HashMap<i64, StockSubmission>>,
        items: Mutex<HashMap<i64, Vec<SubmissionItem>>>,
    }

    #[async_trait]
    impl SubmissionRepository for InMemorySubmissions {
        async fn insert(&self, submission: StockSubmission, items: Vec<SubmissionItem>) -> CoreResult<(StockSubmission, Vec<SubmissionItem>)> {
            self.rows.lock().unwrap().insert(submission.id.as_i64(), submission.clone());
            self.items.lock().unwrap().insert(submission.id.as_i64(), items.clone());
            Ok((submission, items))
        }

        async fn get(&self, id: SubmissionId) -> CoreResult<Option<StockSubmission>> {
            Ok(self.rows.lock().unwrap().get(&id.as_i64()).cloned())
        }

        async fn get_items(&self, id: SubmissionId) -> CoreResult<Vec<SubmissionItem>> {
            Ok(self.items.lock().unwrap().get(&id.as_i64()).cloned().unwrap_or_default())
        }

        async fn find_pending(&self, company_id: CompanyId, submitted_by: UserId, date: NaiveDate) -> CoreResult<Option<StockSubmission>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .find(|s| {
                    s.company_id == company_id
                        && s.submitted_by == submitted_by
                        && s.submission_date == date
                        && s.status == SubmissionStatus::Pending
                })
                .cloned())
        }

        async fn set_item_edits(&self, id: SubmissionId, product_id: ProductId, edited_quantity: f64, edited_weight: f64) -> CoreResult<()> {
            let mut items = self.items.lock().unwrap();
            let row = items
                .get_mut(&id.as_i64())
                .and_then(|v| v.iter_mut().find(|i| i.product_id == product_id))
                .ok_or_else(|| CoreError::not_found("submission item"))?;
            row.edited_quantity = Some(edited_quantity);
            row.edited_weight = Some(edited_weight);
            Ok(())
        }

        async fn mark_approved(&self, id: SubmissionId, reviewed_by: UserId, reviewed_at: DateTime<Utc>) -> CoreResult<()> {
            let mut rows = self.rows.lock().unwrap();
            let row = rows.get_mut(&id.as_i64()).ok_or_else(|| CoreError::not_found("row"))?;
            row.status = SubmissionStatus::Approved;
            row.reviewed_by = Some(reviewed_by);
            row.reviewed_at = Some(reviewed_at);
            Ok(())
        }

        async fn mark_rejected(&self, id: SubmissionId, reviewed_by: UserId, reviewed_at: DateTime<Utc>, reason: String) -> CoreResult<()> {
            let mut rows = self.rows.lock().unwrap();
            let row = rows.get_mut(&id.as_i64()).ok_or_else(|| CoreError::not_found("row"))?;
            row.status = SubmissionStatus::Rejected;
            row.reviewed_by = Some(reviewed_by);
            row.reviewed_at = Some(reviewed_at);
            row.rejection_reason = Some(reason);
            Ok(())
        }

        async fn list_pending_for_company(&self, company_id: CompanyId) -> CoreResult<Vec<StockSubmission>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|s| s.company_id == company_id && s.status == SubmissionStatus::Pending)
                .cloned()
                .collect())
        }

        async fn list_by_user(&self, submitted_by: UserId) -> CoreResult<Vec<StockSubmission>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|s| s.submitted_by == submitted_by)
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    struct InMemoryLedger {
        snapshots: Mutex<Vec<StockSnapshot>>,
    }

    #[async_trait]
    impl LedgerRepository for InMemoryLedger {
        async fn upsert_snapshot(&self, snapshot: StockSnapshot) -> CoreResult<StockSnapshot> {
            let mut rows = self.snapshots.lock().unwrap();
            rows.retain(|s| !(s.company_id == snapshot.company_id && s.product_id == snapshot.product_id && s.date == snapshot.date));
            rows.push(snapshot.clone());
            Ok(snapshot)
        }
        async fn insert_supply(&self, supply: SupplyEvent) -> CoreResult<SupplyEvent> {
            Ok(supply)
        }
        async fn latest_snapshot_per_product(&self, _company_id: CompanyId) -> CoreResult<Vec<StockSnapshot>> {
            Ok(self.snapshots.lock().unwrap().clone())
        }
        async fn snapshot_on(&self, _company_id: CompanyId, _date: NaiveDate) -> CoreResult<Vec<StockSnapshot>> {
            Ok(self.snapshots.lock().unwrap().clone())
        }
        async fn latest_date_for_product(&self, _company_id: CompanyId, _product_id: ProductId) -> CoreResult<Option<NaiveDate>> {
            Ok(None)
        }
        async fn history_since(&self, _company_id: CompanyId, _product_id: ProductId, _since: NaiveDate) -> CoreResult<Vec<StockSnapshot>> {
            Ok(Vec::new())
        }
        async fn supplies_in_range(&self, _company_id: CompanyId, _product_id: Option<ProductId>, _start: NaiveDate, _end: NaiveDate) -> CoreResult<Vec<SupplyEvent>> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct InMemoryProducts {
        rows: Mutex<HashMap<i64, Product>>,
    }

    impl InMemoryProducts {
        fn seed(&self, product: Product) {
            self.rows.lock().unwrap().insert(product.id.as_i64(), product);
        }
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
        async fn get_by_internal_name(&self, _company_id: CompanyId, _name: &str) -> CoreResult<Option<Product>> {
            unimplemented!("not exercised by these tests")
        }
        async fn list(&self, _company_id: CompanyId) -> CoreResult<Vec<Product>> {
            unimplemented!("not exercised by these tests")
        }
        async fn update(&self, product: Product) -> CoreResult<Product> {
            self.rows.lock().unwrap().insert(product.id.as_i64(), product.clone());
            Ok(product)
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        calls: Mutex<Vec<(CompanyId, SubmissionSummary, Vec<UserId>)>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn on_new_submission(&self, company_id: CompanyId, summary: &SubmissionSummary, admin_ids: &[UserId]) {
            self.calls.lock().unwrap().push((company_id, summary.clone(), admin_ids.to_vec()));
        }
    }

    fn product(company_id: CompanyId, id: i64) -> Product {
        Product {
            id: ProductId::from_raw(id),
            company_id,
            name_internal: format!("product_{id}"),
            name_russian: "Товар".into(),
            name_chinese: "商品".into(),
            package_weight: 1.0,
            units_per_box: 8.0,
            box_weight: 8.0,
            price_per_box: 1000.0,
            unit: Unit::Kg,
        }
    }

    fn employee(company_id: CompanyId) -> Principal {
        Principal {
            user_id: UserId::from_raw(10),
            role: Role::Employee,
            company_id: Some(company_id),
        }
    }

    fn admin(company_id: CompanyId) -> Principal {
        Principal {
            user_id: UserId::from_raw(1),
            role: Role::Admin,
            company_id: Some(company_id),
        }
    }

    type Svc = SubmissionService<InMemorySubmissions, InMemoryLedger, InMemoryProducts, RecordingNotifier>;

    fn service(company_id: CompanyId) -> Svc {
        let products = InMemoryProducts::default();
        products.seed(product(company_id, 1));
        products.seed(product(company_id, 2));
        SubmissionService::new(InMemorySubmissions::default(), InMemoryLedger::default(), products, RecordingNotifier::default())
    }

    #[tokio::test]
    async fn second_pending_submission_same_day_is_conflict() {
        let company = CompanyId::from_raw(1);
        let svc = service(company);
        let date = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        svc.submit(
            SubmissionId::from_raw(1),
            &employee(company),
            company,
            date,
            vec![NewSubmissionItem { product_id: ProductId::from_raw(1), quantity: 4.0 }],
            &[],
            Utc::now(),
        )
        .await
        .unwrap();

        let err = svc
            .submit(
                SubmissionId::from_raw(2),
                &employee(company),
                company,
                date,
                vec![NewSubmissionItem { product_id: ProductId::from_raw(1), quantity: 5.0 }],
                &[],
                Utc::now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn approve_uses_edited_values_and_is_not_reapplicable() {
        let company = CompanyId::from_raw(1);
        let svc = service(company);
        let date = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        let (submission, _) = svc
            .submit(
                SubmissionId::from_raw(1),
                &employee(company),
                company,
                date,
                vec![
                    NewSubmissionItem { product_id: ProductId::from_raw(1), quantity: 4.0 },
                    NewSubmissionItem { product_id: ProductId::from_raw(2), quantity: 8.0 },
                ],
                &[UserId::from_raw(1)],
                Utc::now(),
            )
            .await
            .unwrap();

        svc.edit_item(&admin(company), submission.id, ProductId::from_raw(2), 10.0, 10.0)
            .await
            .unwrap();
        svc.approve(&admin(company), submission.id, Utc::now()).await.unwrap();

        let snapshots = svc.ledger.snapshots.lock().unwrap();
        let p2 = snapshots.iter().find(|s| s.product_id == ProductId::from_raw(2)).unwrap();
        assert_eq!(p2.quantity, 10.0);

        let err = svc.approve(&admin(company), submission.id, Utc::now()).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn reject_requires_nonempty_reason() {
        let company = CompanyId::from_raw(1);
        let svc = service(company);
        let (submission, _) = svc
            .submit(
                SubmissionId::from_raw(1),
                &employee(company),
                company,
                NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
                vec![NewSubmissionItem { product_id: ProductId::from_raw(1), quantity: 4.0 }],
                &[],
                Utc::now(),
            )
            .await
            .unwrap();

        let err = svc.reject(&admin(company), submission.id, String::new(), Utc::now()).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn cross_tenant_submit_is_forbidden() {
        let company = CompanyId::from_raw(1);
        let other = CompanyId::from_raw(2);
        let svc = service(company);
        let err = svc
            .submit(
                SubmissionId::from_raw(1),
                &employee(other),
                company,
                NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
                vec![NewSubmissionItem { product_id: ProductId::from_raw(1), quantity: 4.0 }],
                &[],
                Utc::now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
    }
}
