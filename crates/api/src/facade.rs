//! The operation surface of `spec.md` §6: one async function per named
//! operation, each resolving authorization via `kiosk_access::authorize`
//! before delegating to the crate that owns the behavior. Grounded on the
//! teacher's `app::services` (a single struct gathering every domain
//! service, with one method per use case) — generalized here to wrap
//! `authorize` at the boundary instead of the teacher's JWT-claims check,
//! since this system has no HTTP layer to carry claims.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use kiosk_access::{authorize, Action, AuthzError, Principal};
use kiosk_catalog::{CatalogService, NewProduct, Product};
use kiosk_core::{
    Clock, CompanyId, CoreError, CoreResult, OrderId, ProductId, Role, SubmissionId,
    SubscriptionStatus, SystemClock, UserId, SYSTEM_COMPANY_ID,
};
use kiosk_forecast::{ForecastService, OrderSuggestion};
use kiosk_ledger::{LedgerService, StockSnapshot, SupplyEvent};
use kiosk_notify::LoggingNotifier;
use kiosk_orders::{CompleteDecision, NewOrderItem, OrderItem, OrderService, PendingOrder};
use kiosk_submissions::{NewSubmissionItem, SubmissionItem, SubmissionService, StockSubmission};
use kiosk_tenant::{Company, TenantStoreService, User};

use kiosk_infra::{
    ids, PostgresCompanyRepository, PostgresLedgerRepository, PostgresOrderRepository,
    PostgresProductRepository, PostgresSubmissionRepository, PostgresUserRepository,
};

type Catalog = CatalogService<PostgresProductRepository>;
type Ledger = LedgerService<PostgresLedgerRepository, PostgresProductRepository>;
type Forecaster = ForecastService<PostgresLedgerRepository, PostgresProductRepository>;
type Orders = OrderService<PostgresOrderRepository, PostgresProductRepository>;
type Submissions = SubmissionService<PostgresSubmissionRepository, PostgresLedgerRepository, PostgresProductRepository, LoggingNotifier>;
type Tenant = TenantStoreService<PostgresCompanyRepository, PostgresUserRepository>;

fn denied(err: AuthzError) -> CoreError {
    CoreError::forbidden(err.to_string())
}

/// Gathers every domain service over one shared `PgPool`, plus the
/// process-local draft-order cache. One instance per running process.
pub struct KioskFacade {
    pool: PgPool,
    clock: SystemClock,
    tenant: Tenant,
    catalog: Catalog,
    ledger: Ledger,
    forecaster: Forecaster,
    orders: Orders,
    submissions: Submissions,
    drafts: kiosk_infra::DraftOrderCache,
}

impl KioskFacade {
    pub fn new(pool: PgPool, clock: SystemClock) -> Self {
        let tenant = TenantStoreService::new(
            PostgresCompanyRepository::new(pool.clone()),
            PostgresUserRepository::new(pool.clone()),
        );
        let catalog = CatalogService::new(PostgresProductRepository::new(pool.clone()));
        let ledger = LedgerService::new(
            PostgresLedgerRepository::new(pool.clone()),
            PostgresProductRepository::new(pool.clone()),
        );
        let forecaster = ForecastService::new(
            PostgresLedgerRepository::new(pool.clone()),
            PostgresProductRepository::new(pool.clone()),
        );
        let orders = OrderService::new(
            PostgresOrderRepository::new(pool.clone()),
            PostgresProductRepository::new(pool.clone()),
        );
        let submissions = SubmissionService::new(
            PostgresSubmissionRepository::new(pool.clone()),
            PostgresLedgerRepository::new(pool.clone()),
            PostgresProductRepository::new(pool.clone()),
            LoggingNotifier,
        );

        Self {
            pool,
            clock,
            tenant,
            catalog,
            ledger,
            forecaster,
            orders,
            submissions,
            drafts: kiosk_infra::DraftOrderCache::new(),
        }
    }

    // ---- Catalog ---------------------------------------------------

    pub async fn add_product(&self, actor: &Principal, new_product: NewProduct) -> CoreResult<Product> {
        authorize(actor, Action::CatalogWrite, new_product.company_id).map_err(denied)?;
        let next_id = ids::next_product_id(&self.pool).await?;
        self.catalog.add_product(new_product, next_id).await
    }

    pub async fn get_product(&self, actor: &Principal, id: ProductId) -> CoreResult<Product> {
        let product = self.catalog.get(id).await?;
        authorize(actor, Action::CatalogRead, product.company_id).map_err(denied)?;
        Ok(product)
    }

    pub async fn list_products(&self, actor: &Principal, company_id: CompanyId) -> CoreResult<Vec<Product>> {
        authorize(actor, Action::CatalogRead, company_id).map_err(denied)?;
        self.catalog.list(company_id).await
    }

    // ---- Ledger ------------------------------------------------------

    pub async fn record_snapshot(
        &self,
        actor: &Principal,
        company_id: CompanyId,
        product_id: ProductId,
        date: NaiveDate,
        quantity: f64,
    ) -> CoreResult<StockSnapshot> {
        authorize(actor, Action::LedgerWriteSnapshotDirect, company_id).map_err(denied)?;
        self.ledger.record_snapshot(company_id, product_id, date, quantity, self.clock.now()).await
    }

    pub async fn record_supply(
        &self,
        actor: &Principal,
        company_id: CompanyId,
        product_id: ProductId,
        date: NaiveDate,
        boxes: f64,
    ) -> CoreResult<SupplyEvent> {
        authorize(actor, Action::LedgerWriteSupply, company_id).map_err(denied)?;
        self.ledger.record_supply(company_id, product_id, date, boxes).await
    }

    pub async fn latest_snapshots(&self, actor: &Principal, company_id: CompanyId) -> CoreResult<Vec<StockSnapshot>> {
        authorize(actor, Action::LedgerRead, company_id).map_err(denied)?;
        self.ledger.latest_snapshot_per_product(company_id).await
    }

    pub async fn snapshot_on(&self, actor: &Principal, company_id: CompanyId, date: NaiveDate) -> CoreResult<Vec<StockSnapshot>> {
        authorize(actor, Action::LedgerRead, company_id).map_err(denied)?;
        self.ledger.snapshot_on(company_id, date).await
    }

    pub async fn history(
        &self,
        actor: &Principal,
        company_id: CompanyId,
        product_id: ProductId,
        window_days: i64,
    ) -> CoreResult<Vec<StockSnapshot>> {
        authorize(actor, Action::LedgerRead, company_id).map_err(denied)?;
        self.ledger.history(company_id, product_id, window_days).await
    }

    pub async fn supplies_between(
        &self,
        actor: &Principal,
        company_id: CompanyId,
        product_id: Option<ProductId>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CoreResult<Vec<SupplyEvent>> {
        authorize(actor, Action::LedgerRead, company_id).map_err(denied)?;
        self.ledger.supplies_between(company_id, product_id, start, end).await
    }

    pub async fn compute_period_consumption(
        &self,
        actor: &Principal,
        company_id: CompanyId,
        s1: &StockSnapshot,
        s2: &StockSnapshot,
    ) -> CoreResult<Option<(f64, i64)>> {
        authorize(actor, Action::LedgerRead, company_id).map_err(denied)?;
        self.ledger.compute_period_consumption(company_id, s1, s2).await
    }

    // ---- Forecaster ----------------------------------------------------

    /// `AverageConsumption`: fetches the 30-day window itself, the same
    /// window `ForecastService::select_items_to_order` uses internally.
    pub async fn average_consumption(
        &self,
        actor: &Principal,
        company_id: CompanyId,
        product_id: ProductId,
        window_days: i64,
    ) -> CoreResult<(f64, i64, String)> {
        authorize(actor, Action::LedgerRead, company_id).map_err(denied)?;
        let history = self.ledger.history(company_id, product_id, window_days).await?;
        let Some(anchor) = history.iter().map(|s| s.date).max() else {
            return Ok((0.0, 0, "insufficient data".to_string()));
        };
        let since = anchor - chrono::Duration::days(window_days);
        let supplies = self.ledger.supplies_between(company_id, Some(product_id), since, anchor).await?;
        Ok(kiosk_forecast::average_daily_consumption(&history, &supplies))
    }

    pub fn days_until_stockout(&self, current_stock: f64, avg_daily: f64) -> f64 {
        kiosk_forecast::days_until_stockout(current_stock, avg_daily)
    }

    pub fn order_quantity(
        &self,
        avg_daily: f64,
        horizon_days: f64,
        current_stock: f64,
        box_weight: f64,
        pending_weight: f64,
        use_02_rule: bool,
    ) -> (f64, i64) {
        kiosk_forecast::order_quantity(avg_daily, horizon_days, current_stock, box_weight, pending_weight, use_02_rule)
    }

    /// `SelectItemsToOrder`: in-transit weight per product (from `OrderBook`)
    /// is resolved here, since `kiosk-forecast` does not depend on
    /// `kiosk-orders`. The resulting draft is cached under a fresh token so
    /// an admin can review/edit it before `create_order` commits it.
    pub async fn select_items_to_order(
        &self,
        actor: &Principal,
        company_id: CompanyId,
        horizon_days: i64,
        threshold_days: f64,
        use_02_rule: bool,
    ) -> CoreResult<(String, Vec<OrderSuggestion>)> {
        authorize(actor, Action::OrderManage, company_id).map_err(denied)?;
        let snapshots = self.ledger.latest_snapshot_per_product(company_id).await?;
        let mut pending_weights = std::collections::HashMap::new();
        for snapshot in &snapshots {
            let weight = self.orders.in_transit_weight(company_id, snapshot.product_id).await?;
            pending_weights.insert(snapshot.product_id, weight);
        }
        let items = self
            .forecaster
            .select_items_to_order(company_id, horizon_days, threshold_days, &pending_weights, use_02_rule)
            .await?;
        let token = draft_token(company_id);
        self.drafts.put(token.clone(), items.clone());
        Ok((token, items))
    }

    /// `SummarizeOrder`: reads back a previously generated draft by token.
    pub fn summarize_order(&self, token: &str, threshold_amount: f64) -> Option<(Vec<OrderSuggestion>, f64, bool)> {
        self.drafts.get(token).map(|items| self.forecaster.summary(items, threshold_amount))
    }

    // ---- OrderBook -----------------------------------------------------

    pub async fn create_order(
        &self,
        actor: &Principal,
        company_id: CompanyId,
        items: Vec<NewOrderItem>,
        notes: Option<String>,
    ) -> CoreResult<(PendingOrder, Vec<OrderItem>)> {
        authorize(actor, Action::OrderManage, company_id).map_err(denied)?;
        let id = ids::next_order_id(&self.pool).await?;
        self.orders.create(id, company_id, items, notes, self.clock.now()).await
    }

    /// `CompleteOrder`: emits one supply per item before flipping the order
    /// to completed, per `spec.md` §4.4. Supplies are dated on the working
    /// day (`spec.md` §4.7), not raw wall-clock UTC, since this is a
    /// date-keyed write like every other one. Each supply is emitted from
    /// the order item's own stored `weight_ordered`/`cost` rather than
    /// re-derived from the product's current `box_weight`/`price_per_box`,
    /// which may have moved since the order was created.
    ///
    /// The two writes still don't share one database transaction (each
    /// domain repository opens its own connection off the shared pool),
    /// but `record_order_supply` is keyed on `order_id` and idempotent
    /// (`spec.md` §5: "the supply inserts and the status transition MUST
    /// commit together"): a crash between them, or two callers racing on
    /// the same order, both converge on exactly one supply row per item —
    /// a retry re-upserts the same values instead of appending a
    /// duplicate, and the loser of `finalize_complete`'s `status =
    /// 'pending'` guard gets a `Conflict` it can safely treat as "someone
    /// else already completed this".
    pub async fn complete_order(&self, actor: &Principal, id: OrderId, company_id: CompanyId) -> CoreResult<()> {
        authorize(actor, Action::OrderManage, company_id).map_err(denied)?;
        let today = self.clock.working_date();
        let (_, decision) = self.orders.prepare_complete(id, today).await?;
        match decision {
            CompleteDecision::AlreadyCompleted => Ok(()),
            CompleteDecision::Proceed { items } => {
                for item in items {
                    self.ledger
                        .record_order_supply(company_id, id, item.product_id, today, item.boxes_ordered, item.weight_ordered, item.cost)
                        .await?;
                }
                self.orders.finalize_complete(id).await
            }
        }
    }

    pub async fn cancel_order(&self, actor: &Principal, id: OrderId, company_id: CompanyId) -> CoreResult<()> {
        authorize(actor, Action::OrderManage, company_id).map_err(denied)?;
        self.orders.cancel(id).await
    }

    pub async fn list_pending_orders(&self, actor: &Principal, company_id: CompanyId) -> CoreResult<Vec<PendingOrder>> {
        authorize(actor, Action::OrderManage, company_id).map_err(denied)?;
        self.orders.list_pending(company_id).await
    }

    pub async fn get_order_items(&self, actor: &Principal, id: OrderId, company_id: CompanyId) -> CoreResult<(PendingOrder, Vec<OrderItem>)> {
        authorize(actor, Action::OrderManage, company_id).map_err(denied)?;
        self.orders.get_order(id).await
    }

    pub async fn in_transit_weight(&self, actor: &Principal, company_id: CompanyId, product_id: ProductId) -> CoreResult<f64> {
        authorize(actor, Action::OrderManage, company_id).map_err(denied)?;
        self.orders.in_transit_weight(company_id, product_id).await
    }

    // ---- SubmissionQueue -------------------------------------------------
    //
    // `SubmissionService` already calls `kiosk_access::authorize` itself
    // (it needs the actor to derive `submitted_by` and to gate reviewer-only
    // transitions), so these wrappers just resolve the id and admin list.

    pub async fn submit_stock(
        &self,
        actor: &Principal,
        company_id: CompanyId,
        date: NaiveDate,
        items: Vec<NewSubmissionItem>,
    ) -> CoreResult<(StockSubmission, Vec<SubmissionItem>)> {
        let id = ids::next_submission_id(&self.pool).await?;
        let admins = self.tenant.admins_of(company_id).await?;
        let admin_ids: Vec<UserId> = admins.iter().map(|a| a.id).collect();
        self.submissions.submit(id, actor, company_id, date, items, &admin_ids, self.clock.now()).await
    }

    pub async fn edit_item(
        &self,
        actor: &Principal,
        submission_id: SubmissionId,
        product_id: ProductId,
        edited_quantity: f64,
        edited_weight: f64,
    ) -> CoreResult<()> {
        self.submissions.edit_item(actor, submission_id, product_id, edited_quantity, edited_weight).await
    }

    pub async fn approve(&self, actor: &Principal, submission_id: SubmissionId) -> CoreResult<UserId> {
        self.submissions.approve(actor, submission_id, self.clock.now()).await
    }

    pub async fn reject(&self, actor: &Principal, submission_id: SubmissionId, reason: String) -> CoreResult<UserId> {
        self.submissions.reject(actor, submission_id, reason, self.clock.now()).await
    }

    pub async fn list_pending_for_company(&self, actor: &Principal, company_id: CompanyId) -> CoreResult<Vec<StockSubmission>> {
        authorize(actor, Action::SubmissionReview, company_id).map_err(denied)?;
        self.submissions.list_pending_for_company(company_id).await
    }

    pub async fn get_submission(&self, actor: &Principal, id: SubmissionId) -> CoreResult<StockSubmission> {
        let submission = self.submissions.get_submission(id).await?;
        authorize(actor, Action::SubmissionReview, submission.company_id).map_err(denied)?;
        Ok(submission)
    }

    pub async fn get_submission_items(&self, actor: &Principal, id: SubmissionId) -> CoreResult<Vec<SubmissionItem>> {
        let submission = self.submissions.get_submission(id).await?;
        authorize(actor, Action::SubmissionReview, submission.company_id).map_err(denied)?;
        self.submissions.get_items(id).await
    }

    /// `UserSubmissions`: an employee's own history. No `authorize` call is
    /// made against a tenant here — the filter is always `submitted_by ==
    /// actor.user_id`, so there is nothing cross-tenant to leak.
    pub async fn user_submissions(&self, actor: &Principal) -> CoreResult<Vec<StockSubmission>> {
        self.submissions.user_submissions(actor.user_id).await
    }

    // ---- TenantStore -----------------------------------------------------

    pub async fn create_company(&self, actor: &Principal, name: &str) -> CoreResult<Company> {
        authorize(actor, Action::TenantManage, SYSTEM_COMPANY_ID).map_err(denied)?;
        self.tenant.create_company(name, self.clock.now()).await
    }

    pub async fn list_companies(&self, actor: &Principal) -> CoreResult<Vec<Company>> {
        authorize(actor, Action::TenantManage, SYSTEM_COMPANY_ID).map_err(denied)?;
        self.tenant.list_companies().await
    }

    pub async fn update_subscription(
        &self,
        actor: &Principal,
        id: CompanyId,
        status: SubscriptionStatus,
        ends_at: Option<DateTime<Utc>>,
    ) -> CoreResult<()> {
        authorize(actor, Action::TenantManage, SYSTEM_COMPANY_ID).map_err(denied)?;
        self.tenant.update_subscription(id, status, ends_at).await
    }

    pub async fn delete_company(&self, actor: &Principal, id: CompanyId) -> CoreResult<()> {
        authorize(actor, Action::TenantManage, SYSTEM_COMPANY_ID).map_err(denied)?;
        self.tenant.delete_company(id).await
    }

    /// `CloneCatalogFromSystem` (`SPEC_FULL.md` §12): copies every
    /// system-tenant product into `target`, preserving every descriptive
    /// field and re-deriving nothing (the source row's own `box_weight`
    /// is already validated and carried across unchanged).
    pub async fn clone_catalog_from_system(&self, actor: &Principal, target: CompanyId) -> CoreResult<Vec<Product>> {
        authorize(actor, Action::TenantManage, SYSTEM_COMPANY_ID).map_err(denied)?;
        self.tenant.get_company(target).await?;

        let templates = self.catalog.list(SYSTEM_COMPANY_ID).await?;
        let mut cloned = Vec::with_capacity(templates.len());
        for template in templates {
            let next_id = ids::next_product_id(&self.pool).await?;
            let new_product = NewProduct {
                company_id: target,
                name_internal: template.name_internal,
                name_russian: template.name_russian,
                name_chinese: template.name_chinese,
                package_weight: template.package_weight,
                units_per_box: template.units_per_box,
                price_per_box: template.price_per_box,
                unit: template.unit,
            };
            cloned.push(self.catalog.add_product(new_product, next_id).await?);
        }
        Ok(cloned)
    }

    // ---- User lifecycle (TenantStore, not named separately in §6 but
    // required to reach the principals above at all) -------------------

    pub async fn touch_user(
        &self,
        id: UserId,
        username: Option<String>,
        first_name: String,
        last_name: Option<String>,
    ) -> CoreResult<User> {
        self.tenant.touch_user(id, username, first_name, last_name, self.clock.now()).await
    }

    /// Not gated by `Action::TenantManage` — that action is reserved for the
    /// platform super-admin (`authorize` hardcodes it), whereas binding a new
    /// employee is something each company's own admin needs to do for their
    /// own tenant.
    pub async fn bind_user_to_company(&self, actor: &Principal, id: UserId, company_id: CompanyId, role: Role) -> CoreResult<User> {
        let allowed = actor.is_super_admin() || (actor.is_company_admin() && actor.company_id == Some(company_id));
        if !allowed {
            return Err(CoreError::forbidden("only that company's admin may bind users to it"));
        }
        self.tenant.bind_user_to_company(id, company_id, role).await
    }
}

/// Drafts don't need cryptographic unpredictability -- they're a same-process
/// handoff, not a capability token -- so a counter seeded from the company id
/// and the draft map's current size is enough to avoid collisions within a
/// session without pulling in a UUID/rand dependency the rest of the
/// workspace doesn't otherwise need.
fn draft_token(company_id: CompanyId) -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("draft-{company_id}-{seq}")
}
