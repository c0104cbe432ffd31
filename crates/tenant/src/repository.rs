use async_trait::async_trait;
use chrono::{DateTime, Utc};

use kiosk_core::{CompanyId, CoreResult, Role, UserId};

use crate::{Company, User};

/// Storage port for companies. Implemented against Postgres in `kiosk-infra`;
/// an in-memory implementation backs the unit tests in `service.rs`.
#[async_trait]
pub trait CompanyRepository: Send + Sync {
    async fn insert(&self, name: &str, created_at: DateTime<Utc>) -> CoreResult<Company>;
    async fn get(&self, id: CompanyId) -> CoreResult<Option<Company>>;
    async fn list(&self) -> CoreResult<Vec<Company>>;
    async fn update_subscription(
        &self,
        id: CompanyId,
        status: kiosk_core::SubscriptionStatus,
        ends_at: Option<DateTime<Utc>>,
    ) -> CoreResult<()>;
    /// Deletes the company and cascades to every dependent entity of the same
    /// tenant. Callers must reject `id == SYSTEM_COMPANY_ID` before calling
    /// this (see `TenantStoreService::delete_company`).
    async fn delete(&self, id: CompanyId) -> CoreResult<()>;
}

/// Storage port for users.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get(&self, id: UserId) -> CoreResult<Option<User>>;

    /// Create-or-touch on first contact: if the user doesn't exist, create it
    /// with `company_id = None`; otherwise update name/username/last_seen.
    async fn upsert_seen(
        &self,
        id: UserId,
        username: Option<String>,
        first_name: String,
        last_name: Option<String>,
        seen_at: DateTime<Utc>,
    ) -> CoreResult<User>;

    /// Assigns `company_id`/`role` to a user whose `company_id` is currently
    /// `None`. Must be atomic against concurrent binds of the same user.
    async fn bind_to_company(&self, id: UserId, company_id: CompanyId, role: Role) -> CoreResult<User>;

    async fn set_role(&self, id: UserId, role: Role) -> CoreResult<User>;

    async fn list_by_company(&self, company_id: CompanyId) -> CoreResult<Vec<User>>;

    async fn list_by_company_and_role(&self, company_id: CompanyId, role: Role) -> CoreResult<Vec<User>>;
}
