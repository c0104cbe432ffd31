use chrono::{DateTime, Utc};

use kiosk_core::{CompanyId, CoreError, CoreResult, Role, SubscriptionStatus, UserId, SYSTEM_COMPANY_ID};

use crate::{Company, CompanyRepository, User, UserRepository};

/// `TenantStore` (`spec.md` §4's dependency-order leaf, §6 operation surface):
/// company lifecycle, subscription status, and user-to-company binding.
pub struct TenantStoreService<C, U> {
    companies: C,
    users: U,
}

impl<C, U> TenantStoreService<C, U>
where
    C: CompanyRepository,
    U: UserRepository,
{
    pub fn new(companies: C, users: U) -> Self {
        Self { companies, users }
    }

    /// Only callable by a platform super-admin (enforced by the caller via
    /// `kiosk_access::authorize(.., Action::TenantManage, ..)` — this service
    /// assumes the check already happened, per the teacher's separation of
    /// policy from domain logic).
    pub async fn create_company(&self, name: &str, now: DateTime<Utc>) -> CoreResult<Company> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::validation("company name must not be empty"));
        }
        self.companies.insert(name, now).await
    }

    pub async fn list_companies(&self) -> CoreResult<Vec<Company>> {
        self.companies.list().await
    }

    pub async fn get_company(&self, id: CompanyId) -> CoreResult<Company> {
        self.companies
            .get(id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("company {id}")))
    }

    pub async fn update_subscription(
        &self,
        id: CompanyId,
        status: SubscriptionStatus,
        ends_at: Option<DateTime<Utc>>,
    ) -> CoreResult<()> {
        self.get_company(id).await?;
        self.companies.update_subscription(id, status, ends_at).await
    }

    /// Company id 1 is the system/template tenant and must never be deleted
    /// (`spec.md` §3).
    pub async fn delete_company(&self, id: CompanyId) -> CoreResult<()> {
        if id == SYSTEM_COMPANY_ID {
            return Err(CoreError::validation("the system tenant cannot be deleted"));
        }
        self.get_company(id).await?;
        self.companies.delete(id).await
    }

    /// Creates a user record on first contact with the bot/HTTP surface, or
    /// refreshes its name/last-seen if it already exists.
    pub async fn touch_user(
        &self,
        id: UserId,
        username: Option<String>,
        first_name: String,
        last_name: Option<String>,
        now: DateTime<Utc>,
    ) -> CoreResult<User> {
        if first_name.trim().is_empty() {
            return Err(CoreError::validation("first_name must not be empty"));
        }
        self.users.upsert_seen(id, username, first_name, last_name, now).await
    }

    /// Binds a not-yet-assigned user to a company. Rejects re-binding a user
    /// who already belongs to a (possibly different) company (`spec.md` §3:
    /// "once assigned to a company, re-binding ... is disallowed"; see
    /// `SPEC_FULL.md` §12).
    pub async fn bind_user_to_company(&self, id: UserId, company_id: CompanyId, role: Role) -> CoreResult<User> {
        self.get_company(company_id).await?;
        let existing = self
            .users
            .get(id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("user {id}")))?;
        if existing.company_id.is_some() {
            return Err(CoreError::conflict(format!(
                "user {id} is already bound to a company"
            )));
        }
        self.users.bind_to_company(id, company_id, role).await
    }

    /// Looks up a user by id, used by an `IdentityProvider` to resolve a
    /// pre-authenticated `user_id` into `(role, company_id)`.
    pub async fn get_user(&self, id: UserId) -> CoreResult<User> {
        self.users.get(id).await?.ok_or_else(|| CoreError::not_found(format!("user {id}")))
    }

    /// Changes a user's role. Callers must already have authorized the actor
    /// as an admin of the same company as `target`.
    pub async fn set_role(&self, target: UserId, role: Role) -> CoreResult<User> {
        self.users.set_role(target, role).await
    }

    pub async fn list_users(&self, company_id: CompanyId) -> CoreResult<Vec<User>> {
        self.users.list_by_company(company_id).await
    }

    /// Used by `SubmissionQueue::submit` to derive `admin_ids` for
    /// `Notifier::on_new_submission` (`spec.md` §4.5).
    pub async fn admins_of(&self, company_id: CompanyId) -> CoreResult<Vec<User>> {
        self.users.list_by_company_and_role(company_id, Role::Admin).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    #[derive(Default)]
    struct InMemoryCompanies {
        rows: Mutex<HashMap<i64, Company>>,
        next_id: Mutex<i64>,
    }

    #[async_trait]
    impl CompanyRepository for InMemoryCompanies {
        async fn insert(&self, name: &str, created_at: DateTime<Utc>) -> CoreResult<Company> {
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            let company = Company {
                id: CompanyId::from_raw(*next_id),
                name: name.to_string(),
                subscription_status: SubscriptionStatus::Trial,
                subscription_ends_at: None,
                created_at,
            };
            self.rows.lock().unwrap().insert(company.id.as_i64(), company.clone());
            Ok(company)
        }

        async fn get(&self, id: CompanyId) -> CoreResult<Option<Company>> {
            Ok(self.rows.lock().unwrap().get(&id.as_i64()).cloned())
        }

        async fn list(&self) -> CoreResult<Vec<Company>> {
            Ok(self.rows.lock().unwrap().values().cloned().collect())
        }

        async fn update_subscription(
            &self,
            id: CompanyId,
            status: SubscriptionStatus,
            ends_at: Option<DateTime<Utc>>,
        ) -> CoreResult<()> {
            let mut rows = self.rows.lock().unwrap();
            let company = rows.get_mut(&id.as_i64()).ok_or_else(|| CoreError::not_found("row"))?;
            company.subscription_status = status;
            company.subscription_ends_at = ends_at;
            Ok(())
        }

        async fn delete(&self, id: CompanyId) -> CoreResult<()> {
            self.rows.lock().unwrap().remove(&id.as_i64());
            Ok(())
        }
    }

    #[derive(Default)]
    struct InMemoryUsers {
        rows: Mutex<HashMap<i64, User>>,
    }

    #[async_trait]
    impl UserRepository for InMemoryUsers {
        async fn get(&self, id: UserId) -> CoreResult<Option<User>> {
            Ok(self.rows.lock().unwrap().get(&id.as_i64()).cloned())
        }

        async fn upsert_seen(
            &self,
            id: UserId,
            username: Option<String>,
            first_name: String,
            last_name: Option<String>,
            seen_at: DateTime<Utc>,
        ) -> CoreResult<User> {
            let mut rows = self.rows.lock().unwrap();
            let user = rows.entry(id.as_i64()).or_insert(User {
                id,
                company_id: None,
                username: username.clone(),
                first_name: first_name.clone(),
                last_name: last_name.clone(),
                role: Role::Employee,
                is_active: true,
                last_seen: seen_at,
            });
            user.username = username;
            user.first_name = first_name;
            user.last_name = last_name;
            user.last_seen = seen_at;
            Ok(user.clone())
        }

        async fn bind_to_company(&self, id: UserId, company_id: CompanyId, role: Role) -> CoreResult<User> {
            let mut rows = self.rows.lock().unwrap();
            let user = rows.get_mut(&id.as_i64()).ok_or_else(|| CoreError::not_found("row"))?;
            user.company_id = Some(company_id);
            user.role = role;
            Ok(user.clone())
        }

        async fn set_role(&self, id: UserId, role: Role) -> CoreResult<User> {
            let mut rows = self.rows.lock().unwrap();
            let user = rows.get_mut(&id.as_i64()).ok_or_else(|| CoreError::not_found("row"))?;
            user.role = role;
            Ok(user.clone())
        }

        async fn list_by_company(&self, company_id: CompanyId) -> CoreResult<Vec<User>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|u| u.company_id == Some(company_id))
                .cloned()
                .collect())
        }

        async fn list_by_company_and_role(&self, company_id: CompanyId, role: Role) -> CoreResult<Vec<User>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|u| u.company_id == Some(company_id) && u.role == role)
                .cloned()
                .collect())
        }
    }

    fn service() -> TenantStoreService<InMemoryCompanies, InMemoryUsers> {
        TenantStoreService::new(InMemoryCompanies::default(), InMemoryUsers::default())
    }

    #[tokio::test]
    async fn system_company_cannot_be_deleted() {
        let svc = service();
        svc.companies.insert("system", Utc::now()).await.unwrap(); // id 1
        let err = svc.delete_company(SYSTEM_COMPANY_ID).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn rebinding_an_already_bound_user_is_a_conflict() {
        let svc = service();
        let company = svc.create_company("Acme", Utc::now()).await.unwrap();
        let other = svc.create_company("Other", Utc::now()).await.unwrap();
        svc.touch_user(UserId::from_raw(100), None, "Alice".into(), None, Utc::now())
            .await
            .unwrap();
        svc.bind_user_to_company(UserId::from_raw(100), company.id, Role::Employee)
            .await
            .unwrap();

        let err = svc
            .bind_user_to_company(UserId::from_raw(100), other.id, Role::Employee)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }
}
