//! Postgres-backed `CompanyRepository` / `UserRepository`
//! (`kiosk_tenant::repository`): `sqlx::query` + `Row::try_get`,
//! `#[instrument]` spans on every method, errors routed through
//! `map_sqlx_error`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;

use kiosk_core::{CompanyId, CoreResult, Role, SubscriptionStatus, UserId};
use kiosk_tenant::{Company, CompanyRepository, User, UserRepository};

use crate::errors::map_sqlx_error;

#[derive(Clone)]
pub struct PostgresCompanyRepository {
    pool: PgPool,
}

impl PostgresCompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn role_to_str(role: Role) -> &'static str {
    match role {
        Role::Employee => "employee",
        Role::Manager => "manager",
        Role::Admin => "admin",
    }
}

fn role_from_str(s: &str) -> Role {
    match s {
        "manager" => Role::Manager,
        "admin" => Role::Admin,
        _ => Role::Employee,
    }
}

fn subscription_to_str(status: SubscriptionStatus) -> &'static str {
    match status {
        SubscriptionStatus::Trial => "trial",
        SubscriptionStatus::Active => "active",
        SubscriptionStatus::Expired => "expired",
        SubscriptionStatus::Cancelled => "cancelled",
    }
}

fn subscription_from_str(s: &str) -> SubscriptionStatus {
    match s {
        "active" => SubscriptionStatus::Active,
        "expired" => SubscriptionStatus::Expired,
        "cancelled" => SubscriptionStatus::Cancelled,
        _ => SubscriptionStatus::Trial,
    }
}

fn row_to_company(row: &sqlx::postgres::PgRow) -> sqlx::Result<Company> {
    let status: String = row.try_get("subscription_status")?;
    Ok(Company {
        id: CompanyId::from_raw(row.try_get("id")?),
        name: row.try_get("name")?,
        subscription_status: subscription_from_str(&status),
        subscription_ends_at: row.try_get("subscription_ends_at")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl CompanyRepository for PostgresCompanyRepository {
    #[instrument(skip(self))]
    async fn insert(&self, name: &str, created_at: DateTime<Utc>) -> CoreResult<Company> {
        let row = sqlx::query(
            r#"
            INSERT INTO companies (name, subscription_status, subscription_ends_at, created_at)
            VALUES ($1, 'trial', NULL, $2)
            RETURNING id, name, subscription_status, subscription_ends_at, created_at
            "#,
        )
        .bind(name)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("company.insert", e))?;

        row_to_company(&row).map_err(|e| map_sqlx_error("company.insert", e))
    }

    #[instrument(skip(self))]
    async fn get(&self, id: CompanyId) -> CoreResult<Option<Company>> {
        let row = sqlx::query(
            "SELECT id, name, subscription_status, subscription_ends_at, created_at FROM companies WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("company.get", e))?;

        row.map(|r| row_to_company(&r)).transpose().map_err(|e| map_sqlx_error("company.get", e))
    }

    #[instrument(skip(self))]
    async fn list(&self) -> CoreResult<Vec<Company>> {
        let rows = sqlx::query(
            "SELECT id, name, subscription_status, subscription_ends_at, created_at FROM companies ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("company.list", e))?;

        rows.iter().map(row_to_company).collect::<sqlx::Result<_>>().map_err(|e| map_sqlx_error("company.list", e))
    }

    #[instrument(skip(self))]
    async fn update_subscription(
        &self,
        id: CompanyId,
        status: SubscriptionStatus,
        ends_at: Option<DateTime<Utc>>,
    ) -> CoreResult<()> {
        sqlx::query("UPDATE companies SET subscription_status = $1, subscription_ends_at = $2 WHERE id = $3")
            .bind(subscription_to_str(status))
            .bind(ends_at)
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("company.update_subscription", e))?;
        Ok(())
    }

    /// Cascades to every dependent entity of the tenant via `ON DELETE
    /// CASCADE` (`spec.md` §3, §6). Callers reject `id == SYSTEM_COMPANY_ID`
    /// before reaching here (`TenantStoreService::delete_company`).
    #[instrument(skip(self))]
    async fn delete(&self, id: CompanyId) -> CoreResult<()> {
        sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("company.delete", e))?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_user(row: &sqlx::postgres::PgRow) -> sqlx::Result<User> {
    let role: String = row.try_get("role")?;
    let company_id: Option<i64> = row.try_get("company_id")?;
    Ok(User {
        id: UserId::from_raw(row.try_get("id")?),
        company_id: company_id.map(CompanyId::from_raw),
        username: row.try_get("username")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        role: role_from_str(&role),
        is_active: row.try_get("is_active")?,
        last_seen: row.try_get("last_seen")?,
    })
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self))]
    async fn get(&self, id: UserId) -> CoreResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, company_id, username, first_name, last_name, role, is_active, last_seen FROM users WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("user.get", e))?;

        row.map(|r| row_to_user(&r)).transpose().map_err(|e| map_sqlx_error("user.get", e))
    }

    /// Create-or-touch on first contact: the `ON CONFLICT` branch only
    /// refreshes name/username/`last_seen`, never `company_id`/`role`
    /// (`kiosk_tenant::TenantStoreService::touch_user`).
    #[instrument(skip(self))]
    async fn upsert_seen(
        &self,
        id: UserId,
        username: Option<String>,
        first_name: String,
        last_name: Option<String>,
        seen_at: DateTime<Utc>,
    ) -> CoreResult<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (id, company_id, username, first_name, last_name, role, is_active, last_seen)
            VALUES ($1, NULL, $2, $3, $4, 'employee', TRUE, $5)
            ON CONFLICT (id) DO UPDATE SET
                username = EXCLUDED.username,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                last_seen = EXCLUDED.last_seen
            RETURNING id, company_id, username, first_name, last_name, role, is_active, last_seen
            "#,
        )
        .bind(id.as_i64())
        .bind(&username)
        .bind(&first_name)
        .bind(&last_name)
        .bind(seen_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("user.upsert_seen", e))?;

        row_to_user(&row).map_err(|e| map_sqlx_error("user.upsert_seen", e))
    }

    /// `WHERE company_id IS NULL` makes a concurrent second bind of the same
    /// user race safely: the loser's `UPDATE` touches zero rows and
    /// `fetch_optional` returns `None`, which the caller (already holding
    /// the pre-bind row from `get`) should treat as a lost race, not
    /// silently succeeding (`spec.md` §3, §5).
    #[instrument(skip(self))]
    async fn bind_to_company(&self, id: UserId, company_id: CompanyId, role: Role) -> CoreResult<User> {
        let row = sqlx::query(
            r#"
            UPDATE users SET company_id = $2, role = $3
            WHERE id = $1 AND company_id IS NULL
            RETURNING id, company_id, username, first_name, last_name, role, is_active, last_seen
            "#,
        )
        .bind(id.as_i64())
        .bind(company_id.as_i64())
        .bind(role_to_str(role))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("user.bind_to_company", e))?;

        match row {
            Some(row) => row_to_user(&row).map_err(|e| map_sqlx_error("user.bind_to_company", e)),
            None => Err(kiosk_core::CoreError::conflict(format!("user {id} is already bound to a company"))),
        }
    }

    #[instrument(skip(self))]
    async fn set_role(&self, id: UserId, role: Role) -> CoreResult<User> {
        let row = sqlx::query(
            r#"
            UPDATE users SET role = $2 WHERE id = $1
            RETURNING id, company_id, username, first_name, last_name, role, is_active, last_seen
            "#,
        )
        .bind(id.as_i64())
        .bind(role_to_str(role))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("user.set_role", e))?;

        match row {
            Some(row) => row_to_user(&row).map_err(|e| map_sqlx_error("user.set_role", e)),
            None => Err(kiosk_core::CoreError::not_found(format!("user {id}"))),
        }
    }

    #[instrument(skip(self))]
    async fn list_by_company(&self, company_id: CompanyId) -> CoreResult<Vec<User>> {
        let rows = sqlx::query(
            "SELECT id, company_id, username, first_name, last_name, role, is_active, last_seen FROM users WHERE company_id = $1 ORDER BY id",
        )
        .bind(company_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("user.list_by_company", e))?;

        rows.iter().map(row_to_user).collect::<sqlx::Result<_>>().map_err(|e| map_sqlx_error("user.list_by_company", e))
    }

    #[instrument(skip(self))]
    async fn list_by_company_and_role(&self, company_id: CompanyId, role: Role) -> CoreResult<Vec<User>> {
        let rows = sqlx::query(
            "SELECT id, company_id, username, first_name, last_name, role, is_active, last_seen FROM users WHERE company_id = $1 AND role = $2 ORDER BY id",
        )
        .bind(company_id.as_i64())
        .bind(role_to_str(role))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("user.list_by_company_and_role", e))?;

        rows.iter().map(row_to_user).collect::<sqlx::Result<_>>().map_err(|e| map_sqlx_error("user.list_by_company_and_role", e))
    }
}
