//! The `IdentityProvider` collaborator interface (`spec.md` §6: "supplies an
//! actor (user_id, role, company_id) derived elsewhere; the core does not
//! authenticate"). Authentication itself (Telegram login verification,
//! cookie sessions) is a presentation-layer concern out of scope per §1.

use async_trait::async_trait;

use kiosk_access::Principal;
use kiosk_core::{CoreResult, UserId};
use kiosk_tenant::{CompanyRepository, TenantStoreService, UserRepository};

/// Resolves a pre-authenticated `user_id` into the `(role, company_id)`
/// pair `kiosk_access::authorize` needs. Whatever sits in front of this
/// crate (a bot, an HTTP gateway) is responsible for establishing that the
/// caller really is `user_id`; this trait only looks up their current
/// tenant assignment.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, user_id: UserId) -> CoreResult<Principal>;
}

/// Resolves principals from `TenantStore::users`, the only durable record
/// of a user's role and company assignment.
pub struct TenantIdentityProvider<C, U> {
    tenant: std::sync::Arc<TenantStoreService<C, U>>,
}

impl<C, U> TenantIdentityProvider<C, U>
where
    C: CompanyRepository,
    U: UserRepository,
{
    pub fn new(tenant: std::sync::Arc<TenantStoreService<C, U>>) -> Self {
        Self { tenant }
    }
}

#[async_trait]
impl<C, U> IdentityProvider for TenantIdentityProvider<C, U>
where
    C: CompanyRepository,
    U: UserRepository,
{
    async fn resolve(&self, user_id: UserId) -> CoreResult<Principal> {
        let user = self.tenant.get_user(user_id).await?;
        Ok(Principal {
            user_id: user.id,
            role: user.role,
            company_id: user.company_id,
        })
    }
}
