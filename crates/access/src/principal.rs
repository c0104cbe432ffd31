use serde::{Deserialize, Serialize};

use kiosk_core::{CompanyId, Role, UserId, SYSTEM_COMPANY_ID};

/// A resolved actor: `(role, company_id)` per `spec.md` §4.6. `company_id` is
/// `None` only for a user who has not yet been bound to a company
/// (`spec.md` §3, User lifecycle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
    pub company_id: Option<CompanyId>,
}

impl Principal {
    /// Platform super-admin: admin of the system tenant (company id 1).
    pub fn is_super_admin(&self) -> bool {
        self.role == Role::Admin && self.company_id == Some(SYSTEM_COMPANY_ID)
    }

    /// Company admin: an admin of any tenant other than the system tenant.
    pub fn is_company_admin(&self) -> bool {
        self.role == Role::Admin && self.company_id.is_some() && self.company_id != Some(SYSTEM_COMPANY_ID)
    }
}
