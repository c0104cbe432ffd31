use thiserror::Error;

use kiosk_core::{CompanyId, Role};

use crate::{Action, Principal};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("cross-tenant access denied")]
    TenantMismatch,

    #[error("forbidden: role '{role:?}' cannot perform '{action}'")]
    RoleDenied { role: Role, action: Action },
}

/// Authorize `actor` to perform `action` against `tenant`.
///
/// No IO, no panics — a pure policy check per `spec.md` §8 item 8: any
/// operation taking `(actor, target)` where `actor.company_id != target`
/// (and actor is not super-admin) returns `Forbidden` and performs no writes.
pub fn authorize(actor: &Principal, action: Action, tenant: CompanyId) -> Result<(), AuthzError> {
    if !actor.is_super_admin() && actor.company_id != Some(tenant) {
        return Err(AuthzError::TenantMismatch);
    }

    let allowed = match action {
        Action::CatalogRead => true,
        Action::CatalogWrite => matches!(actor.role, Role::Admin | Role::Manager),
        Action::LedgerRead | Action::LedgerWriteSupply | Action::LedgerWriteSnapshotDirect => {
            actor.role == Role::Admin
        }
        Action::LedgerWriteSnapshotViaSubmission => true,
        Action::SubmissionReview => matches!(actor.role, Role::Admin | Role::Manager),
        Action::OrderManage => matches!(actor.role, Role::Admin | Role::Manager),
        Action::TenantManage => actor.is_super_admin(),
    };

    if allowed {
        Ok(())
    } else {
        Err(AuthzError::RoleDenied { role: actor.role, action })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role, company: i64) -> Principal {
        Principal {
            user_id: 1.into(),
            role,
            company_id: Some(CompanyId::from_raw(company)),
        }
    }

    #[test]
    fn employee_cannot_write_supplies() {
        let actor = principal(Role::Employee, 5);
        let err = authorize(&actor, Action::LedgerWriteSupply, CompanyId::from_raw(5)).unwrap_err();
        assert_eq!(err, AuthzError::RoleDenied { role: Role::Employee, action: Action::LedgerWriteSupply });
    }

    #[test]
    fn employee_can_write_snapshot_via_submission() {
        let actor = principal(Role::Employee, 5);
        authorize(&actor, Action::LedgerWriteSnapshotViaSubmission, CompanyId::from_raw(5)).unwrap();
    }

    #[test]
    fn cross_tenant_access_is_denied() {
        let actor = principal(Role::Admin, 5);
        let err = authorize(&actor, Action::CatalogRead, CompanyId::from_raw(6)).unwrap_err();
        assert_eq!(err, AuthzError::TenantMismatch);
    }

    #[test]
    fn super_admin_bypasses_tenant_check() {
        let actor = principal(Role::Admin, 1);
        authorize(&actor, Action::TenantManage, CompanyId::from_raw(42)).unwrap();
    }

    #[test]
    fn company_admin_cannot_manage_tenants() {
        let actor = principal(Role::Admin, 5);
        let err = authorize(&actor, Action::TenantManage, CompanyId::from_raw(5)).unwrap_err();
        assert_eq!(err, AuthzError::RoleDenied { role: Role::Admin, action: Action::TenantManage });
    }
}
