use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kiosk_core::{CompanyId, Role, UserId};

/// A person authorized to act for a company. `spec.md` §3 (User).
///
/// `company_id` is `None` only before the user's first assignment; once set,
/// `TenantStore::bind_user_to_company` refuses to change it (see `spec.md`
/// §3 and `SPEC_FULL.md` §12, "user invite / first-contact binding").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub company_id: Option<CompanyId>,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub last_seen: DateTime<Utc>,
}
