use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kiosk_core::{CompanyId, SubscriptionStatus};

/// Tenant root. `spec.md` §3 (Company).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub subscription_status: SubscriptionStatus,
    pub subscription_ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
