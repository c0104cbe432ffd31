//! Shared domain primitives: identifiers, the error taxonomy, and the
//! working-day clock. Every tenant-scoped crate in this workspace depends on
//! this one and nothing lower.

mod clock;
mod error;
mod id;

pub use clock::{working_date_of, Clock, SystemClock};
pub use error::{CoreError, CoreResult};
pub use id::{CompanyId, OrderId, ProductId, SubmissionId, SupplyId, UserId};

use serde::{Deserialize, Serialize};

/// A user's role within a company. See `spec.md` §3 (User) and §4.6 (AccessPolicy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employee,
    Manager,
    Admin,
}

/// Unit of measure a product is tracked in. `Sht` (pieces) carries the
/// post-migration invariant that `package_weight == 1.0` (see `spec.md` §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "кг")]
    Kg,
    #[serde(rename = "шт")]
    Sht,
    #[serde(rename = "л")]
    L,
    #[serde(rename = "мл")]
    Ml,
    #[serde(rename = "г")]
    G,
}

impl Unit {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Unit::Kg => "кг",
            Unit::Sht => "шт",
            Unit::L => "л",
            Unit::Ml => "мл",
            Unit::G => "г",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "кг" => Some(Unit::Kg),
            "шт" => Some(Unit::Sht),
            "л" => Some(Unit::L),
            "мл" => Some(Unit::Ml),
            "г" => Some(Unit::G),
            _ => None,
        }
    }
}

/// Lifecycle of a company's subscription. See `spec.md` §3 (Company).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Trial,
    Active,
    Expired,
    Cancelled,
}

/// Id of the system/template tenant. Company id 1 per `spec.md` §3: it must
/// never be deleted and is the source for catalog cloning.
pub const SYSTEM_COMPANY_ID: CompanyId = CompanyId::from_raw(1);
