//! Strongly-typed identifiers used across the domain.
//!
//! Unlike a UUID-keyed system, `spec.md` §3 fixes these as stable integers
//! (company id, product id, ...) or a platform-supplied 64-bit id (Telegram
//! user id), so the newtypes here wrap `i64` rather than `Uuid`.

use serde::{Deserialize, Serialize};

macro_rules! impl_i64_newtype {
    ($t:ident) => {
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(i64);

        impl $t {
            pub const fn from_raw(id: i64) -> Self {
                Self(id)
            }

            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }
    };
}

/// Company (tenant) id. Company id 1 is the system/template tenant
/// (`crate::SYSTEM_COMPANY_ID`).
impl_i64_newtype!(CompanyId);

/// User id — the Telegram user id supplied by the identity provider.
impl_i64_newtype!(UserId);

/// Product id, unique per company.
impl_i64_newtype!(ProductId);

/// Supply (inbound shipment) row id.
impl_i64_newtype!(SupplyId);

/// Pending order id.
impl_i64_newtype!(OrderId);

/// Stock submission id.
impl_i64_newtype!(SubmissionId);
