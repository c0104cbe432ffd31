//! The operation surface of `spec.md` §6, wired against Postgres. No HTTP
//! routes, Telegram polling, or cookie sessions live here — whatever
//! presentation layer is built next calls into [`KioskFacade`] after
//! resolving a [`Principal`](kiosk_access::Principal) through an
//! [`IdentityProvider`].

pub mod facade;
pub mod identity;

pub use facade::KioskFacade;
pub use identity::{IdentityProvider, TenantIdentityProvider};
