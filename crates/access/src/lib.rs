//! `AccessPolicy` (`spec.md` §4.6): role resolution and the per-tenant
//! authorization filter every other component calls through.

mod action;
mod authorize;
mod principal;

pub use action::Action;
pub use authorize::{authorize, AuthzError};
pub use principal::Principal;
