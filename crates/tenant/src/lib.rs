//! `TenantStore` (`spec.md` §4's leaf module): company lifecycle, subscription
//! status, and the users authorized to act for a company.

mod company;
mod repository;
mod service;
mod user;

pub use company::Company;
pub use repository::{CompanyRepository, UserRepository};
pub use service::TenantStoreService;
pub use user::User;
