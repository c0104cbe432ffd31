//! `SubmissionQueue` (`spec.md` §4.5): employee-submitted stock counts and
//! their admin-moderated promotion into the `Ledger`. Depends on `Ledger`
//! and `AccessPolicy`.

mod notifier;
mod repository;
mod service;
mod submission;

pub use notifier::{NullNotifier, Notifier};
pub use repository::SubmissionRepository;
pub use service::SubmissionService;
pub use submission::{NewSubmissionItem, StockSubmission, SubmissionItem, SubmissionStatus, SubmissionSummary};
