//! The fixed action set `spec.md` §4.6 names. Unlike the teacher's opaque
//! `Permission(String)`, this is a closed enum: the spec enumerates exactly
//! these actions and nothing dynamically registers new ones.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    CatalogRead,
    CatalogWrite,
    LedgerRead,
    LedgerWriteSupply,
    LedgerWriteSnapshotDirect,
    LedgerWriteSnapshotViaSubmission,
    SubmissionReview,
    OrderManage,
    TenantManage,
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Action::CatalogRead => "catalog.read",
            Action::CatalogWrite => "catalog.write",
            Action::LedgerRead => "ledger.read",
            Action::LedgerWriteSupply => "ledger.write_supply",
            Action::LedgerWriteSnapshotDirect => "ledger.write_snapshot_direct",
            Action::LedgerWriteSnapshotViaSubmission => "ledger.write_snapshot_via_submission",
            Action::SubmissionReview => "submission.review",
            Action::OrderManage => "order.manage",
            Action::TenantManage => "tenant.manage",
        };
        f.write_str(s)
    }
}
