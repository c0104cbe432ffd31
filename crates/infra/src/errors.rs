//! Maps `sqlx::Error` onto the `spec.md` §7 taxonomy. Grounded on the
//! teacher's `event_store::postgres::map_sqlx_error` (same shape: inspect the
//! Postgres error code, fall back to `Internal` for everything unexpected).

use kiosk_core::CoreError;

/// `23505` = unique_violation, `23503` = foreign_key_violation,
/// `23514` = check_violation (Postgres error codes).
pub fn map_sqlx_error(op: &str, err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        match db_err.code().as_deref() {
            Some("23505") => return CoreError::conflict(format!("{op}: unique constraint violated")),
            Some("23503") | Some("23514") => {
                return CoreError::integrity(format!("{op}: {}", db_err.message()))
            }
            _ => {}
        }
    }
    CoreError::internal(format!("infra:{op}"), err)
}
