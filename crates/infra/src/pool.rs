//! Connection pool bootstrap. Grounded on the teacher's
//! `crates/api/src/app.rs` (`PgPool::connect`), generalized to apply the
//! `spec.md` §5 pool-sizing discipline the teacher's single-shot `connect`
//! didn't need.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::Config;

/// Connects a pool sized per `config.pool` and runs the embedded migrations.
/// Every public operation in this workspace acquires exactly one connection
/// from this pool for its duration (`spec.md` §5).
pub async fn connect(config: &Config) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .min_connections(config.pool.min_connections)
        .max_connections(config.pool.max_connections)
        .acquire_timeout(config.pool.acquire_timeout)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}
