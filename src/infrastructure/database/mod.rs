pub mod rows;
pub mod sqlite_ledger;
pub mod sqlite_store;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::time::Duration;

use crate::shared::config::DatabaseConfig;
use crate::shared::error::Result;

pub use sqlite_ledger::SqliteActionLedger;
pub use sqlite_store::SqliteOfflineStore;

/// Open the SQLite pool and bring the schema up to date.
pub async fn connect(config: &DatabaseConfig) -> Result<Pool<Sqlite>> {
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout))
        .connect(&config.url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!(url = %config.url, "database ready");
    Ok(pool)
}
