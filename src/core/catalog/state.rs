use std::path::Path;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};

/// Open (creating if needed) the catalog database and apply migrations
pub(super) async fn open_pool(db_file: &Path) -> anyhow::Result<SqlitePool> {
    if let Some(parent) = db_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create catalog directory {:?}", parent))?;
    }

    let connect_opts = SqliteConnectOptions::new()
        .filename(db_file)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_opts)
        .await
        .with_context(|| format!("Failed to open catalog database {:?}", db_file))?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}
