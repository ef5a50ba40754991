mod stamp;
mod state;

use std::path::Path;

use anyhow::Context;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub use stamp::{CatalogError, CatalogRepository, NewStampRecord, StampRecord};

/// Default location of the catalog database
pub const DEFAULT_CATALOG_PATH: &str = "data/database/stamps_collection.db";

const SELECT_COLUMNS: &str = r#"SELECT
    id,
    original_image_ref,
    detected_stamp_image_path,
    search_keywords,
    country,
    title_suggestion,
    estimated_price_range,
    history_notes,
    source_urls,
    created_at
FROM stamps"#;

/// SQLite-backed catalog keyed by the storage path of each cropped region
#[derive(Debug, Clone)]
pub struct CatalogDb {
    pool: SqlitePool,
}

impl CatalogDb {
    pub async fn open<P: AsRef<Path>>(db_file: P) -> anyhow::Result<Self> {
        Ok(Self {
            pool: state::open_pool(db_file.as_ref()).await?,
        })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl CatalogRepository for CatalogDb {
    async fn insert(&self, record: &NewStampRecord) -> anyhow::Result<StampRecord> {
        if record.storage_path.is_empty() {
            return Err(CatalogError::EmptyPath.into());
        }
        let source_urls = serde_json::to_string(&record.source_urls)?;
        let created_at = OffsetDateTime::now_utc().format(&Rfc3339)?;

        let result = sqlx::query(
            r#"INSERT INTO stamps
            (original_image_ref, detected_stamp_image_path, search_keywords, country,
             title_suggestion, estimated_price_range, history_notes, source_urls, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id"#,
        )
        .bind(&record.original_image_ref)
        .bind(&record.storage_path)
        .bind(&record.search_keywords)
        .bind(&record.country)
        .bind(&record.title_suggestion)
        .bind(&record.estimated_price_range)
        .bind(&record.history_notes)
        .bind(&source_urls)
        .bind(&created_at)
        .fetch_one(&self.pool)
        .await;

        let id: i64 = match result {
            Ok(row) => row.try_get("id")?,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(CatalogError::DuplicatePath(record.storage_path.clone()).into());
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!(id, path = %record.storage_path, "catalog record added");

        self.lookup(&record.storage_path)
            .await?
            .with_context(|| format!("Record {} vanished after insert", id))
    }

    async fn lookup(&self, storage_path: &str) -> anyhow::Result<Option<StampRecord>> {
        let query = format!("{} WHERE detected_stamp_image_path = $1", SELECT_COLUMNS);
        sqlx::query(&query)
            .bind(storage_path)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| record_from_row(&row))
            .transpose()
    }

    async fn list(&self) -> anyhow::Result<Vec<StampRecord>> {
        let query = format!("{} ORDER BY id DESC", SELECT_COLUMNS);
        sqlx::query(&query)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(record_from_row)
            .collect()
    }
}

fn record_from_row(row: &SqliteRow) -> anyhow::Result<StampRecord> {
    let id: i64 = row.try_get("id")?;
    let created_at: String = row.try_get("created_at")?;
    let created_at = OffsetDateTime::parse(&created_at, &Rfc3339)
        .with_context(|| format!("Invalid created_at on record {}", id))?;

    let raw_urls: String = row.try_get("source_urls")?;
    let source_urls = serde_json::from_str(&raw_urls).unwrap_or_else(|e| {
        tracing::warn!(id, error = %e, "could not parse source_urls, using an empty list");
        Vec::new()
    });

    Ok(StampRecord {
        id,
        original_image_ref: row.try_get("original_image_ref")?,
        storage_path: row.try_get("detected_stamp_image_path")?,
        search_keywords: row.try_get("search_keywords")?,
        country: row.try_get("country")?,
        title_suggestion: row.try_get("title_suggestion")?,
        estimated_price_range: row.try_get("estimated_price_range")?,
        history_notes: row.try_get("history_notes")?,
        source_urls,
        created_at,
        _guard: (),
    })
}
