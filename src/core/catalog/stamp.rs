use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;

/// Catalog metadata attached to one detected region
#[derive(Debug, Clone, Serialize)]
pub struct StampRecord {
    pub id: i64,
    pub original_image_ref: Option<String>,
    /// Storage path of the cropped region; unique across the catalog
    pub storage_path: String,
    pub search_keywords: Option<String>,
    pub country: Option<String>,
    pub title_suggestion: Option<String>,
    pub estimated_price_range: Option<String>,
    pub history_notes: Option<String>,
    pub source_urls: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(skip)]
    pub(super) _guard: (),
}

#[derive(Debug, Clone, Default)]
pub struct NewStampRecord {
    pub original_image_ref: Option<String>,
    pub storage_path: String,
    pub search_keywords: Option<String>,
    pub country: Option<String>,
    pub title_suggestion: Option<String>,
    pub estimated_price_range: Option<String>,
    pub history_notes: Option<String>,
    pub source_urls: Vec<String>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("a record for {0} already exists")]
    DuplicatePath(String),
    #[error("storage path must not be empty")]
    EmptyPath,
}

pub trait CatalogRepository {
    /// Add a record; a second record for the same storage path is rejected
    fn insert(&self, record: &NewStampRecord) -> impl Future<Output = anyhow::Result<StampRecord>>;
    fn lookup(&self, storage_path: &str) -> impl Future<Output = anyhow::Result<Option<StampRecord>>>;
    /// Every record, newest first
    fn list(&self) -> impl Future<Output = anyhow::Result<Vec<StampRecord>>>;
}
