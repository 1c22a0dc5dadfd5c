use sqlx::SqlitePool;

/// Table holding one JSON document per TV show
pub const TV_SHOWS_TABLE: &str = "tv_shows";
/// Column of [`TV_SHOWS_TABLE`] with the document text
pub const DOCUMENT_COLUMN: &str = "doc";

#[derive(Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
}
