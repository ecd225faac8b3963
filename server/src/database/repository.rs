//! Repository layer for database operations
//!
//! `Repository` owns the connection pool. Its operations are split by
//! concern: catalog tables in [`super::catalog`], checklist entries in
//! [`super::entries`], staff records in [`super::staff_records`].

use sqlx::SqlitePool;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pub(crate) pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Wrap a user search term for a `LIKE` match.
pub(crate) fn like_pattern(search: &str) -> String {
    let escaped = search
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
