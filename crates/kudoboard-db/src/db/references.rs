//! Owning-reference registry and bulk reference lookups.
//!
//! Every column that can hold a storage public reference must be listed in
//! [`OWNING_COLUMNS`]. A column missing from the list does not protect its
//! objects: the reclaimer will treat them as orphans and delete them.

use async_trait::async_trait;
use kudoboard_core::AppError;
use sqlx::{PgPool, Postgres};
use std::collections::HashSet;

/// A table column holding public references to stored objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwningColumn {
    pub table: &'static str,
    pub column: &'static str,
    /// Extra SQL predicate rows must satisfy to count as owners.
    pub condition: Option<&'static str>,
}

impl OwningColumn {
    pub const fn new(table: &'static str, column: &'static str) -> Self {
        Self {
            table,
            column,
            condition: None,
        }
    }

    pub const fn with_condition(mut self, condition: &'static str) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Membership query: which of `$1` appear in this column on live rows.
    ///
    /// Soft-deleted rows (`deleted_at` set) do not own objects.
    pub fn membership_sql(&self) -> String {
        let mut sql = format!(
            "SELECT DISTINCT {col} FROM {table} WHERE {col} = ANY($1) AND deleted_at IS NULL",
            col = self.column,
            table = self.table,
        );
        if let Some(condition) = self.condition {
            sql.push_str(" AND ");
            sql.push_str(condition);
        }
        sql
    }
}

/// Every column that can reference a stored object.
pub const OWNING_COLUMNS: &[OwningColumn] = &[
    OwningColumn::new("posts", "media_path").with_condition("media_source = 'internal'"),
    OwningColumn::new("media", "source_url").with_condition("source_type = 'upload'"),
    OwningColumn::new("media", "thumbnail_url"),
    OwningColumn::new("themes", "icon_url"),
    OwningColumn::new("themes", "background_image_url"),
    OwningColumn::new("users", "profile_picture"),
];

/// Bulk existence checks of public references against owning columns.
#[async_trait]
pub trait ReferenceLookup: Send + Sync {
    /// The columns consulted by [`ReferenceLookup::find_all_referenced`].
    fn owning_columns(&self) -> &'static [OwningColumn] {
        OWNING_COLUMNS
    }

    /// Subset of `refs` present in `column` on live rows.
    async fn find_referenced(
        &self,
        column: &OwningColumn,
        refs: &[String],
    ) -> Result<HashSet<String>, AppError>;

    /// Union of referenced values across every owning column.
    ///
    /// One query per column regardless of how many refs are checked. Fails on the
    /// first column whose query fails.
    async fn find_all_referenced(&self, refs: &[String]) -> Result<HashSet<String>, AppError> {
        let mut referenced = HashSet::new();
        if refs.is_empty() {
            return Ok(referenced);
        }
        for column in self.owning_columns() {
            referenced.extend(self.find_referenced(column, refs).await?);
        }
        Ok(referenced)
    }
}

/// Postgres-backed [`ReferenceLookup`].
#[derive(Clone)]
pub struct ReferenceRepository {
    pool: PgPool,
}

impl ReferenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferenceLookup for ReferenceRepository {
    #[tracing::instrument(
        skip(self, refs),
        fields(db.table = column.table, db.column = column.column, db.operation = "select", candidates = refs.len())
    )]
    async fn find_referenced(
        &self,
        column: &OwningColumn,
        refs: &[String],
    ) -> Result<HashSet<String>, AppError> {
        if refs.is_empty() {
            return Ok(HashSet::new());
        }

        let sql = column.membership_sql();
        let found = sqlx::query_scalar::<Postgres, String>(&sql)
            .bind(refs)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = ?e,
                    table = column.table,
                    column = column.column,
                    "Reference lookup failed"
                );
                AppError::Database(e)
            })?;

        tracing::debug!(found = found.len(), "Reference lookup complete");

        Ok(found.into_iter().collect())
    }
}
