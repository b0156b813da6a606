//! Document service: upload metadata rows coupled to stored files.
//!
//! The binary itself goes through the [`FileStorage`] seam; if the metadata
//! insert fails after the file was stored, the file is removed again so no
//! orphan is left behind.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    DocumentSummary, DocumentType, DocumentWithUploader,
    document::{DocumentCategoryGroup, DocumentTypeGroup},
};
use crate::pagination::{Page, ResolvedPage};
use crate::storage::FileStorage;

const DOCUMENT_COLUMNS: &str = "d.document_id, d.case_id, d.name, d.document_type, d.category, \
     d.file_path, d.file_size, d.mime_type, d.uploaded_by, u.name AS uploader_name, d.created_at";

/// Metadata accompanying an upload; the file itself arrives as multipart
/// bytes.
#[derive(Debug, Clone, Deserialize)]
pub struct NewDocument {
    pub name: Option<String>,
    pub document_type: String,
    pub category: Option<String>,
}

impl NewDocument {
    pub fn validate(&self) -> AppResult<()> {
        self.document_type.parse::<DocumentType>()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentFilter {
    pub search: Option<String>,
    pub document_type: Option<String>,
    pub category: Option<String>,
}

impl DocumentFilter {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(document_type) = &self.document_type {
            document_type.parse::<DocumentType>()?;
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct DocumentService {
    pool: PgPool,
    storage: Arc<dyn FileStorage>,
}

impl DocumentService {
    pub fn new(pool: PgPool, storage: Arc<dyn FileStorage>) -> Self {
        Self { pool, storage }
    }

    /// Store the file, then record its metadata. The stored file is removed
    /// again if the insert fails.
    pub async fn upload(
        &self,
        case_id: Uuid,
        meta: NewDocument,
        file_name: &str,
        mime_type: &str,
        bytes: &[u8],
        actor: Uuid,
    ) -> AppResult<DocumentWithUploader> {
        meta.validate()?;
        self.ensure_case(case_id).await?;

        let stored = self.storage.save(file_name, bytes).await?;
        let display_name = meta
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| file_name.to_string());

        let inserted = sqlx::query_as::<_, DocumentWithUploader>(&format!(
            "WITH inserted AS ( \
                 INSERT INTO documents (document_id, case_id, name, document_type, category, \
                     file_path, file_size, mime_type, uploaded_by) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
                 RETURNING *) \
             SELECT {DOCUMENT_COLUMNS} \
             FROM inserted d JOIN users u ON u.user_id = d.uploaded_by"
        ))
        .bind(Uuid::new_v4())
        .bind(case_id)
        .bind(&display_name)
        .bind(&meta.document_type)
        .bind(&meta.category)
        .bind(&stored.reference)
        .bind(stored.size)
        .bind(mime_type)
        .bind(actor)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(document) => {
                info!(
                    "Uploaded document '{}' ({} bytes) to case {}",
                    document.name, document.file_size, case_id
                );
                Ok(document)
            }
            Err(e) => {
                if let Err(cleanup) = self.storage.delete(&stored.reference).await {
                    warn!("failed to remove stored file {}: {}", stored.reference, cleanup);
                }
                Err(e.into())
            }
        }
    }

    pub async fn list(
        &self,
        case_id: Uuid,
        filter: DocumentFilter,
        page: ResolvedPage,
    ) -> AppResult<Page<DocumentWithUploader>> {
        filter.validate()?;
        self.ensure_case(case_id).await?;

        let mut count_query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM documents d WHERE d.case_id = ");
        count_query.push_bind(case_id);
        push_document_filters(&mut count_query, &filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut data_query: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents d \
             JOIN users u ON u.user_id = d.uploaded_by WHERE d.case_id = "
        ));
        data_query.push_bind(case_id);
        push_document_filters(&mut data_query, &filter);
        data_query
            .push(" ORDER BY d.created_at DESC LIMIT ")
            .push_bind(page.limit_i64())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let data = data_query
            .build_query_as::<DocumentWithUploader>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(data, total, page))
    }

    pub async fn get(&self, document_id: Uuid) -> AppResult<DocumentWithUploader> {
        sqlx::query_as::<_, DocumentWithUploader>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents d \
             JOIN users u ON u.user_id = d.uploaded_by WHERE d.document_id = $1"
        ))
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("document"))
    }

    /// Delete the row, then the stored file. A failed file delete is logged
    /// rather than surfaced; the row is already gone.
    pub async fn delete(&self, document_id: Uuid) -> AppResult<()> {
        let document = self.get(document_id).await?;

        sqlx::query("DELETE FROM documents WHERE document_id = $1")
            .bind(document_id)
            .execute(&self.pool)
            .await?;

        if let Err(e) = self.storage.delete(&document.file_path).await {
            warn!("failed to delete stored file {}: {}", document.file_path, e);
        }

        info!("Deleted document {}", document_id);
        Ok(())
    }

    pub async fn summary(&self, case_id: Uuid) -> AppResult<DocumentSummary> {
        self.ensure_case(case_id).await?;

        let totals = sqlx::query_as::<_, (i64, Decimal)>(
            "SELECT COUNT(*), COALESCE(SUM(file_size), 0) FROM documents WHERE case_id = $1",
        )
        .bind(case_id)
        .fetch_one(&self.pool);

        let by_type = sqlx::query_as::<_, DocumentTypeGroup>(
            "SELECT document_type, COUNT(*) AS count, COALESCE(SUM(file_size), 0) AS total_size \
             FROM documents WHERE case_id = $1 GROUP BY document_type ORDER BY document_type",
        )
        .bind(case_id)
        .fetch_all(&self.pool);

        let by_category = sqlx::query_as::<_, DocumentCategoryGroup>(
            "SELECT category, COUNT(*) AS count, COALESCE(SUM(file_size), 0) AS total_size \
             FROM documents WHERE case_id = $1 GROUP BY category ORDER BY category",
        )
        .bind(case_id)
        .fetch_all(&self.pool);

        let ((document_count, total_size), by_type, by_category) =
            tokio::try_join!(totals, by_type, by_category)?;

        Ok(DocumentSummary {
            document_count,
            total_size,
            by_type,
            by_category,
        })
    }

    async fn ensure_case(&self, case_id: Uuid) -> AppResult<()> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM cases WHERE case_id = $1)")
                .bind(case_id)
                .fetch_one(&self.pool)
                .await?;
        if exists {
            Ok(())
        } else {
            Err(AppError::NotFound("case"))
        }
    }
}

fn push_document_filters(query: &mut QueryBuilder<Postgres>, filter: &DocumentFilter) {
    if let Some(document_type) = &filter.document_type {
        query
            .push(" AND d.document_type = ")
            .push_bind(document_type.clone());
    }
    if let Some(category) = &filter.category {
        query.push(" AND d.category = ").push_bind(category.clone());
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search.trim());
        query.push(" AND d.name ILIKE ").push_bind(pattern);
    }
}
