//! Uploaded document metadata.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Document row with the uploader's name attached.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DocumentWithUploader {
    pub document_id: Uuid,
    pub case_id: Uuid,
    pub name: String,
    pub document_type: String,
    pub category: Option<String>,
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub uploaded_by: Uuid,
    pub uploader_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct DocumentTypeGroup {
    pub document_type: String,
    pub count: i64,
    pub total_size: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct DocumentCategoryGroup {
    pub category: Option<String>,
    pub count: i64,
    pub total_size: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub document_count: i64,
    pub total_size: Decimal,
    pub by_type: Vec<DocumentTypeGroup>,
    pub by_category: Vec<DocumentCategoryGroup>,
}
