//! Document endpoints. Uploads arrive as multipart form data with a required
//! `file` part plus optional metadata fields.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Extension, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::database::{DocumentFilter, NewDocument};
use crate::error::{AppError, AppResult};
use crate::models::{DocumentSummary, DocumentWithUploader};
use crate::pagination::{Page, PageParams, DOCUMENT_DEFAULT_LIMIT};

use super::{AppState, SuccessResponse};

#[derive(Debug, Deserialize)]
pub struct DocumentListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    #[serde(rename = "documentType")]
    pub document_type: Option<String>,
    pub category: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/documents/cases/:case_id",
            get(list_documents).post(upload_document),
        )
        .route(
            "/documents/:document_id",
            get(get_document).delete(delete_document),
        )
        .route("/documents/cases/:case_id/summary", get(document_summary))
}

struct UploadForm {
    file_name: String,
    mime_type: String,
    bytes: Vec<u8>,
    meta: NewDocument,
}

/// Pull the file part and metadata fields out of the multipart body.
async fn read_upload(mut multipart: Multipart) -> AppResult<UploadForm> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut name = None;
    let mut document_type = None;
    let mut category = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        match field.name().unwrap_or_default() {
            "file" => {
                let file_name = field
                    .file_name()
                    .unwrap_or("upload.bin")
                    .to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("failed to read file: {e}")))?;
                file = Some((file_name, mime_type, bytes.to_vec()));
            }
            "name" => name = read_text(field).await?,
            "documentType" => document_type = read_text(field).await?,
            "category" => category = read_text(field).await?,
            _ => {}
        }
    }

    let (file_name, mime_type, bytes) =
        file.ok_or_else(|| AppError::BadRequest("no file uploaded".to_string()))?;

    Ok(UploadForm {
        file_name,
        mime_type,
        bytes,
        meta: NewDocument {
            name,
            document_type: document_type
                .ok_or_else(|| AppError::BadRequest("documentType is required".to_string()))?,
            category,
        },
    })
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> AppResult<Option<String>> {
    let value = field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart field: {e}")))?;
    Ok(Some(value).filter(|v| !v.trim().is_empty()))
}

async fn upload_document(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(case_id): Path<Uuid>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DocumentWithUploader>)> {
    let form = read_upload(multipart).await?;
    let document = state
        .documents
        .upload(
            case_id,
            form.meta,
            &form.file_name,
            &form.mime_type,
            &form.bytes,
            user.user_id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(document)))
}

async fn list_documents(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
    Query(query): Query<DocumentListQuery>,
) -> AppResult<Json<Page<DocumentWithUploader>>> {
    let page = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve(DOCUMENT_DEFAULT_LIMIT);
    let filter = DocumentFilter {
        search: query.search,
        document_type: query.document_type,
        category: query.category,
    };
    Ok(Json(state.documents.list(case_id, filter, page).await?))
}

async fn get_document(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> AppResult<Json<DocumentWithUploader>> {
    Ok(Json(state.documents.get(document_id).await?))
}

async fn delete_document(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    state.documents.delete(document_id).await?;
    Ok(Json(SuccessResponse::with_id("document deleted", document_id)))
}

async fn document_summary(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
) -> AppResult<Json<DocumentSummary>> {
    Ok(Json(state.documents.summary(case_id).await?))
}
