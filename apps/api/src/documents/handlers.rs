use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::documents::storage::ObjectStorage;
use crate::documents::validation::{validate_content_type, validate_file_size, validate_filename};
use crate::errors::AppError;
use crate::models::document::{DocumentRow, DocumentType};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub cv_id: Uuid,
    pub report_id: Uuid,
    pub message: String,
}

struct UploadedFile {
    filename: String,
    content_type: Option<String>,
    data: Bytes,
}

/// POST /upload
///
/// Multipart form with a `cv` and a `project_report` PDF.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut cv: Option<UploadedFile> = None;
    let mut report: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let slot = match name.as_str() {
            "cv" => &mut cv,
            "project_report" => &mut report,
            _ => continue,
        };
        let filename = field.file_name().unwrap_or_default().to_owned();
        let content_type = field.content_type().map(str::to_owned);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read {name}: {e}")))?;
        *slot = Some(UploadedFile {
            filename,
            content_type,
            data,
        });
    }

    let cv = cv.ok_or_else(|| AppError::Validation("CV file is required".to_string()))?;
    let report = report
        .ok_or_else(|| AppError::Validation("Project report file is required".to_string()))?;

    validate_upload(&cv).map_err(|e| AppError::Validation(format!("CV validation failed: {e}")))?;
    validate_upload(&report)
        .map_err(|e| AppError::Validation(format!("Project report validation failed: {e}")))?;

    let cv_id = save_document(&state, cv, DocumentType::Cv).await?;
    let report_id = save_document(&state, report, DocumentType::ProjectReport).await?;

    Ok(Json(UploadResponse {
        cv_id,
        report_id,
        message: "Files uploaded successfully".to_string(),
    }))
}

fn validate_upload(file: &UploadedFile) -> Result<(), String> {
    validate_filename(&file.filename)?;
    validate_file_size(file.data.len())?;
    validate_content_type(file.content_type.as_deref())
}

/// Stores the object, then records its metadata. The object is removed if
/// the metadata insert fails.
async fn save_document(
    state: &AppState,
    file: UploadedFile,
    doc_type: DocumentType,
) -> Result<Uuid, AppError> {
    let id = Uuid::new_v4();
    let key = ObjectStorage::key_for(id);
    let file_size = file.data.len() as i64;

    state
        .storage
        .put_pdf(&key, file.data)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

    let row = DocumentRow {
        id,
        filename: file.filename,
        file_path: key.clone(),
        doc_type: doc_type.as_str().to_string(),
        file_size,
        uploaded_at: Utc::now(),
    };

    if let Err(e) = state.documents.create(&row).await {
        if let Err(cleanup) = state.storage.delete(&key).await {
            warn!("Orphaned object {key} after failed insert: {cleanup}");
        }
        return Err(AppError::Database(e));
    }

    info!("Stored {} document {} ({} bytes)", doc_type.as_str(), id, file_size);
    Ok(id)
}
