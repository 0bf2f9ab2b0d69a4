use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Cv,
    ProjectReport,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Cv => "cv",
            DocumentType::ProjectReport => "project_report",
        }
    }
}

/// Metadata for an uploaded file. `file_path` is the object-storage key.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentRow {
    pub id: Uuid,
    pub filename: String,
    pub file_path: String,
    pub doc_type: String,
    pub file_size: i64,
    pub uploaded_at: DateTime<Utc>,
}

impl DocumentRow {
    pub fn is(&self, doc_type: DocumentType) -> bool {
        self.doc_type == doc_type.as_str()
    }
}
