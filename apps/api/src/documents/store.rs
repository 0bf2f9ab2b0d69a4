use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::document::DocumentRow;

/// Persists uploaded file metadata and returns records by identifier.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create(&self, doc: &DocumentRow) -> Result<(), sqlx::Error>;

    async fn get(&self, id: Uuid) -> Result<Option<DocumentRow>, sqlx::Error>;
}

pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn create(&self, doc: &DocumentRow) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO documents (id, filename, file_path, doc_type, file_size, uploaded_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(doc.id)
        .bind(&doc.filename)
        .bind(&doc.file_path)
        .bind(&doc.doc_type)
        .bind(doc.file_size)
        .bind(doc.uploaded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<DocumentRow>, sqlx::Error> {
        sqlx::query_as::<_, DocumentRow>("SELECT * FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }
}
