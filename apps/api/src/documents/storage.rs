use anyhow::Result;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

/// S3 / MinIO bucket holding the uploaded PDFs.
#[derive(Clone)]
pub struct ObjectStorage {
    s3: S3Client,
    bucket: String,
}

impl ObjectStorage {
    pub fn new(s3: S3Client, bucket: String) -> Self {
        Self { s3, bucket }
    }

    pub fn key_for(document_id: Uuid) -> String {
        format!("documents/{document_id}.pdf")
    }

    pub async fn put_pdf(&self, key: &str, body: Bytes) -> Result<()> {
        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type("application/pdf")
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("S3 upload failed: {e}"))?;

        info!("Uploaded document to s3://{}/{}", self.bucket, key);
        Ok(())
    }

    pub async fn fetch(&self, key: &str) -> Result<Bytes> {
        let object = self
            .s3
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("S3 download of {key} failed: {e}"))?;

        let data = object
            .body
            .collect()
            .await
            .map_err(|e| anyhow::anyhow!("S3 read of {key} failed: {e}"))?;
        Ok(data.into_bytes())
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        self.s3
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("S3 delete of {key} failed: {e}"))?;
        Ok(())
    }
}
