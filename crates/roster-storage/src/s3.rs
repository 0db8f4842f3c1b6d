use crate::keys::validate_key;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
    Result as ObjectResult,
};
use std::time::Duration;

const DEFAULT_REGION: &str = "us-east-1";

/// S3-compatible object storage.
///
/// Objects are private; reads go through short-lived signed GET URLs that are
/// generated again on every resolve.
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    signed_url_ttl: Duration,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - bucket name
    /// * `region` - region identifier, defaults to `us-east-1`
    /// * `endpoint_url` - custom endpoint for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO, "https://s3.us-west-004.backblazeb2.com" for B2)
    /// * `signed_url_ttl` - lifetime of URLs handed out by `url_for`
    pub fn new(
        bucket: String,
        region: Option<String>,
        endpoint_url: Option<String>,
        signed_url_ttl: Duration,
    ) -> StorageResult<Self> {
        let builder = AmazonS3Builder::from_env();
        Self::from_builder(builder, bucket, region, endpoint_url, signed_url_ttl)
    }

    /// Build on top of an existing builder, e.g. one carrying explicit credentials.
    pub fn from_builder(
        builder: AmazonS3Builder,
        bucket: String,
        region: Option<String>,
        endpoint_url: Option<String>,
        signed_url_ttl: Duration,
    ) -> StorageResult<Self> {
        let mut builder = builder
            .with_region(region.unwrap_or_else(|| DEFAULT_REGION.to_string()))
            .with_bucket_name(bucket.clone());

        // Path-style addressing is the builder default, which S3-compatible providers expect.
        if let Some(endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder.with_endpoint(endpoint).with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store,
            bucket,
            signed_url_ttl,
        })
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()> {
        validate_key(storage_key)?;
        let size = data.len() as u64;
        let location = Path::from(storage_key.to_string());
        let options = PutOptions::from(Attributes::from_iter([(
            Attribute::ContentType,
            content_type.to_string(),
        )]));
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self
            .store
            .put_opts(&location, PutPayload::from(Bytes::from(data)), options)
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %storage_key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(())
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        validate_key(storage_key)?;
        let location = Path::from(storage_key.to_string());

        let result: ObjectResult<_> = self.store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(storage_key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %storage_key,
                    "S3 download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        Ok(bytes.to_vec())
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        validate_key(storage_key)?;
        let location = Path::from(storage_key.to_string());

        let result: ObjectResult<_> = self.store.delete(&location).await;

        match result {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {}
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %storage_key,
                    "S3 delete failed"
                );
                return Err(StorageError::DeleteFailed(e.to_string()));
            }
        }

        tracing::info!(bucket = %self.bucket, key = %storage_key, "S3 delete successful");

        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        validate_key(storage_key)?;
        let location = Path::from(storage_key.to_string());
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn url_for(&self, storage_key: &str) -> StorageResult<String> {
        validate_key(storage_key)?;
        let location = Path::from(storage_key.to_string());
        let url_result: ObjectResult<_> = self
            .store
            .signed_url(Method::GET, &location, self.signed_url_ttl)
            .await;

        let url = url_result
            .map_err(|e| StorageError::BackendError(e.to_string()))?
            .to_string();

        Ok(url)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> S3Storage {
        let builder = AmazonS3Builder::new()
            .with_access_key_id("test-access-key")
            .with_secret_access_key("test-secret-key");
        S3Storage::from_builder(
            builder,
            "member-photos".to_string(),
            Some("us-west-004".to_string()),
            Some("http://localhost:9000".to_string()),
            Duration::from_secs(3600),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_resolve_signs_path_style_url() {
        let storage = storage();
        let url = storage
            .resolve(Some("profileimages/photo-1-abc.jpg"))
            .await
            .unwrap();

        assert!(url.starts_with("http://localhost:9000/member-photos/profileimages/photo-1-abc.jpg"));
        assert!(url.contains("X-Amz-Signature="));
        assert!(url.contains("X-Amz-Expires=3600"));
    }

    #[tokio::test]
    async fn test_resolve_blank_and_invalid_keys() {
        let storage = storage();
        assert_eq!(storage.resolve(None).await, None);
        assert_eq!(storage.resolve(Some("")).await, None);
        assert_eq!(storage.resolve(Some("../escape.jpg")).await, None);
    }

    #[test]
    fn test_backend_type() {
        assert_eq!(storage().backend_type(), StorageBackend::S3);
    }
}
