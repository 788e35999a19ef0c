use crate::traits::{
    ObjectBody, ObjectPresence, Storage, StorageError, StorageResult, TransferProgress,
    UPLOAD_CHUNK_SIZE,
};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
    Result as ObjectResult,
};
use reelvault_core::StorageConfig;
use tokio::io::AsyncReadExt;

/// Prefix listed by [`S3Storage::probe`]. Nothing is ever written under it.
const PROBE_PREFIX: &str = ".reelvault-probe";

/// S3 storage implementation
///
/// Works against AWS S3 and S3-compatible providers such as Cloudflare R2 or MinIO.
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (`auto` for R2)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "https://{account}.r2.cloudflarestorage.com", "http://localhost:9000" for MinIO)
    /// * `credentials` - Optional access key pair; falls back to the AWS environment variables
    pub fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        credentials: Option<(String, String)>,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        if let Some((access_key_id, secret_access_key)) = credentials {
            builder = builder
                .with_access_key_id(access_key_id)
                .with_secret_access_key(secret_access_key);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store,
            bucket,
            region,
            endpoint_url,
        })
    }

    pub fn from_config(config: &StorageConfig) -> StorageResult<Self> {
        let bucket = config
            .bucket
            .clone()
            .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;

        let credentials = match (&config.access_key_id, &config.secret_access_key) {
            (Some(id), Some(secret)) => Some((id.clone(), secret.clone())),
            _ => None,
        };

        Self::new(
            bucket,
            config.region.clone(),
            config.endpoint.clone(),
            credentials,
        )
    }

    fn content_attributes(content_type: &str) -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        attributes
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn head_object(&self, key: &str) -> StorageResult<ObjectPresence> {
        let location = Path::from(key);
        match self.store.head(&location).await {
            Ok(_) => Ok(ObjectPresence::Present),
            Err(ObjectStoreError::NotFound { .. }) => Ok(ObjectPresence::Absent),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn put_object(
        &self,
        key: &str,
        mut body: ObjectBody,
        content_length: u64,
        content_type: &str,
        progress: &dyn TransferProgress,
    ) -> StorageResult<u64> {
        let start = std::time::Instant::now();
        let location = Path::from(key);

        // Single-request PUT: the body is staged chunk by chunk into the payload.
        let mut chunks: Vec<Bytes> = Vec::new();
        let mut sent: u64 = 0;
        loop {
            let mut buf = BytesMut::with_capacity(UPLOAD_CHUNK_SIZE);
            let read = body.read_buf(&mut buf).await.map_err(|e| {
                StorageError::UploadFailed(format!("Failed to read upload body: {}", e))
            })?;
            if read == 0 {
                break;
            }
            sent += read as u64;
            chunks.push(buf.freeze());
        }

        let payload: PutPayload = chunks.into_iter().collect();
        let opts = PutOptions {
            attributes: Self::content_attributes(content_type),
            ..Default::default()
        };

        let result: ObjectResult<_> =
            ObjectStore::put_opts(&self.store, &location, payload, opts).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = sent,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            put_error(e)
        })?;
        // The request either landed whole or not at all.
        progress.on_progress(sent);

        if sent != content_length {
            tracing::warn!(
                key = %key,
                expected_bytes = content_length,
                size_bytes = sent,
                "Uploaded size differs from the size seen at scan time"
            );
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            content_type = %content_type,
            size_bytes = sent,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(sent)
    }

    async fn probe(&self) -> StorageResult<()> {
        // Listing touches the bucket itself, so a wrong bucket name fails here
        // instead of looking like an empty one.
        let prefix = Path::from(PROBE_PREFIX);
        match self.store.list_with_delimiter(Some(&prefix)).await {
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    region = %self.region,
                    endpoint = ?self.endpoint_url,
                    "S3 probe failed"
                );
                Err(StorageError::Unreachable(e.to_string()))
            }
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }

    fn location(&self) -> String {
        match &self.endpoint_url {
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), self.bucket),
            None => format!("s3://{}", self.bucket),
        }
    }
}

/// Errors that will repeat for every key (missing bucket, rejected credentials) are
/// configuration errors; anything else is specific to this upload.
fn put_error(e: ObjectStoreError) -> StorageError {
    match e {
        ObjectStoreError::NotFound { .. }
        | ObjectStoreError::PermissionDenied { .. }
        | ObjectStoreError::Unauthenticated { .. } => StorageError::ConfigError(e.to_string()),
        other => StorageError::UploadFailed(other.to_string()),
    }
}
