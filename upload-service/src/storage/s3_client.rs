// S3/MinIO client implementation

use async_trait::async_trait;
use aws_sdk_s3::{
    config::{Credentials, Region},
    error::DisplayErrorContext,
    primitives::ByteStream,
    types::{ObjectCannedAcl, ServerSideEncryption, StorageClass},
    Client,
};
use bytes::Bytes;
use tracing::{info, instrument};

use super::backend::{ObjectBackend, PutObjectRequest};
use super::error::{StorageError, StorageResult};

/// Connection settings for the S3 client
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub region: String,
    /// Custom endpoint for S3-compatible stores (MinIO etc.); forces path-style addressing
    pub endpoint_url: Option<String>,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// One long-lived S3 client shared by every request.
#[derive(Debug, Clone)]
pub struct S3Backend {
    client: Client,
}

impl S3Backend {
    pub async fn new(settings: &S3Settings) -> Self {
        let credentials = Credentials::new(
            settings.access_key_id.clone(),
            settings.secret_access_key.clone(),
            None,
            None,
            "upload-service-static",
        );

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &settings.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        info!(
            region = %settings.region,
            endpoint = ?settings.endpoint_url,
            "S3 client initialised"
        );

        Self {
            client: Client::from_conf(builder.build()),
        }
    }
}

#[async_trait]
impl ObjectBackend for S3Backend {
    #[instrument(skip(self, request), fields(bucket = %request.bucket, key = %request.key))]
    async fn put_object(&self, request: PutObjectRequest) -> StorageResult<()> {
        let PutObjectRequest {
            bucket,
            key,
            body,
            content_type,
            content_disposition,
            public_read,
            server_side_encryption,
            storage_class,
        } = request;

        let mut put = self
            .client
            .put_object()
            .bucket(bucket)
            .key(&key)
            .content_length(body.len() as i64)
            .content_type(content_type)
            .content_disposition(content_disposition)
            .storage_class(StorageClass::from(storage_class.as_str()))
            .body(ByteStream::from(body));

        if public_read {
            put = put.acl(ObjectCannedAcl::PublicRead);
        }
        if server_side_encryption {
            put = put.server_side_encryption(ServerSideEncryption::Aes256);
        }

        put.send().await.map_err(|e| StorageError::Backend {
            operation: "PutObject",
            key,
            message: DisplayErrorContext(&e).to_string(),
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_object(&self, bucket: &str, key: &str, max_bytes: u64) -> StorageResult<Bytes> {
        let backend_error = |message: String| StorageError::Backend {
            operation: "GetObject",
            key: key.to_string(),
            message,
        };

        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| backend_error(DisplayErrorContext(&e).to_string()))?;

        let declared = resp.content_length().unwrap_or_default().max(0) as u64;
        if declared > max_bytes {
            return Err(StorageError::TooLarge {
                key: key.to_string(),
                size: declared,
                limit: max_bytes,
            });
        }

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| backend_error(format!("read body: {e}")))?
            .into_bytes();

        if data.len() as u64 > max_bytes {
            return Err(StorageError::TooLarge {
                key: key.to_string(),
                size: data.len() as u64,
                limit: max_bytes,
            });
        }

        Ok(data)
    }
}
