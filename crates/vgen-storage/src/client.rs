//! R2 client implementation.

use std::path::Path;
use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client;
use tracing::{debug, info, warn};

use crate::error::{StorageError, StorageResult, Transfer};
use crate::keys::content_type_for;

/// S3 caps presigned URL lifetime at seven days.
const MAX_PRESIGN_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

/// DeleteObjects accepts at most this many keys per call.
const DELETE_BATCH: usize = 1000;

#[derive(Debug, Clone)]
pub struct R2Config {
    /// S3 API endpoint
    pub endpoint_url: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket_name: String,
    /// Usually "auto" for R2
    pub region: String,
    /// Public bucket or custom domain; when unset, URLs are presigned
    pub public_base_url: Option<String>,
    pub presign_ttl: Duration,
}

impl R2Config {
    pub fn from_env() -> StorageResult<Self> {
        let required = |key: &str| {
            std::env::var(key)
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| StorageError::config(format!("{} not set", key)))
        };

        Ok(Self {
            endpoint_url: required("R2_ENDPOINT_URL")?,
            access_key_id: required("R2_ACCESS_KEY_ID")?,
            secret_access_key: required("R2_SECRET_ACCESS_KEY")?,
            bucket_name: required("R2_BUCKET_NAME")?,
            region: std::env::var("R2_REGION").unwrap_or_else(|_| "auto".to_string()),
            public_base_url: std::env::var("R2_PUBLIC_BASE_URL")
                .ok()
                .filter(|u| !u.is_empty()),
            presign_ttl: std::env::var("R2_PRESIGN_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(MAX_PRESIGN_TTL)
                .min(MAX_PRESIGN_TTL),
        })
    }
}

/// Cloudflare R2 storage client.
#[derive(Clone)]
pub struct R2Client {
    client: Client,
    bucket: String,
    public_base_url: Option<String>,
    presign_ttl: Duration,
}

impl R2Client {
    pub fn new(config: R2Config) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "r2",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(sdk_config),
            bucket: config.bucket_name,
            public_base_url: config.public_base_url,
            presign_ttl: config.presign_ttl,
        }
    }

    pub fn from_env() -> StorageResult<Self> {
        Ok(Self::new(R2Config::from_env()?))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Upload a local file; the content type follows the key's extension.
    pub async fn upload_file(&self, path: impl AsRef<Path>, key: &str) -> StorageResult<u64> {
        let path = path.as_ref();
        let size = tokio::fs::metadata(path).await?.len();
        debug!(key, size, "Uploading {}", path.display());

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::transfer(Transfer::Upload, key, e))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type_for(key))
            .send()
            .await
            .map_err(|e| StorageError::transfer(Transfer::Upload, key, e))?;

        info!(key, size, "Uploaded object");
        Ok(size)
    }

    async fn get_object(&self, key: &str) -> StorageResult<ByteStream> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(se) if se.is_no_such_key() => StorageError::NotFound(key.to_string()),
                _ => StorageError::transfer(Transfer::Download, key, e),
            })?;
        Ok(response.body)
    }

    /// Stream an object to `path`, creating parent directories.
    pub async fn download_file(&self, key: &str, path: impl AsRef<Path>) -> StorageResult<u64> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut body = self.get_object(key).await?.into_async_read();
        let mut file = tokio::fs::File::create(path).await?;
        let written = tokio::io::copy(&mut body, &mut file).await?;

        debug!(key, written, "Downloaded to {}", path.display());
        Ok(written)
    }

    pub async fn presign_get(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        let presign_config = PresigningConfig::expires_in(expires_in.min(MAX_PRESIGN_TTL))
            .map_err(|e| StorageError::presign(key, e))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::presign(key, e))?;

        Ok(presigned.uri().to_string())
    }

    /// URL clients use to fetch `key`: public when a base URL is
    /// configured, presigned otherwise.
    pub async fn object_url(&self, key: &str) -> StorageResult<String> {
        match &self.public_base_url {
            Some(base) => Ok(public_url(base, key)),
            None => self.presign_get(key, self.presign_ttl).await,
        }
    }

    /// Delete objects in batches. Returns how many keys were submitted.
    pub async fn delete_objects(&self, keys: &[String]) -> StorageResult<usize> {
        if keys.is_empty() {
            return Ok(0);
        }

        for batch in keys.chunks(DELETE_BATCH) {
            let objects = batch
                .iter()
                .map(|k| ObjectIdentifier::builder().key(k).build())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| StorageError::transfer(Transfer::Delete, format!("{} objects", batch.len()), e))?;

            let delete = Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()
                .map_err(|e| StorageError::transfer(Transfer::Delete, format!("{} objects", batch.len()), e))?;

            let output = self
                .client
                .delete_objects()
                .bucket(&self.bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|e| StorageError::transfer(Transfer::Delete, format!("{} objects", batch.len()), e))?;

            for failed in output.errors() {
                warn!(
                    key = failed.key().unwrap_or_default(),
                    error = failed.message().unwrap_or_default(),
                    "Object was not deleted"
                );
            }
        }

        info!(count = keys.len(), "Deleted objects");
        Ok(keys.len())
    }

    pub async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StorageError::Unreachable {
                bucket: self.bucket.clone(),
                message: e.to_string(),
            })?;
        Ok(())
    }
}

fn public_url(base: &str, key: &str) -> String {
    let path = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/{}", base.trim_end_matches('/'), path)
}
