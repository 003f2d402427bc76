//! S3 storage for generated images and reel audio.
//!
//! Supports both AWS S3 and MinIO for development. Objects are served from a
//! public base URL, so uploads return the URL clients can load directly.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use tracing::info;
use uuid::Uuid;

use crate::config::StorageSettings;
use crate::error::{AppError, AppResult};

/// Public object store used by the pipeline.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload bytes under `key` and return the object's public URL.
    async fn put_public(&self, key: &str, data: Vec<u8>, content_type: &str) -> AppResult<String>;
}

/// S3 storage client wrapper.
#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
    public_url: String,
}

impl Storage {
    /// Create a new S3 storage client from configuration.
    pub async fn new(config: &StorageSettings) -> AppResult<Self> {
        let credentials =
            Credentials::new(&config.access_key, &config.secret_key, None, None, "fstudio");

        let region = Region::new(config.region.clone());

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(region)
            .credentials_provider(credentials)
            .force_path_style(true); // Required for MinIO

        if let Some(ref endpoint) = config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());

        let storage = Self {
            client,
            bucket: config.bucket.clone(),
            public_url: config.public_url.trim_end_matches('/').to_string(),
        };

        storage.ensure_bucket_exists().await?;

        info!(bucket = %config.bucket, "S3 storage initialized");

        Ok(storage)
    }

    /// Ensure the bucket exists, creating it if necessary.
    async fn ensure_bucket_exists(&self) -> AppResult<()> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Ok(()),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    info!(bucket = %self.bucket, "Creating S3 bucket");
                    self.client
                        .create_bucket()
                        .bucket(&self.bucket)
                        .send()
                        .await
                        .map_err(|e| {
                            AppError::Storage(format!("Failed to create bucket: {}", e))
                        })?;
                    Ok(())
                } else {
                    Err(AppError::Storage(format!(
                        "Failed to access bucket '{}': {}",
                        self.bucket, service_error
                    )))
                }
            }
        }
    }

    /// Public URL of an object key.
    pub fn public_url_for(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_url, self.bucket, key)
    }
}

#[async_trait]
impl ObjectStore for Storage {
    async fn put_public(&self, key: &str, data: Vec<u8>, content_type: &str) -> AppResult<String> {
        let body = aws_sdk_s3::primitives::ByteStream::from(data);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to upload {}: {}", key, e)))?;

        Ok(self.public_url_for(key))
    }
}

/// File extension for an image MIME type.
pub fn extension_for_content_type(content_type: &str) -> &'static str {
    match content_type.to_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "audio/mpeg" => "mp3",
        _ => "png",
    }
}

/// Key for a generated image.
///
/// Format: `generated-images/{user}/{unix_ms}-{random}-{suffix}.{ext}`. The
/// timestamp plus random token keeps concurrent uploads within one job apart.
pub fn generated_image_key(user_id: Uuid, suffix: &str, ext: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let token = rand::random::<u32>();
    format!(
        "generated-images/{}/{}-{:08x}-{}.{}",
        user_id,
        millis,
        token,
        sanitize_segment(suffix),
        ext
    )
}

/// Key for reel audio. `kind` is `voiceover` or `music`.
pub fn reel_asset_key(user_id: Uuid, reel_id: Uuid, kind: &str) -> String {
    format!("reel-assets/{}/{}-{}.mp3", user_id, reel_id, kind)
}

/// Keep keys to `[a-z0-9_-]`.
fn sanitize_segment(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}
