//! External asset host client.
//!
//! Registration delegates avatar/cover uploads to a third-party asset host;
//! only the hosted URL is persisted. The host is reached over HTTPS with
//! credentials supplied by configuration.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Asset host connection settings.
#[derive(Debug, Clone)]
pub struct AssetHostConfig {
    /// Base URL of the asset host API.
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
}

/// An uploaded file received from a client, ready for delegation.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// A successfully hosted asset.
#[derive(Debug, Clone)]
pub struct MediaAsset {
    /// Public URL of the hosted asset.
    pub url: String,
}

/// Media upload errors.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("asset host request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("asset host rejected the upload: status {status}")]
    Rejected { status: u16 },
}

/// Storage abstraction for hosted media assets.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Upload a file and return its hosted location.
    async fn upload(&self, upload: &MediaUpload) -> Result<MediaAsset, MediaError>;
}

/// HTTP client for the external asset host.
pub struct AssetHostClient {
    client: reqwest::Client,
    config: AssetHostConfig,
}

impl AssetHostClient {
    pub fn new(config: AssetHostConfig) -> Result<Self, MediaError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client, config })
    }

    fn upload_url(&self) -> String {
        format!("{}/upload", self.config.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct UploadReply {
    url: String,
}

#[async_trait]
impl MediaStorage for AssetHostClient {
    async fn upload(&self, upload: &MediaUpload) -> Result<MediaAsset, MediaError> {
        let part = reqwest::multipart::Part::bytes(upload.data.to_vec())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.upload_url())
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::Rejected {
                status: status.as_u16(),
            });
        }

        let reply: UploadReply = response.json().await?;
        debug!(url = %reply.url, file_name = %upload.file_name, "asset uploaded");

        Ok(MediaAsset { url: reply.url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> AssetHostClient {
        AssetHostClient::new(AssetHostConfig {
            base_url: base_url.to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
        })
        .expect("client should build")
    }

    #[test]
    fn test_upload_url_joins_cleanly() {
        assert_eq!(
            test_client("https://assets.example.com").upload_url(),
            "https://assets.example.com/upload"
        );
        assert_eq!(
            test_client("https://assets.example.com/").upload_url(),
            "https://assets.example.com/upload"
        );
    }
}
