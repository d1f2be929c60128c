//! Upload pipeline.
//!
//! Transmits a locally acquired image to the hosted media service and
//! returns the durable URL the service assigns. One multipart POST per
//! attempt; there is no retry, chunking, or resumability, and a non-success
//! status is a hard failure for the attempt.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use tracing::{debug, info};

use crate::config::{Config, MediaConfig};
use crate::error::{Error, Result};
use crate::session::service_error_message;

/// File name given to the uploaded part.
const UPLOAD_FILE_NAME: &str = "photo.jpg";

/// MIME type of uploaded images.
const UPLOAD_MIME: &str = "image/jpeg";

/// A client that turns a local image into a durable, resolvable URL.
#[async_trait::async_trait]
pub trait ImageUploader: Send + Sync {
    /// Upload the image at `path` and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UploadFailed`] for network faults, non-2xx
    /// responses, and malformed response bodies.
    async fn upload(&self, path: &Path) -> Result<String>;
}

/// Media host client posting `{file, upload_preset, folder}` multipart
/// bodies to a Cloudinary-style upload endpoint.
#[derive(Debug, Clone)]
pub struct MediaUploader {
    client: reqwest::Client,
    media: MediaConfig,
}

impl MediaUploader {
    /// Create an uploader for the given media host configuration.
    #[must_use]
    pub fn new(media: MediaConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            media,
        }
    }

    /// Create an uploader from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload credentials are not configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.require_media()?;
        Ok(Self::new(config.media.clone()))
    }

    /// The full upload endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}/image/upload",
            self.media.api_base.trim_end_matches('/'),
            self.media.cloud_name
        )
    }
}

#[async_trait::async_trait]
impl ImageUploader for MediaUploader {
    async fn upload(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path).await?;
        debug!(
            "uploading {} ({} bytes) to {}",
            path.display(),
            bytes.len(),
            self.endpoint()
        );

        let file_part = Part::bytes(bytes)
            .file_name(UPLOAD_FILE_NAME)
            .mime_str(UPLOAD_MIME)
            .map_err(|err| Error::upload_failed(err.to_string()))?;
        let form = Form::new()
            .part("file", file_part)
            .text("upload_preset", self.media.upload_preset.clone())
            .text("folder", self.media.folder.clone());

        let response = self
            .client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await
            .map_err(|err| Error::upload_failed(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| Error::upload_failed(err.to_string()))?;

        let url = parse_upload_response(status, &body)?;
        info!("uploaded {} -> {url}", path.display());
        Ok(url)
    }
}

/// Extract the secure URL from an upload response.
///
/// # Errors
///
/// Returns [`Error::UploadFailed`] for non-success statuses (carrying the
/// service's `error.message` when the body has one) and for success bodies
/// missing a `secure_url`.
pub fn parse_upload_response(status: reqwest::StatusCode, body: &str) -> Result<String> {
    if !status.is_success() {
        let message = service_error_message(body)
            .unwrap_or_else(|| format!("media host returned {status}"));
        return Err(Error::upload_failed(message));
    }

    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|err| Error::upload_failed(format!("malformed response: {err}")))?;
    value
        .get("secure_url")
        .and_then(serde_json::Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| Error::upload_failed("response has no secure_url".to_string()))
}
