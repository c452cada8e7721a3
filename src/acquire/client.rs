use super::{pdf, ContentAcquirer};
use crate::ai::mime::{detect_image_mime, split_data_url};
use crate::models::{Config, ImagePayload, ImageSource};
use crate::{Error, Result};
use async_trait::async_trait;
use base64::Engine as _;
use reqwest::Client;
use std::path::{Path, PathBuf};

/// Fetches leaflets over HTTP and reads prescription images from local storage.
pub struct HttpContentAcquirer {
    client: Client,
    image_root: Option<PathBuf>,
    max_pdf_bytes: usize,
}

impl HttpContentAcquirer {
    pub fn new() -> Self {
        Self::new_with_client(Client::new())
    }

    pub fn new_with_client(client: Client) -> Self {
        Self {
            client,
            image_root: None,
            max_pdf_bytes: Config::DEFAULT_MAX_PDF_BYTES,
        }
    }

    /// Abort leaflet downloads larger than `limit` bytes.
    pub fn with_max_pdf_bytes(mut self, limit: usize) -> Self {
        self.max_pdf_bytes = limit;
        self
    }

    /// Confine `imagePath` reads to files under `root`. Relative paths resolve against it.
    pub fn with_image_root(mut self, root: Option<PathBuf>) -> Self {
        self.image_root = root;
        self
    }

    async fn resolve_image_path(&self, path: &Path) -> Result<PathBuf> {
        let Some(root) = &self.image_root else {
            return Ok(path.to_path_buf());
        };

        let unreadable = |e: std::io::Error| {
            Error::Acquisition(format!("Cannot read image {}: {}", path.display(), e))
        };
        let root = tokio::fs::canonicalize(root).await.map_err(unreadable)?;
        let resolved = tokio::fs::canonicalize(root.join(path))
            .await
            .map_err(unreadable)?;

        if !resolved.starts_with(&root) {
            tracing::warn!(
                "Rejected image path {} outside of {}",
                path.display(),
                root.display()
            );
            return Err(Error::Acquisition(format!(
                "Image path {} is outside the allowed directory",
                path.display()
            )));
        }

        Ok(resolved)
    }

    async fn read_image_file(&self, path: &Path, mime_type: Option<&str>) -> Result<ImagePayload> {
        let resolved = self.resolve_image_path(path).await?;
        let bytes = tokio::fs::read(&resolved).await.map_err(|e| {
            Error::Acquisition(format!("Cannot read image {}: {}", path.display(), e))
        })?;

        tracing::debug!("Read image {} ({} bytes)", resolved.display(), bytes.len());

        Ok(ImagePayload {
            mime_type: mime_type
                .map(str::to_string)
                .unwrap_or_else(|| detect_image_mime(&bytes).to_string()),
            data: base64::engine::general_purpose::STANDARD.encode(&bytes),
        })
    }
}

impl Default for HttpContentAcquirer {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalise caller-supplied base64: accepts a `data:` URL and line-wrapped input.
///
/// MIME precedence: explicit request field, then the data URL header, then the decoded
/// bytes' signature.
fn decode_inline_image(data: &str, mime_type: Option<&str>) -> Result<ImagePayload> {
    let data = data.trim();
    let (url_mime, payload) = match split_data_url(data) {
        Some((mime, payload)) => (Some(mime), payload),
        None => (None, data),
    };

    let cleaned: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&cleaned)
        .map_err(|e| Error::Acquisition(format!("Invalid base64 image data: {}", e)))?;
    if bytes.is_empty() {
        return Err(Error::Acquisition("Image data is empty".to_string()));
    }

    let mime_type = mime_type
        .or(url_mime)
        .map(str::to_string)
        .unwrap_or_else(|| detect_image_mime(&bytes).to_string());

    Ok(ImagePayload {
        data: cleaned,
        mime_type,
    })
}

#[async_trait]
impl ContentAcquirer for HttpContentAcquirer {
    async fn fetch_pdf_text(&self, url: &str) -> Result<String> {
        tracing::debug!("Fetching leaflet PDF from {}", url);

        let mut response = self.client.get(url).send().await.map_err(|e| {
            tracing::error!("Failed to fetch PDF from {}: {}", url, e);
            Error::Acquisition(format!("Failed to fetch PDF: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Acquisition(format!(
                "PDF download failed (status {})",
                status
            )));
        }

        let too_large = || {
            Error::Acquisition(format!(
                "PDF exceeds the {} byte download limit",
                self.max_pdf_bytes
            ))
        };
        if response
            .content_length()
            .is_some_and(|len| len > self.max_pdf_bytes as u64)
        {
            return Err(too_large());
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::Acquisition(format!("Failed to read PDF body: {}", e)))?
        {
            if bytes.len() + chunk.len() > self.max_pdf_bytes {
                return Err(too_large());
            }
            bytes.extend_from_slice(&chunk);
        }

        if !pdf::looks_like_pdf(&bytes) {
            return Err(Error::Acquisition(
                "Downloaded content is not a PDF document".to_string(),
            ));
        }

        let size = bytes.len();
        let text = pdf::extract_text(bytes).await?;
        tracing::info!(
            "Extracted {} characters from leaflet PDF ({} bytes)",
            text.chars().count(),
            size
        );

        Ok(text)
    }

    async fn load_image(&self, source: &ImageSource) -> Result<ImagePayload> {
        match source {
            ImageSource::Base64 { data, mime_type } => {
                decode_inline_image(data, mime_type.as_deref())
            }
            ImageSource::Path { path, mime_type } => {
                self.read_image_file(path, mime_type.as_deref()).await
            }
        }
    }
}
