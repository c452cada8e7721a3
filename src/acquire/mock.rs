use super::ContentAcquirer;
use crate::models::{ImagePayload, ImageSource};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// In-memory acquirer double. Clones share state, so a clone can be kept as a spy.
#[derive(Clone)]
pub struct MockContentAcquirer {
    pdf_text: Arc<Mutex<String>>,
    failure: Arc<Mutex<Option<String>>>,
    pdf_urls: Arc<Mutex<Vec<String>>>,
    image_sources: Arc<Mutex<Vec<ImageSource>>>,
}

impl MockContentAcquirer {
    pub fn new() -> Self {
        Self {
            pdf_text: Arc::new(Mutex::new("ETKEN MADDE: parasetamol".to_string())),
            failure: Arc::new(Mutex::new(None)),
            pdf_urls: Arc::new(Mutex::new(Vec::new())),
            image_sources: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_pdf_text(self, text: String) -> Self {
        *self.pdf_text.lock().unwrap() = text;
        self
    }

    /// Make every acquisition fail with `Acquisition(message)`.
    pub fn with_failure(self, message: String) -> Self {
        *self.failure.lock().unwrap() = Some(message);
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.pdf_urls.lock().unwrap().len() + self.image_sources.lock().unwrap().len()
    }

    pub fn fetched_urls(&self) -> Vec<String> {
        self.pdf_urls.lock().unwrap().clone()
    }

    pub fn loaded_images(&self) -> Vec<ImageSource> {
        self.image_sources.lock().unwrap().clone()
    }

    fn check_failure(&self) -> Result<()> {
        match self.failure.lock().unwrap().as_ref() {
            Some(message) => Err(Error::Acquisition(message.clone())),
            None => Ok(()),
        }
    }
}

impl Default for MockContentAcquirer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentAcquirer for MockContentAcquirer {
    async fn fetch_pdf_text(&self, url: &str) -> Result<String> {
        self.pdf_urls.lock().unwrap().push(url.to_string());
        self.check_failure()?;
        Ok(self.pdf_text.lock().unwrap().clone())
    }

    async fn load_image(&self, source: &ImageSource) -> Result<ImagePayload> {
        self.image_sources.lock().unwrap().push(source.clone());
        self.check_failure()?;

        // Inline data is passed through; paths resolve to a fixed tiny JPEG header.
        Ok(match source {
            ImageSource::Base64 { data, mime_type } => ImagePayload {
                data: data.clone(),
                mime_type: mime_type
                    .clone()
                    .unwrap_or_else(|| "image/jpeg".to_string()),
            },
            ImageSource::Path { mime_type, .. } => ImagePayload {
                data: "/9j/4A==".to_string(),
                mime_type: mime_type
                    .clone()
                    .unwrap_or_else(|| "image/jpeg".to_string()),
            },
        })
    }
}
