//! Input acquisition
//!
//! Turns validated request input into model-consumable content: leaflet PDFs are downloaded
//! and reduced to plain text, prescription images are resolved to base64 payloads.

pub mod client;
pub mod mock;
pub mod pdf;

pub use client::HttpContentAcquirer;
pub use mock::MockContentAcquirer;

use crate::models::{ImagePayload, ImageSource};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ContentAcquirer: Send + Sync {
    /// Download the PDF at `url` and return its extracted text.
    async fn fetch_pdf_text(&self, url: &str) -> Result<String>;

    /// Resolve an image source to a base64 payload with its MIME type.
    async fn load_image(&self, source: &ImageSource) -> Result<ImagePayload>;
}
