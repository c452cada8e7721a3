//! Generative model integration
//!
//! Wraps Gemini's `generateContent` API behind [`ModelService`] so the pipeline can run
//! against either a real model configuration or a mock.

pub mod gemini;
pub mod mime;
pub mod mock;

pub use gemini::{GeminiModelClient, ModelConfig};
pub use mock::MockModelClient;

use crate::prompts::Prompt;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ModelService: Send + Sync {
    /// Send the prompt in a single non-streaming call and return the raw output text.
    async fn generate(&self, prompt: &Prompt) -> Result<String>;

    /// Bare model ID, used for logging.
    fn model(&self) -> &str;
}
