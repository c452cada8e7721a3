pub mod client;
pub mod generate;
pub mod types;

pub use client::{GeminiHttpClient, DEFAULT_BASE_URL};
pub use generate::{GeminiModelClient, ModelConfig};
