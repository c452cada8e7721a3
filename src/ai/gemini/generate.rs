use super::client::GeminiHttpClient;
use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, HarmBlockThreshold, HarmCategory,
    InlineData, Part, SafetySetting,
};
use crate::ai::ModelService;
use crate::prompts::Prompt;
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

/// A model identifier paired with its content-safety threshold overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub model: String,
    pub safety_settings: Vec<SafetySetting>,
}

impl ModelConfig {
    /// Text-only configuration with the provider's default safety settings.
    pub fn text(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            safety_settings: Vec::new(),
        }
    }

    /// Vision configuration. Prescription scans carry dosage text that the default
    /// dangerous-content filter tends to refuse, so that category is not blocked.
    pub fn vision(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            safety_settings: vec![SafetySetting {
                category: HarmCategory::DangerousContent,
                threshold: HarmBlockThreshold::BlockNone,
            }],
        }
    }
}

/// One immutable Gemini model configuration. Safe to share across concurrent requests.
pub struct GeminiModelClient {
    http: GeminiHttpClient,
    safety_settings: Vec<SafetySetting>,
}

impl GeminiModelClient {
    pub fn new(api_key: String, config: ModelConfig) -> Self {
        Self::new_with_client(api_key, config, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, config: ModelConfig, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(api_key, config.model, client),
            safety_settings: config.safety_settings,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    fn build_request(&self, prompt: &Prompt) -> GenerateContentRequest {
        let mut parts = vec![Part::Text {
            text: prompt.content.clone(),
        }];
        if let Some(image) = &prompt.image {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.data.clone(),
                },
            });
        }

        GenerateContentRequest {
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::Text {
                    text: prompt.instruction.clone(),
                }],
            }),
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            safety_settings: self.safety_settings.clone(),
        }
    }

    /// Concatenate the text parts of the first candidate.
    fn extract_text(response: GenerateContentResponse) -> Result<String> {
        let Some(candidate) = response.candidates.into_iter().next() else {
            let reason = response
                .prompt_feedback
                .and_then(|feedback| feedback.block_reason);
            return Err(match reason {
                Some(reason) => {
                    Error::ModelInvocation(format!("Prompt was blocked by Gemini: {}", reason))
                }
                None => Error::ModelInvocation("No candidates in Gemini response".to_string()),
            });
        };

        let texts: Vec<String> = candidate
            .content
            .map(|content| content.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| match part {
                Part::Text { text } => Some(text),
                Part::InlineData { .. } => None,
            })
            .collect();

        if texts.is_empty() {
            return Err(Error::ModelInvocation(match candidate.finish_reason {
                Some(reason) => format!("Gemini returned no text (finish reason: {})", reason),
                None => "No text in Gemini response".to_string(),
            }));
        }

        Ok(texts.concat())
    }
}

#[async_trait]
impl ModelService for GeminiModelClient {
    async fn generate(&self, prompt: &Prompt) -> Result<String> {
        tracing::debug!(
            "Sending {} prompt to Gemini model {} (image attached: {})",
            prompt.task,
            self.http.model(),
            prompt.image.is_some()
        );

        let request = self.build_request(prompt);
        let response: GenerateContentResponse = self.http.generate_content(&request).await?;
        Self::extract_text(response)
    }

    fn model(&self) -> &str {
        self.http.model()
    }
}
