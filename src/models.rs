//! Data models and structures
//!
//! Defines the endpoint request bodies, the validated request union that drives the
//! extraction pipeline, the per-endpoint response shapes, and service configuration.

use crate::ai::gemini::DEFAULT_BASE_URL;
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// The four extraction pipelines exposed by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionTask {
    LeafletAnalysis,
    InteractionCheck,
    SideEffectCheck,
    PrescriptionImageAnalysis,
}

/// Which of the two model configurations a task runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Text,
    Vision,
}

impl ExtractionTask {
    pub fn path(self) -> &'static str {
        match self {
            ExtractionTask::LeafletAnalysis => "/leaflet-analysis",
            ExtractionTask::InteractionCheck => "/interaction-check",
            ExtractionTask::SideEffectCheck => "/side-effect-check",
            ExtractionTask::PrescriptionImageAnalysis => "/prescription-image",
        }
    }

    pub fn model_kind(self) -> ModelKind {
        match self {
            ExtractionTask::PrescriptionImageAnalysis => ModelKind::Vision,
            _ => ModelKind::Text,
        }
    }

    /// Diagnostic returned to the caller when required fields are missing.
    pub fn validation_message(self) -> &'static str {
        match self {
            ExtractionTask::LeafletAnalysis => "pdfUrl eksik",
            ExtractionTask::InteractionCheck => "Eksik bilgi: 'drugA' ve 'drugB' gereklidir.",
            ExtractionTask::SideEffectCheck => "Eksik bilgi: 'sideEffect' ve 'drug' gereklidir.",
            ExtractionTask::PrescriptionImageAnalysis => {
                "imageBase64 veya imagePath belirtmelisiniz."
            }
        }
    }

    /// Prefix placed before the underlying message on runtime failures.
    pub fn failure_prefix(self) -> &'static str {
        match self {
            ExtractionTask::LeafletAnalysis | ExtractionTask::PrescriptionImageAnalysis => {
                "Bir hata oluştu: "
            }
            ExtractionTask::InteractionCheck | ExtractionTask::SideEffectCheck => "Hata: ",
        }
    }
}

impl std::fmt::Display for ExtractionTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path().trim_start_matches('/'))
    }
}

/// Where the prescription image comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Base64 {
        data: String,
        mime_type: Option<String>,
    },
    Path {
        path: PathBuf,
        mime_type: Option<String>,
    },
}

/// A request that passed boundary validation. Exactly one variant per call.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionRequest {
    Leaflet { pdf_url: String },
    Interaction { drug_a: String, drug_b: String },
    SideEffect { drug: String, side_effect: String },
    PrescriptionImage(ImageSource),
}

impl ExtractionRequest {
    pub fn task(&self) -> ExtractionTask {
        match self {
            ExtractionRequest::Leaflet { .. } => ExtractionTask::LeafletAnalysis,
            ExtractionRequest::Interaction { .. } => ExtractionTask::InteractionCheck,
            ExtractionRequest::SideEffect { .. } => ExtractionTask::SideEffectCheck,
            ExtractionRequest::PrescriptionImage(_) => ExtractionTask::PrescriptionImageAnalysis,
        }
    }
}

/// Base64 inline image with its MIME type, ready to attach to a model request.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePayload {
    pub data: String,
    pub mime_type: String,
}

/// Acquired input, discarded once the prompt has been built.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedContent {
    LeafletText(String),
    DrugPair { drug_a: String, drug_b: String },
    SideEffect { drug: String, side_effect: String },
    Image(ImagePayload),
}

impl NormalizedContent {
    pub fn task(&self) -> ExtractionTask {
        match self {
            NormalizedContent::LeafletText(_) => ExtractionTask::LeafletAnalysis,
            NormalizedContent::DrugPair { .. } => ExtractionTask::InteractionCheck,
            NormalizedContent::SideEffect { .. } => ExtractionTask::SideEffectCheck,
            NormalizedContent::Image(_) => ExtractionTask::PrescriptionImageAnalysis,
        }
    }
}

/// A JSON endpoint body that validates into an [`ExtractionRequest`].
pub trait EndpointRequest: DeserializeOwned + Send {
    const TASK: ExtractionTask;

    fn validate(self) -> Result<ExtractionRequest>;
}

fn missing(task: ExtractionTask) -> Error {
    Error::Validation(task.validation_message().to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LeafletRequest {
    pub pdf_url: Option<String>,
}

impl EndpointRequest for LeafletRequest {
    const TASK: ExtractionTask = ExtractionTask::LeafletAnalysis;

    fn validate(self) -> Result<ExtractionRequest> {
        let pdf_url = non_empty(self.pdf_url).ok_or_else(|| missing(Self::TASK))?;
        Ok(ExtractionRequest::Leaflet { pdf_url })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InteractionRequest {
    pub drug_a: Option<String>,
    pub drug_b: Option<String>,
}

impl EndpointRequest for InteractionRequest {
    const TASK: ExtractionTask = ExtractionTask::InteractionCheck;

    // No emptiness check: absent names are forwarded as empty strings.
    fn validate(self) -> Result<ExtractionRequest> {
        Ok(ExtractionRequest::Interaction {
            drug_a: self.drug_a.unwrap_or_default(),
            drug_b: self.drug_b.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SideEffectRequest {
    pub side_effect: Option<String>,
    pub drug: Option<String>,
}

impl EndpointRequest for SideEffectRequest {
    const TASK: ExtractionTask = ExtractionTask::SideEffectCheck;

    fn validate(self) -> Result<ExtractionRequest> {
        match (non_empty(self.drug), non_empty(self.side_effect)) {
            (Some(drug), Some(side_effect)) => {
                Ok(ExtractionRequest::SideEffect { drug, side_effect })
            }
            _ => Err(missing(Self::TASK)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PrescriptionImageRequest {
    pub image_base64: Option<String>,
    pub image_path: Option<String>,
    pub mime_type: Option<String>,
}

impl EndpointRequest for PrescriptionImageRequest {
    const TASK: ExtractionTask = ExtractionTask::PrescriptionImageAnalysis;

    fn validate(self) -> Result<ExtractionRequest> {
        let mime_type = non_empty(self.mime_type);

        // Inline data wins over a path when both are supplied.
        let source = if let Some(data) = non_empty(self.image_base64) {
            ImageSource::Base64 { data, mime_type }
        } else if let Some(path) = non_empty(self.image_path) {
            ImageSource::Path {
                path: PathBuf::from(path),
                mime_type,
            }
        } else {
            return Err(missing(Self::TASK));
        };

        Ok(ExtractionRequest::PrescriptionImage(source))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InteractionResponse {
    pub interaction_analysis: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SideEffectResponse {
    pub analysis: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionResponse {
    pub parsed_prescription: String,
}

/// Model output wrapped in the shape each endpoint promises its callers.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResponse {
    Leaflet(String),
    Interaction(InteractionResponse),
    SideEffect(SideEffectResponse),
    Prescription(PrescriptionResponse),
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub text_model: String,
    pub vision_model: String,
    pub model_timeout: Option<Duration>,
    pub bind_addr: SocketAddr,
    pub max_body_bytes: usize,
    /// Upper bound on a downloaded leaflet PDF.
    pub max_pdf_bytes: usize,
    /// When set, `imagePath` reads are confined to this directory.
    pub image_root: Option<PathBuf>,
}

impl Config {
    pub const DEFAULT_TEXT_MODEL: &'static str = "gemini-2.5-pro";
    pub const DEFAULT_VISION_MODEL: &'static str = "gemini-1.5-pro-latest";
    pub const DEFAULT_BIND_ADDR: &'static str = "0.0.0.0:8080";
    pub const DEFAULT_MAX_BODY_BYTES: usize = 20 * 1024 * 1024;
    pub const DEFAULT_MAX_PDF_BYTES: usize = 50 * 1024 * 1024;

    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gemini_api_key = lookup("GEMINI_API_KEY")
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::Config("GEMINI_API_KEY not set".to_string()))?;

        let model_timeout = lookup("MODEL_TIMEOUT_SECS")
            .map(|raw| {
                raw.parse::<u64>().map(Duration::from_secs).map_err(|e| {
                    Error::Config(format!("Invalid MODEL_TIMEOUT_SECS '{}': {}", raw, e))
                })
            })
            .transpose()?;

        let bind_raw =
            lookup("BIND_ADDR").unwrap_or_else(|| Self::DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| Error::Config(format!("Invalid BIND_ADDR '{}': {}", bind_raw, e)))?;

        let max_body_bytes = match lookup("MAX_BODY_BYTES") {
            Some(raw) => raw.parse::<usize>().map_err(|e| {
                Error::Config(format!("Invalid MAX_BODY_BYTES '{}': {}", raw, e))
            })?,
            None => Self::DEFAULT_MAX_BODY_BYTES,
        };

        let max_pdf_bytes = match lookup("MAX_PDF_BYTES") {
            Some(raw) => raw.parse::<usize>().map_err(|e| {
                Error::Config(format!("Invalid MAX_PDF_BYTES '{}': {}", raw, e))
            })?,
            None => Self::DEFAULT_MAX_PDF_BYTES,
        };

        Ok(Self {
            gemini_api_key,
            gemini_base_url: lookup("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            text_model: lookup("TEXT_MODEL")
                .unwrap_or_else(|| Self::DEFAULT_TEXT_MODEL.to_string()),
            vision_model: lookup("VISION_MODEL")
                .unwrap_or_else(|| Self::DEFAULT_VISION_MODEL.to_string()),
            model_timeout,
            bind_addr,
            max_body_bytes,
            max_pdf_bytes,
            image_root: lookup("IMAGE_ROOT")
                .filter(|root| !root.is_empty())
                .map(PathBuf::from),
        })
    }
}
