//! Extraction pipeline: acquire input, build the prompt, invoke the model, relay the output.

use crate::acquire::{ContentAcquirer, HttpContentAcquirer};
use crate::ai::{GeminiModelClient, ModelConfig, ModelService};
use crate::models::{
    Config, ExtractionRequest, ExtractionResponse, ExtractionTask, InteractionResponse, ModelKind,
    NormalizedContent, PrescriptionResponse, SideEffectResponse,
};
use crate::{prompts, Result};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Runs one extraction per call. Holds only read-only services, so a single instance is
/// shared by every concurrent request.
pub struct Pipeline {
    acquirer: Box<dyn ContentAcquirer>,
    text_model: Box<dyn ModelService>,
    vision_model: Box<dyn ModelService>,
}

/// Injectable service bundle used to construct [`Pipeline`] in tests/harnesses.
pub struct PipelineServices {
    pub acquirer: Box<dyn ContentAcquirer>,
    pub text_model: Box<dyn ModelService>,
    pub vision_model: Box<dyn ModelService>,
}

impl Pipeline {
    pub fn with_services(services: PipelineServices) -> Self {
        Self {
            acquirer: services.acquirer,
            text_model: services.text_model,
            vision_model: services.vision_model,
        }
    }

    /// Build the production pipeline: two Gemini configurations and the HTTP acquirer.
    pub fn from_config(config: &Config) -> Self {
        // Reuse one HTTP connection pool across the model clients and the PDF fetcher.
        let http_client = reqwest::Client::new();

        let build_model = |model_config: ModelConfig| {
            info!(
                "Model {} configured with {} safety override(s)",
                model_config.model,
                model_config.safety_settings.len()
            );
            GeminiModelClient::new_with_client(
                config.gemini_api_key.clone(),
                model_config,
                http_client.clone(),
            )
            .with_base_url(config.gemini_base_url.clone())
            .with_timeout(config.model_timeout)
        };

        let text_model = build_model(ModelConfig::text(config.text_model.as_str()));
        let vision_model = build_model(ModelConfig::vision(config.vision_model.as_str()));
        let acquirer = HttpContentAcquirer::new_with_client(http_client.clone())
            .with_image_root(config.image_root.clone())
            .with_max_pdf_bytes(config.max_pdf_bytes);

        Self::with_services(PipelineServices {
            acquirer: Box::new(acquirer),
            text_model: Box::new(text_model),
            vision_model: Box::new(vision_model),
        })
    }

    /// Run a validated request through the pipeline.
    ///
    /// Nothing is cached: identical requests trigger independent acquisitions and model calls.
    pub async fn run(&self, request: ExtractionRequest) -> Result<ExtractionResponse> {
        let request_id = Uuid::new_v4();
        let task = request.task();
        info!("[{}] {} request started", request_id, task);

        match self.execute(request_id, request).await {
            Ok(response) => {
                info!("[{}] {} request completed", request_id, task);
                Ok(response)
            }
            Err(e) => {
                error!("[{}] {} request failed: {:?}", request_id, task, e);
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        request_id: Uuid,
        request: ExtractionRequest,
    ) -> Result<ExtractionResponse> {
        let task = request.task();

        let content = self.acquire(request).await?;
        let prompt = prompts::build(content);

        let model = self.model_for(task);
        debug!(
            "[{}] Invoking {} ({} instruction chars, {} content chars)",
            request_id,
            model.model(),
            prompt.instruction.len(),
            prompt.content.len()
        );

        let output = model.generate(&prompt).await?;
        info!(
            "[{}] Model {} returned {} chars",
            request_id,
            model.model(),
            output.len()
        );

        Ok(relay(task, output))
    }

    async fn acquire(&self, request: ExtractionRequest) -> Result<NormalizedContent> {
        Ok(match request {
            ExtractionRequest::Leaflet { pdf_url } => {
                NormalizedContent::LeafletText(self.acquirer.fetch_pdf_text(&pdf_url).await?)
            }
            ExtractionRequest::Interaction { drug_a, drug_b } => {
                NormalizedContent::DrugPair { drug_a, drug_b }
            }
            ExtractionRequest::SideEffect { drug, side_effect } => {
                NormalizedContent::SideEffect { drug, side_effect }
            }
            ExtractionRequest::PrescriptionImage(source) => {
                NormalizedContent::Image(self.acquirer.load_image(&source).await?)
            }
        })
    }

    fn model_for(&self, task: ExtractionTask) -> &dyn ModelService {
        match task.model_kind() {
            ModelKind::Text => self.text_model.as_ref(),
            ModelKind::Vision => self.vision_model.as_ref(),
        }
    }
}

/// Wrap raw model output in the endpoint's response shape. The text is never parsed.
pub fn relay(task: ExtractionTask, output: String) -> ExtractionResponse {
    match task {
        ExtractionTask::LeafletAnalysis => ExtractionResponse::Leaflet(output),
        ExtractionTask::InteractionCheck => ExtractionResponse::Interaction(InteractionResponse {
            interaction_analysis: output,
        }),
        ExtractionTask::SideEffectCheck => {
            ExtractionResponse::SideEffect(SideEffectResponse { analysis: output })
        }
        ExtractionTask::PrescriptionImageAnalysis => {
            ExtractionResponse::Prescription(PrescriptionResponse {
                parsed_prescription: output,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::MockContentAcquirer;
    use crate::ai::MockModelClient;
    use crate::models::ImageSource;
    use crate::prompts::LEAFLET_FIELDS;
    use crate::Error;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    struct Spies {
        acquirer: MockContentAcquirer,
        text_model: MockModelClient,
        vision_model: MockModelClient,
    }

    fn build_pipeline(
        acquirer: MockContentAcquirer,
        text_model: MockModelClient,
        vision_model: MockModelClient,
    ) -> (Pipeline, Spies) {
        let spies = Spies {
            acquirer: acquirer.clone(),
            text_model: text_model.clone(),
            vision_model: vision_model.clone(),
        };
        let pipeline = Pipeline::with_services(PipelineServices {
            acquirer: Box::new(acquirer),
            text_model: Box::new(text_model),
            vision_model: Box::new(vision_model),
        });
        (pipeline, spies)
    }

    fn default_pipeline() -> (Pipeline, Spies) {
        build_pipeline(
            MockContentAcquirer::new(),
            MockModelClient::new(),
            MockModelClient::new(),
        )
    }

    #[tokio::test]
    async fn test_leaflet_prompt_carries_pdf_text() {
        let (pipeline, spies) = build_pipeline(
            MockContentAcquirer::new().with_pdf_text("ETKEN MADDE: X".to_string()),
            MockModelClient::new(),
            MockModelClient::new(),
        );

        pipeline
            .run(ExtractionRequest::Leaflet {
                pdf_url: "https://example.com/x.pdf".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(spies.acquirer.fetched_urls(), vec!["https://example.com/x.pdf"]);
        let prompts = spies.text_model.received_prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].content.contains("ETKEN MADDE: X"));
        for field in LEAFLET_FIELDS {
            assert!(prompts[0].instruction.contains(field));
        }
        assert_eq!(spies.vision_model.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_json_output_is_relayed_unmodified() {
        let raw = "{ \"saklama\": \"25°C altında\",\n  \"etken_madde\": \"X\" }";
        let (pipeline, _spies) = build_pipeline(
            MockContentAcquirer::new(),
            MockModelClient::new().with_response(raw.to_string()),
            MockModelClient::new(),
        );

        let response = pipeline
            .run(ExtractionRequest::Leaflet {
                pdf_url: "https://example.com/x.pdf".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response, ExtractionResponse::Leaflet(raw.to_string()));
    }

    #[tokio::test]
    async fn test_interaction_check_skips_acquisition() {
        let (pipeline, spies) = default_pipeline();

        let response = pipeline
            .run(ExtractionRequest::Interaction {
                drug_a: "Aspirin".to_string(),
                drug_b: "Warfarin".to_string(),
            })
            .await
            .unwrap();

        assert!(matches!(response, ExtractionResponse::Interaction(_)));
        assert_eq!(spies.acquirer.get_call_count(), 0);
        assert_eq!(spies.text_model.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_prescription_uses_vision_model() {
        let (pipeline, spies) = default_pipeline();

        let response = pipeline
            .run(ExtractionRequest::PrescriptionImage(ImageSource::Path {
                path: PathBuf::from("/data/recete.jpg"),
                mime_type: None,
            }))
            .await
            .unwrap();

        assert!(matches!(response, ExtractionResponse::Prescription(_)));
        assert_eq!(spies.text_model.get_call_count(), 0);
        let prompts = spies.vision_model.received_prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].image.is_some());
    }

    #[tokio::test]
    async fn test_identical_requests_run_independently() {
        let (pipeline, spies) = build_pipeline(
            MockContentAcquirer::new(),
            MockModelClient::new()
                .with_response("ilk".to_string())
                .with_response("ikinci".to_string()),
            MockModelClient::new(),
        );
        let request = ExtractionRequest::SideEffect {
            drug: "Parol".to_string(),
            side_effect: "uyku hali".to_string(),
        };

        let first = pipeline.run(request.clone()).await.unwrap();
        let second = pipeline.run(request).await.unwrap();

        assert_eq!(spies.text_model.get_call_count(), 2);
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_acquisition_failure_stops_before_model() {
        let (pipeline, spies) = build_pipeline(
            MockContentAcquirer::new().with_failure("connection refused".to_string()),
            MockModelClient::new(),
            MockModelClient::new(),
        );

        let err = pipeline
            .run(ExtractionRequest::Leaflet {
                pdf_url: "https://example.com/x.pdf".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Acquisition(_)));
        assert_eq!(spies.text_model.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let (pipeline, _spies) = build_pipeline(
            MockContentAcquirer::new(),
            MockModelClient::new().with_failure("quota exceeded".to_string()),
            MockModelClient::new(),
        );

        let err = pipeline
            .run(ExtractionRequest::Interaction {
                drug_a: "A".to_string(),
                drug_b: "B".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ModelInvocation(ref msg) if msg == "quota exceeded"));
    }

    #[test]
    fn test_relay_shapes() {
        assert_eq!(
            relay(ExtractionTask::SideEffectCheck, "cevap".to_string()),
            ExtractionResponse::SideEffect(SideEffectResponse {
                analysis: "cevap".to_string()
            })
        );
        assert_eq!(
            relay(ExtractionTask::PrescriptionImageAnalysis, "{}".to_string()),
            ExtractionResponse::Prescription(PrescriptionResponse {
                parsed_prescription: "{}".to_string()
            })
        );
    }
}
