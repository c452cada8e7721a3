//! HTTP router for the extraction service.
//!
//! Every extraction endpoint is a `POST` taking a JSON body. Routes are mounted at the
//! root, one per [`ExtractionTask`], plus `GET /health`.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::models::ExtractionTask;
use crate::pipeline::Pipeline;

/// Build the service router around a shared pipeline.
///
/// `max_body_bytes` bounds request bodies; inline base64 prescription scans are the
/// largest payloads it has to admit.
pub fn api_router(pipeline: Arc<Pipeline>, max_body_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(Any);

    Router::new()
        .route(
            ExtractionTask::LeafletAnalysis.path(),
            post(endpoints::leaflet_analysis),
        )
        .route(
            ExtractionTask::InteractionCheck.path(),
            post(endpoints::interaction_check),
        )
        .route(
            ExtractionTask::SideEffectCheck.path(),
            post(endpoints::side_effect_check),
        )
        .route(
            ExtractionTask::PrescriptionImageAnalysis.path(),
            post(endpoints::prescription_image),
        )
        .route("/health", get(endpoints::health))
        .with_state(pipeline)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::MockContentAcquirer;
    use crate::ai::MockModelClient;
    use crate::models::{Config, ImageSource};
    use crate::pipeline::PipelineServices;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    struct Harness {
        router: Router,
        acquirer: MockContentAcquirer,
        text_model: MockModelClient,
        vision_model: MockModelClient,
    }

    fn harness(
        acquirer: MockContentAcquirer,
        text_model: MockModelClient,
        vision_model: MockModelClient,
    ) -> Harness {
        let pipeline = Pipeline::with_services(PipelineServices {
            acquirer: Box::new(acquirer.clone()),
            text_model: Box::new(text_model.clone()),
            vision_model: Box::new(vision_model.clone()),
        });
        Harness {
            router: api_router(Arc::new(pipeline), Config::DEFAULT_MAX_BODY_BYTES),
            acquirer,
            text_model,
            vision_model,
        }
    }

    fn default_harness() -> Harness {
        harness(
            MockContentAcquirer::new(),
            MockModelClient::new(),
            MockModelClient::new(),
        )
    }

    fn json_request(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), 1 << 20).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_missing_fields_return_400_without_side_effects() {
        let cases = [
            ("/leaflet-analysis", "pdfUrl eksik"),
            (
                "/side-effect-check",
                "Eksik bilgi: 'sideEffect' ve 'drug' gereklidir.",
            ),
            (
                "/prescription-image",
                "imageBase64 veya imagePath belirtmelisiniz.",
            ),
        ];

        for (uri, message) in cases {
            let h = default_harness();
            let response = h.router.oneshot(json_request(uri, "{}")).await.unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body_text(response).await, message);
            assert_eq!(h.acquirer.get_call_count(), 0);
            assert_eq!(h.text_model.get_call_count(), 0);
            assert_eq!(h.vision_model.get_call_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_interaction_without_names_reaches_the_model() {
        let h = harness(
            MockContentAcquirer::new(),
            MockModelClient::new().with_response("Bilgi yok.".to_string()),
            MockModelClient::new(),
        );

        let response = h
            .router
            .oneshot(json_request("/interaction-check", "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value =
            serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["interactionAnalysis"], "Bilgi yok.");
        assert_eq!(h.text_model.get_call_count(), 1);
        assert_eq!(h.acquirer.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_validation_failure() {
        let h = default_harness();
        let response = h
            .router
            .oneshot(json_request("/leaflet-analysis", "{\"pdfUrl\": "))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.starts_with("pdfUrl eksik"));
        assert_eq!(h.acquirer.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_fields_are_rejected() {
        let h = default_harness();
        let response = h
            .router
            .oneshot(json_request(
                "/side-effect-check",
                r#"{"drug": "Parol", "sideEffect": "ateş", "dose": 2}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(h.text_model.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_leaflet_output_is_returned_byte_for_byte() {
        let raw = "{\"yan_etkiler\":[\"baş ağrısı\"],  \"etken_madde\": \"X\"}";
        let h = harness(
            MockContentAcquirer::new().with_pdf_text("ETKEN MADDE: X".to_string()),
            MockModelClient::new().with_response(raw.to_string()),
            MockModelClient::new(),
        );

        let response = h
            .router
            .oneshot(json_request(
                "/leaflet-analysis",
                r#"{"pdfUrl": "https://example.com/p.pdf"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, raw);
        assert!(h.text_model.received_prompts()[0]
            .content
            .contains("ETKEN MADDE: X"));
    }

    #[tokio::test]
    async fn test_interaction_refusal_is_still_forwarded() {
        let refusal = "Bu konuda yardımcı olamam.";
        let h = harness(
            MockContentAcquirer::new(),
            MockModelClient::new().with_response(refusal.to_string()),
            MockModelClient::new(),
        );

        let response = h
            .router
            .oneshot(json_request(
                "/interaction-check",
                r#"{"drugA": "Aspirin", "drugB": "Warfarin"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value =
            serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["interactionAnalysis"], refusal);
    }

    #[tokio::test]
    async fn test_side_effect_model_failure_returns_500() {
        let h = harness(
            MockContentAcquirer::new(),
            MockModelClient::new().with_failure("quota exceeded".to_string()),
            MockModelClient::new(),
        );

        let response = h
            .router
            .oneshot(json_request(
                "/side-effect-check",
                r#"{"drug": "Parol", "sideEffect": "ateş"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Hata: quota exceeded");
    }

    #[tokio::test]
    async fn test_prescription_prefers_inline_image() {
        let h = harness(
            MockContentAcquirer::new(),
            MockModelClient::new(),
            MockModelClient::new().with_response("{\"ilac_adi\":\"Parol\"}".to_string()),
        );

        let response = h
            .router
            .oneshot(json_request(
                "/prescription-image",
                r#"{"imageBase64": "/9j/4A==", "imagePath": "/var/recete.jpg"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value =
            serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["parsedPrescription"], "{\"ilac_adi\":\"Parol\"}");
        assert_eq!(
            h.acquirer.loaded_images(),
            vec![ImageSource::Base64 {
                data: "/9j/4A==".to_string(),
                mime_type: None
            }]
        );
    }

    #[tokio::test]
    async fn test_prescription_acquisition_failure_returns_500() {
        let h = harness(
            MockContentAcquirer::new().with_failure("Cannot read image".to_string()),
            MockModelClient::new(),
            MockModelClient::new(),
        );

        let response = h
            .router
            .oneshot(json_request(
                "/prescription-image",
                r#"{"imagePath": "/var/yok.jpg"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_text(response).await,
            "Bir hata oluştu: Cannot read image"
        );
        assert_eq!(h.vision_model.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_health_reports_ok() {
        let h = default_harness();
        let response = h
            .router
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value =
            serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["status"], "ok");
    }
}
