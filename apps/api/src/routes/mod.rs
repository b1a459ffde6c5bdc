pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::pipeline::handlers;
use crate::state::AppState;

/// Largest resume upload accepted by the upload route.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/analysis", post(handlers::handle_analyze))
        .route(
            "/api/v1/analysis/upload",
            post(handlers::handle_analyze_upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/v1/match", post(handlers::handle_match))
        .route("/api/v1/resumes/build", post(handlers::handle_build_resume))
        .route("/api/v1/cover-letters", post(handlers::handle_cover_letter))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::documents::testing::one_page_pdf;
    use crate::llm_client::testing::ScriptedGenerator;
    use crate::llm_client::GenerationError;
    use crate::models::user::USER_ID_HEADER;
    use crate::pipeline::orchestrator::RetryPolicy;

    fn app(generator: ScriptedGenerator) -> (Router, Arc<ScriptedGenerator>) {
        let generator = Arc::new(generator);
        let state = AppState {
            generator: generator.clone(),
            retry_policy: RetryPolicy::default(),
        };
        (build_router(state), generator)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(USER_ID_HEADER, "user-7")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_model() {
        let (router, _) = app(ScriptedGenerator::new(vec![]));
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model"], "scripted");
    }

    #[tokio::test]
    async fn test_match_route_returns_payload_and_owner() {
        let (router, _) = app(ScriptedGenerator::replying(
            "{\"matchScore\": 65, \"missingKeywords\": [\"AWS\"]}",
        ));
        let response = router
            .oneshot(post_json(
                "/api/v1/match",
                json!({"resumeText": "React dev", "jobDescription": "React lead"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["owner"], "user-7");
        assert_eq!(body["useCase"], "match");
        assert_eq!(
            body["result"],
            json!({"matchScore": 65, "missingKeywords": ["AWS"]})
        );
        assert_eq!(body["validation"]["complete"], true);
    }

    #[tokio::test]
    async fn test_anonymous_caller_has_null_owner() {
        let (router, _) = app(ScriptedGenerator::replying("Dear team,\nThanks."));
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/cover-letters")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({
                    "resumeText": "Rust dev",
                    "jobDescription": "Rust role",
                    "companyName": "Acme",
                    "style": "unheard-of"
                })
                .to_string(),
            ))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert!(body["owner"].is_null());
        assert_eq!(body["content"], "Dear team,\nThanks.");
    }

    #[tokio::test]
    async fn test_rate_limited_maps_to_429() {
        let (router, generator) = app(ScriptedGenerator::failing(GenerationError::RateLimited(
            "quota".to_string(),
        )));
        let response = router
            .oneshot(post_json(
                "/api/v1/analysis",
                json!({"resumeText": "Some resume"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(read_json(response).await["error"]["code"], "RATE_LIMITED");
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_response_surfaces_raw_text() {
        let (router, _) = app(ScriptedGenerator::replying("no json here"));
        let response = router
            .oneshot(post_json(
                "/api/v1/analysis",
                json!({"resumeText": "Some resume"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = read_json(response).await;
        assert_eq!(body["error"]["code"], "MALFORMED_AI_RESPONSE");
        assert_eq!(body["error"]["details"]["rawResponse"], "no json here");
    }

    #[tokio::test]
    async fn test_empty_resume_is_rejected_without_generation() {
        let (router, generator) = app(ScriptedGenerator::replying("{}"));
        let response = router
            .oneshot(post_json("/api/v1/analysis", json!({"resumeText": "  "})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(response).await["error"]["code"], "EMPTY_DOCUMENT");
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_build_resume_route_returns_text() {
        let (router, generator) = app(ScriptedGenerator::replying("  JANE DOE\n\nEXPERIENCE  "));
        let response = router
            .oneshot(post_json(
                "/api/v1/resumes/build",
                json!({
                    "personalInfo": {"fullName": "Jane Doe", "email": "jane@example.com"},
                    "skills": [{"category": "Languages", "items": ["Rust"]}]
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["content"], "JANE DOE\n\nEXPERIENCE");
        assert!(generator
            .last_request()
            .unwrap()
            .prompt
            .contains("Languages: Rust"));
    }

    fn multipart_request(file_name: &str, content_type: &str, contents: &str) -> Request<Body> {
        let boundary = "resumeai-test-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"targetRole\"\r\n\r\n\
             Platform Engineer\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: {content_type}\r\n\r\n\
             {contents}\r\n\
             --{boundary}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri("/api/v1/analysis/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_extracts_text_and_analyzes() {
        let (router, generator) = app(ScriptedGenerator::replying(
            "{\"overallScore\": 75, \"categoryScores\": {\"formatting\": 80}}",
        ));
        let response = router
            .oneshot(multipart_request(
                "resume.txt",
                "text/plain",
                "Jane Doe - Kubernetes operator",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["result"]["overallScore"], 75);
        let prompt = generator.last_request().unwrap().prompt;
        assert!(prompt.contains("Jane Doe - Kubernetes operator"));
        assert!(prompt.contains("Platform Engineer"));
    }

    #[tokio::test]
    async fn test_upload_of_empty_text_short_circuits() {
        let (router, generator) = app(ScriptedGenerator::replying("{}"));
        let response = router
            .oneshot(multipart_request("resume.txt", "text/plain", "   "))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(response).await["error"]["code"], "EMPTY_DOCUMENT");
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_upload_of_docx_is_unsupported() {
        let (router, generator) = app(ScriptedGenerator::replying("{}"));
        let response = router
            .oneshot(multipart_request(
                "resume.docx",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                "PK",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(
            read_json(response).await["error"]["code"],
            "UNSUPPORTED_DOCUMENT"
        );
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_pdf_upload_is_parsed_and_analyzed() {
        let (router, generator) = app(ScriptedGenerator::replying(
            "{\"overallScore\": 70, \"categoryScores\": {}}",
        ));
        let pdf = String::from_utf8(one_page_pdf("Jane Doe Kubernetes operator")).unwrap();
        let response = router
            .oneshot(multipart_request("resume.pdf", "application/pdf", &pdf))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["result"]["overallScore"], 70);
        assert!(generator.last_request().unwrap().prompt.contains("Kubernetes"));
    }

    #[tokio::test]
    async fn test_undecodable_body_uses_error_envelope() {
        let (router, generator) = app(ScriptedGenerator::replying("resume"));
        let response = router
            .oneshot(post_json(
                "/api/v1/resumes/build",
                json!({
                    "personalInfo": {"fullName": "Jane Doe"},
                    "experience": [{"title": "Engineer"}]
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("company"));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_non_json_body_uses_error_envelope() {
        let (router, _) = app(ScriptedGenerator::replying("{}"));
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/match")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(response).await["error"]["code"], "VALIDATION_ERROR");
    }
}
