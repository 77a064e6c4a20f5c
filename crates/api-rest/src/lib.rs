//! # API REST
//!
//! REST API implementation for the message refiner.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (status mapping, JSON error bodies, CORS)
//!
//! Uses `api-shared` for wire types and `refiner-core` for the refinement itself.

#![warn(rust_2018_idioms)]

mod error;

pub use error::ApiError;

use api_shared::{ErrorRes, HealthRes, HealthService, ListSectionsRes, RefineEcrParams, SectionRes};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use refiner_core::RefinerService;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Address the REST server binds to when none is configured.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:8080";

/// Application state shared across REST API handlers
#[derive(Clone)]
pub struct AppState {
    refiner: Arc<RefinerService>,
}

impl AppState {
    pub fn new(refiner: RefinerService) -> Self {
        Self {
            refiner: Arc::new(refiner),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, refine_ecr, list_sections),
    components(schemas(HealthRes, ErrorRes, SectionRes, ListSectionsRes))
)]
pub struct ApiDoc;

/// Builds the REST router: endpoints, Swagger UI and a permissive CORS layer.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ecr", post(refine_ecr))
        .route("/sections", get(list_sections))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// This endpoint is used for monitoring and load balancer health checks.
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/ecr",
    params(RefineEcrParams),
    request_body(content = String, content_type = "application/xml", description = "eICR CDA document"),
    responses(
        (status = 200, description = "Refined CDA document", body = String, content_type = "application/xml"),
        (status = 400, description = "Malformed XML or empty condition code", body = ErrorRes),
        (status = 422, description = "Unrecognised section code", body = ErrorRes),
        (status = 502, description = "Reference lookup failed or returned an unusable answer", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Refine an eICR message
///
/// Keeps the document header plus the sections in `sections_to_include` and/or the entries
/// related to `conditions_to_include`. With neither filter every section is kept.
///
/// # Errors
/// Returns an [`ErrorRes`] body with the status of the failing stage; see [`ApiError::status`].
#[axum::debug_handler]
async fn refine_ecr(
    State(state): State<AppState>,
    Query(params): Query<RefineEcrParams>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    tracing::debug!(
        bytes = body.len(),
        sections = ?params.sections_to_include,
        conditions = ?params.conditions_to_include,
        "refine request"
    );

    let refined = state
        .refiner
        .refine_ecr(
            &body,
            params.sections_to_include.as_deref(),
            params.conditions_to_include.as_deref(),
        )
        .await?;

    Ok(([(header::CONTENT_TYPE, "application/xml")], refined))
}

#[utoipa::path(
    get,
    path = "/sections",
    responses(
        (status = 200, description = "Recognised section codes", body = ListSectionsRes)
    )
)]
/// List the section codes accepted by `sections_to_include`
async fn list_sections() -> Json<ListSectionsRes> {
    Json(ListSectionsRes::all())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use refiner_core::CoreConfig;
    use tower::ServiceExt;

    const MESSAGE: &str = r#"<ClinicalDocument xmlns="urn:hl7-org:v3">
  <title>Case report</title>
  <component><structuredBody>
    <component><section><code code="10164-2"/><text>HPI</text></section></component>
    <component><section><code code="11450-4"/><text>Problems</text></section></component>
  </structuredBody></component>
</ClinicalDocument>"#;

    /// Router whose Reference Lookup Service is unreachable.
    fn test_app() -> Router {
        let cfg = CoreConfig::new("http://127.0.0.1:9", None).unwrap();
        app(AppState::new(RefinerService::new(&cfg).unwrap()))
    }

    fn refine_request(query: &str, body: &str) -> Request<Body> {
        Request::post(format!("/ecr{query}"))
            .header(header::CONTENT_TYPE, "application/xml")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn error_body(response: axum::response::Response) -> ErrorRes {
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    #[test]
    fn default_lookup_service_is_not_this_server() {
        let rest_port = DEFAULT_REST_ADDR
            .parse::<std::net::SocketAddr>()
            .unwrap()
            .port();
        let tcr_port = refiner_core::constants::DEFAULT_TCR_URL
            .rsplit(':')
            .next()
            .and_then(|port| port.parse::<u16>().ok())
            .unwrap();
        assert_ne!(rest_port, tcr_port);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let res: HealthRes = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(res.ok);
    }

    #[tokio::test]
    async fn lists_section_vocabulary() {
        let response = test_app()
            .oneshot(Request::get("/sections").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let res: ListSectionsRes = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(res, ListSectionsRes::all());
    }

    #[tokio::test]
    async fn refines_to_requested_section() {
        let response = test_app()
            .oneshot(refine_request("?sections_to_include=11450-4", MESSAGE))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/xml"
        );

        let xml = body_text(response).await;
        assert!(xml.starts_with("<ClinicalDocument xmlns=\"urn:hl7-org:v3\""), "{xml}");
        assert!(xml.contains("<title>Case report</title>"), "{xml}");
        assert!(xml.contains("11450-4"), "{xml}");
        assert!(!xml.contains("10164-2"), "{xml}");
    }

    #[tokio::test]
    async fn malformed_xml_is_bad_request() {
        let response = test_app()
            .oneshot(refine_request("", "<ClinicalDocument><title>"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let err = error_body(response).await;
        assert_eq!(err.error, "xml_syntax");
        assert!(err.message.starts_with("XMLSyntaxError"), "{}", err.message);
    }

    #[tokio::test]
    async fn deeply_nested_message_is_bad_request() {
        let body = format!(
            "<ClinicalDocument>{}{}</ClinicalDocument>",
            "<a>".repeat(10_000),
            "</a>".repeat(10_000)
        );
        let response = test_app().oneshot(refine_request("", &body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_body(response).await.error, "xml_syntax");
    }

    #[tokio::test]
    async fn unknown_section_is_unprocessable() {
        let response = test_app()
            .oneshot(refine_request("?sections_to_include=00000-0", MESSAGE))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let err = error_body(response).await;
        assert_eq!(err.error, "invalid_section");
        assert_eq!(err.message, "00000-0 is invalid. Please provide a valid section.");
    }

    #[tokio::test]
    async fn unreachable_reference_service_is_bad_gateway() {
        let response = test_app()
            .oneshot(refine_request("?conditions_to_include=840539006", MESSAGE))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(error_body(response).await.error, "reference_lookup_failed");
    }

    #[tokio::test]
    async fn serves_openapi_document() {
        let response = test_app()
            .oneshot(Request::get("/api-docs/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let doc: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(doc["paths"]["/ecr"]["post"].is_object());
    }
}
