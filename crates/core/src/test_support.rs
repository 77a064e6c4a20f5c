//! Shared fixtures for unit tests.

use crate::constants::{ENTRY, SECTION, VALUE_SETS_PATH};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use cda::{Document, Element};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Barrier;

pub(crate) const SAMPLE_ECR: &str = include_str!("../tests/fixtures/sample_ecr.xml");

pub(crate) fn sample_document() -> Document {
    Document::parse(SAMPLE_ECR.as_bytes()).expect("fixture parses")
}

/// `@code` of each section's `code` child; non-section elements are skipped.
pub(crate) fn section_codes(elements: &[&Element]) -> Vec<String> {
    elements
        .iter()
        .filter(|el| el.local_name() == SECTION)
        .filter_map(|section| {
            section
                .child_elements()
                .find(|child| child.local_name() == "code")
                .and_then(|code| code.attribute("code"))
                .map(str::to_owned)
        })
        .collect()
}

/// `@root` of the first `id` inside each entry; non-entry elements are skipped.
pub(crate) fn entry_ids(elements: &[&Element]) -> Vec<String> {
    elements
        .iter()
        .filter(|el| el.local_name() == ENTRY)
        .filter_map(|entry| {
            entry
                .descendants()
                .find(|inner| inner.local_name() == "id")
                .and_then(|id| id.attribute("root"))
                .map(str::to_owned)
        })
        .collect()
}

async fn value_sets(Query(params): Query<HashMap<String, String>>) -> Response {
    let body = match params.get("condition_code").map(String::as_str) {
        Some("840539006") => concat!(
            r#"{"lrtc":[{"codes":["76078-5","76080-1"],"system":"http://loinc.org"}],"#,
            r#""ostc":[{"codes":["94310-0"],"system":"http://loinc.org"}]}"#
        ),
        Some("772828001") => r#"{"mrtc":[{"codes":["94309-2"],"system":"http://loinc.org"}]}"#,
        Some("unsupported") => {
            r#"{"dxtc":[{"codes":["U07.1"],"system":"http://hl7.org/fhir/sid/icd-10-cm"}]}"#
        }
        Some("garbled") => "not json",
        Some("fails") => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        _ => return StatusCode::NOT_FOUND.into_response(),
    };
    (StatusCode::OK, body).into_response()
}

/// Answers only once `parties` lookups are in flight at the same time.
async fn rendezvous(State(barrier): State<Arc<Barrier>>) -> Response {
    barrier.wait().await;
    (
        StatusCode::OK,
        r#"{"lrtc":[{"codes":["76078-5"],"system":"http://loinc.org"}]}"#,
    )
        .into_response()
}

/// Starts an in-process Reference Lookup Service on an ephemeral port and returns its base URL.
pub(crate) async fn spawn_reference_stub() -> String {
    serve(Router::new().route(VALUE_SETS_PATH, get(value_sets))).await
}

/// Lookup service whose responses are held back until `parties` requests have arrived.
pub(crate) async fn spawn_rendezvous_stub(parties: usize) -> String {
    let app = Router::new()
        .route(VALUE_SETS_PATH, get(rendezvous))
        .with_state(Arc::new(Barrier::new(parties)));
    serve(app).await
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });
    format!("http://{addr}")
}
