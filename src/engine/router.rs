use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::config::ConfigStore;
use super::domain::PriorAuthRequest;
use super::extraction::EntityExtractor;
use super::service::{DecisionEngine, EvaluationError};

/// Evaluation request body: the structured request plus its specialty tag.
#[derive(Debug, Deserialize)]
pub struct EvaluationBody {
    pub specialty: String,
    pub request: PriorAuthRequest,
}

/// Router builder exposing the evaluation endpoint.
pub fn engine_router<S, E>(engine: Arc<DecisionEngine<S, E>>) -> Router
where
    S: ConfigStore + 'static,
    E: EntityExtractor + 'static,
{
    Router::new()
        .route(
            "/api/v1/prior-auth/evaluations",
            post(evaluate_handler::<S, E>),
        )
        .with_state(engine)
}

pub(crate) async fn evaluate_handler<S, E>(
    State(engine): State<Arc<DecisionEngine<S, E>>>,
    axum::Json(body): axum::Json<EvaluationBody>,
) -> Response
where
    S: ConfigStore + 'static,
    E: EntityExtractor + 'static,
{
    match engine.evaluate(&body.request, &body.specialty) {
        Ok(decision) => (StatusCode::OK, axum::Json(decision)).into_response(),
        Err(EvaluationError::Extraction(error)) => {
            let payload = json!({
                "error": error.to_string(),
                "retryable": true,
            });
            (StatusCode::BAD_GATEWAY, axum::Json(payload)).into_response()
        }
    }
}
