use crate::api_errors::AppError;
use crate::app_state::AppState;
use crate::interpreter::{interpret, AnalysisResult, DIMENSIONS};
use crate::model::{FEATURE_LEN, SCORE_DIMS};
use crate::prompt::{compose_prompt, ConversationTurn};
use crate::tokenizer::tokenize;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AnalyzeRequest {
    #[serde(deserialize_with = "lenient_string")]
    pub patient_background: String,
    #[serde(deserialize_with = "lenient_turns")]
    pub conversation_history: Vec<ConversationTurn>,
    #[serde(deserialize_with = "lenient_string")]
    pub doctor_statement: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub overall_negativity: f32,
    pub perceived_judgment: f32,
    pub anxiety_stress: f32,
    pub empathy_rapport: f32,
    pub rationale: String,
}

impl From<AnalysisResult> for AnalyzeResponse {
    fn from(result: AnalysisResult) -> Self {
        Self {
            overall_negativity: result.overall_negativity,
            perceived_judgment: result.perceived_judgment,
            anxiety_stress: result.anxiety_stress,
            empathy_rapport: result.empathy_rapport,
            rationale: result.rationale,
        }
    }
}

// Missing or non-string fields are empty strings, not errors.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        _ => String::new(),
    })
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct TurnDto {
    #[serde(deserialize_with = "lenient_string")]
    speaker: String,
    #[serde(deserialize_with = "lenient_string")]
    text: String,
}

fn lenient_turns<'de, D>(deserializer: D) -> Result<Vec<ConversationTurn>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let turns = match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<TurnDto>(item).ok())
            .map(|dto| ConversationTurn {
                speaker: dto.speaker,
                text: dto.text,
            })
            .collect(),
        _ => Vec::new(),
    };
    Ok(turns)
}

/// Build the analysis router: the inference endpoint with a versioned
/// alias, a status report, and health checks.
pub fn build_analysis_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/analyze", post(analyze))
        .route("/v1/analyze", post(analyze))
        .route("/api/status", get(status))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[axum::debug_handler]
async fn analyze(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            tracing::debug!("rejecting malformed analyze body: {rejection}");
            return AppError::MalformedRequest.into_response();
        }
    };

    let prompt = compose_prompt(
        &req.patient_background,
        &req.conversation_history,
        &req.doctor_statement,
    );
    let features = tokenize(&prompt, FEATURE_LEN);

    match state.model.forward(&features) {
        Ok(raw) => Json(AnalyzeResponse::from(interpret(raw))).into_response(),
        Err(e) => {
            tracing::error!("forward pass failed: {e}");
            AppError::from(e).into_response()
        }
    }
}

async fn status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let ranges: Vec<serde_json::Value> = DIMENSIONS
        .iter()
        .map(|dim| {
            let (floor, ceiling) = dim.range();
            serde_json::json!({ "dimension": dim.label(), "floor": floor, "ceiling": ceiling })
        })
        .collect();

    Json(serde_json::json!({
        "feature_len": FEATURE_LEN,
        "score_dims": SCORE_DIMS,
        "model_source": state.model_source.as_str(),
        "ranges": ranges,
    }))
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn readyz(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    // the model is constructed before the listener binds, so a reachable
    // service is a ready service
    Json(serde_json::json!({
        "ready": true,
        "model_source": state.model_source.as_str(),
    }))
}
