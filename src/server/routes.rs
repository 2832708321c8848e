use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::entity::{EntityRef, Snippet};
use crate::linker::{LinkMode, LinkReport};
use crate::server::AppState;
use crate::Error;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Contact ids for an ambiguous name, so the caller can pick one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<i64>>,
}

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
}

#[derive(Deserialize)]
pub struct SaveSnippetRequest {
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub source: Option<String>,
    /// Required: `{"mode": "auto"}`, `{"mode": "explicit", "names": [..]}` or `{"mode": "none"}`
    pub link: LinkMode,
}

#[derive(Serialize)]
pub struct SaveSnippetResponse {
    pub id: i64,
    pub report: LinkReport,
}

/// Either a mode to apply or a chosen contact for an ambiguous name
#[derive(Deserialize)]
#[serde(untagged)]
pub enum LinkRequest {
    Contact { contact_id: i64 },
    Mode { link: LinkMode },
}

#[derive(Deserialize)]
pub struct SimilarParams {
    pub query: Option<String>,
    /// `kind:id`, e.g. `contact:3`
    pub entity: Option<String>,
    pub limit: Option<usize>,
    pub threshold: Option<f32>,
}

pub fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::InvalidInput(_) | Error::InvalidEntity(_) => StatusCode::BAD_REQUEST,
        Error::EntityNotFound(_) => StatusCode::NOT_FOUND,
        Error::AmbiguousLink { .. } => StatusCode::CONFLICT,
        Error::EmbeddingUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(error: Error) -> (StatusCode, Json<ErrorResponse>) {
    let candidates = match &error {
        Error::AmbiguousLink { candidates, .. } => Some(candidates.clone()),
        _ => None,
    };
    (
        status_for(&error),
        Json(ErrorResponse {
            error: error.to_string(),
            candidates,
        }),
    )
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
            candidates: None,
        }),
    )
}

/// Run synchronous core work off the async runtime
async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> crate::Result<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(Ok(value)) => Ok(Json(value)),
        Ok(Err(e)) => Err(api_error(e)),
        Err(e) => {
            tracing::error!("blocking task failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                    candidates: None,
                }),
            ))
        }
    }
}

pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> ApiResult<crate::analyzer::AnalysisResult> {
    let synthesizer = Arc::clone(&state.synthesizer);
    blocking(move || synthesizer.analyze(&req.text)).await
}

pub async fn save_snippet(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveSnippetRequest>,
) -> ApiResult<SaveSnippetResponse> {
    let linker = Arc::clone(&state.linker);
    blocking(move || {
        let mut snippet = Snippet::new(req.text).with_tags(req.tags);
        if let Some(source) = req.source {
            snippet = snippet.with_source(source);
        }
        let (id, report) = linker.save_snippet(&snippet, &req.link)?;
        Ok(SaveSnippetResponse { id, report })
    })
    .await
}

pub async fn link_snippet(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<LinkRequest>,
) -> ApiResult<serde_json::Value> {
    let linker = Arc::clone(&state.linker);
    blocking(move || match req {
        LinkRequest::Contact { contact_id } => {
            let created = linker.link_contact(id, contact_id)?;
            Ok(serde_json::json!({ "snippet_id": id, "contact_id": contact_id, "created": created }))
        }
        LinkRequest::Mode { link } => {
            let report = linker.link_snippet(id, &link)?;
            Ok(serde_json::to_value(&report)?)
        }
    })
    .await
}

pub async fn similar(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SimilarParams>,
) -> ApiResult<Vec<crate::embedding::SimilarMatch>> {
    let limit = params.limit.unwrap_or(10);
    let index = Arc::clone(&state.index);

    match (params.query, params.entity) {
        (Some(query), None) => {
            let threshold = params.threshold.unwrap_or_else(|| index.default_threshold());
            blocking(move || index.find_similar(&query, limit, threshold)).await
        }
        (None, Some(entity)) => {
            let entity = EntityRef::parse(&entity).map_err(api_error)?;
            blocking(move || index.find_similar_to_entity(entity, limit)).await
        }
        _ => Err(bad_request("pass exactly one of `query` or `entity`")),
    }
}

pub async fn stats(State(state): State<Arc<AppState>>) -> ApiResult<crate::storage::DbStats> {
    let store = Arc::clone(&state.store);
    blocking(move || store.stats()).await
}
