//! HTTP API: session control, question authoring and disputes.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::{self, AuthConfig};
use crate::llm::LlmError;
use crate::pool::{PoolError, QuestionDraft, QuestionPatch};
use crate::protocol::SessionCommand;
use crate::session::{SessionError, SessionView};
use crate::state::{AppState, DisputeError, DisputeSubmission, QuestionError, Resolution};
use crate::types::{Dispute, Question};
use crate::ws;

/// Error returned by every API endpoint, serialized as `{code, message}`
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Authentication required")]
    AuthRequired,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Precondition(String),

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    UpstreamTimeout(String),

    #[error("{0}")]
    Unavailable(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::AuthRequired => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Precondition(_) => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION",
            ApiError::AuthRequired => "AUTH_REQUIRED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Precondition(_) => "PRECONDITION",
            ApiError::Upstream(_) => "UPSTREAM",
            ApiError::UpstreamTimeout(_) => "UPSTREAM_TIMEOUT",
            ApiError::Unavailable(_) => "UNAVAILABLE",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorBody {
            code: self.code().to_string(),
            message: self.to_string(),
        });

        if matches!(self, ApiError::AuthRequired) {
            (
                status,
                [(header::WWW_AUTHENTICATE, "Basic realm=\"Quizbowl Admin\"")],
                body,
            )
                .into_response()
        } else {
            (status, body).into_response()
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PoolError> for ApiError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::NotFound(_) => ApiError::NotFound(err.to_string()),
            PoolError::Invalid(_) => ApiError::Validation(err.to_string()),
            PoolError::InsufficientQuestions { .. } | PoolError::DuplicateId(_) => {
                ApiError::Precondition(err.to_string())
            }
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Pool(pool) => pool.into(),
            other => ApiError::Precondition(other.to_string()),
        }
    }
}

impl From<QuestionError> for ApiError {
    fn from(err: QuestionError) -> Self {
        match err {
            QuestionError::Pool(pool) => pool.into(),
            QuestionError::Store(_) => ApiError::Unavailable(err.to_string()),
        }
    }
}

impl From<DisputeError> for ApiError {
    fn from(err: DisputeError) -> Self {
        match err {
            DisputeError::Validation(_) => ApiError::Validation(err.to_string()),
            DisputeError::NotFound(_) => ApiError::NotFound(err.to_string()),
            DisputeError::AlreadyDecided(_) | DisputeError::NoSuggestedFix(_) => {
                ApiError::Precondition(err.to_string())
            }
            DisputeError::AnalyzerUnavailable | DisputeError::Analysis(LlmError::ConfigError(_)) => {
                ApiError::Unavailable(err.to_string())
            }
            DisputeError::Analysis(LlmError::Timeout(_)) => {
                ApiError::UpstreamTimeout(err.to_string())
            }
            DisputeError::Analysis(_) => ApiError::Upstream(err.to_string()),
            DisputeError::Question(question) => question.into(),
        }
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// All API and WebSocket routes. Admin routes sit behind Basic auth.
pub fn router(state: Arc<AppState>, auth_config: Arc<AuthConfig>) -> Router {
    let admin_routes = Router::new()
        .route("/api/admin/questions", post(add_question))
        .route("/api/admin/questions/{id}", patch(edit_question))
        .route(
            "/api/admin/disputes",
            get(list_disputes).delete(clear_disputes),
        )
        .route("/api/admin/disputes/{id}", patch(resolve_dispute))
        .route("/api/admin/disputes/{id}/analyze", post(analyze_dispute))
        .route("/api/admin/disputes/{id}/apply-fix", post(apply_dispute_fix))
        .layer(middleware::from_fn_with_state(
            auth_config,
            auth::admin_auth_middleware,
        ));

    Router::new()
        .route("/api/session", get(get_session).post(post_session))
        .route("/api/questions", get(list_questions))
        .route("/api/categories", get(list_categories))
        .route("/api/disputes", post(submit_dispute))
        .route("/ws", get(ws::ws_handler))
        .merge(admin_routes)
        .with_state(state)
}

/// GET /api/session
pub async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionView> {
    Json(state.get_session_view().await)
}

/// POST /api/session
///
/// Commands that do not apply in the current phase are ignored and the
/// unchanged snapshot is returned.
pub async fn post_session(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SessionCommand>, JsonRejection>,
) -> ApiResult<Json<SessionView>> {
    let Json(cmd) = payload?;
    Ok(Json(state.apply_command(cmd).await?))
}

/// GET /api/questions
pub async fn list_questions(State(state): State<Arc<AppState>>) -> Json<Vec<Question>> {
    Json(state.list_questions().await)
}

/// GET /api/categories
pub async fn list_categories(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.list_categories().await)
}

/// POST /api/admin/questions
pub async fn add_question(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QuestionDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Question>)> {
    let Json(draft) = payload?;
    let question = state.add_question(draft).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

/// PATCH /api/admin/questions/{id}
pub async fn edit_question(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<QuestionPatch>, JsonRejection>,
) -> ApiResult<Json<Question>> {
    let Json(patch) = payload?;
    Ok(Json(state.edit_question(&id, patch).await?))
}

/// POST /api/disputes
pub async fn submit_dispute(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DisputeSubmission>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Dispute>)> {
    let Json(submission) = payload?;
    let dispute = state.submit_dispute(submission).await?;
    Ok((StatusCode::CREATED, Json(dispute)))
}

/// GET /api/admin/disputes
pub async fn list_disputes(State(state): State<Arc<AppState>>) -> Json<Vec<Dispute>> {
    Json(state.list_disputes().await)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearedResponse {
    pub cleared: usize,
}

/// DELETE /api/admin/disputes
pub async fn clear_disputes(State(state): State<Arc<AppState>>) -> Json<ClearedResponse> {
    Json(ClearedResponse {
        cleared: state.clear_disputes().await,
    })
}

/// POST /api/admin/disputes/{id}/analyze
pub async fn analyze_dispute(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Dispute>> {
    Ok(Json(state.analyze_dispute(&id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub resolution: Resolution,
    #[serde(default)]
    pub note: Option<String>,
}

/// PATCH /api/admin/disputes/{id}
pub async fn resolve_dispute(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<ResolveRequest>, JsonRejection>,
) -> ApiResult<Json<Dispute>> {
    let Json(request) = payload?;
    Ok(Json(
        state
            .resolve_dispute(&id, request.resolution, request.note)
            .await?,
    ))
}

/// POST /api/admin/disputes/{id}/apply-fix
pub async fn apply_dispute_fix(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Question>> {
    Ok(Json(state.apply_dispute_fix(&id).await?))
}
