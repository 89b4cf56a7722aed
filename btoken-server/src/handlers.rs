use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use btoken::{AuthRequest, Authorization, TokenError};

use crate::basic_auth;
use crate::state::AppState;

/// Errors surfaced to HTTP clients.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Malformed Authorization header")]
    MalformedHeader,

    #[error("Missing or bad request body")]
    MalformedBody,

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::MalformedHeader | ApiError::MalformedBody => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::Token(TokenError::Unauthorized) => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            ApiError::Token(TokenError::InvalidToken) => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            ApiError::Token(err) => {
                error!(error = %err, "request failed in the storage layer");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        (status, message).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/authorizations", post(issue))
        .route("/authorizations/verify", post(verify))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "ok": true, "service": "btoken-server" }))
}

/// Issue a new authorization token.
///
/// The caller authenticates with Basic auth and posts an [`AuthRequest`]
/// body; an empty body is accepted and treated as the zero-value request.
/// A body that leaves `user` empty gets it filled from the authenticated
/// identity.
async fn issue(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Authorization>, ApiError> {
    let header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::MalformedHeader)?;
    let credentials = basic_auth::decode(header).map_err(|err| {
        debug!(error = %err, "rejected authorization header");
        ApiError::MalformedHeader
    })?;

    let mut request: AuthRequest = if body.is_empty() {
        AuthRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|err| {
            debug!(error = %err, "rejected request body");
            ApiError::MalformedBody
        })?
    };
    if request.user.is_empty() {
        request.user = credentials.username.clone();
    }

    let authorization = state.service.authorize(&credentials, request).await?;
    Ok(Json(authorization))
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
    pub user: String,
    /// Scope to check for. Absent or empty means identity match alone.
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
}

/// Answer whether a token is live, belongs to a user, and carries a scope.
///
/// An invalid or expired token answers `{"valid": false}` rather than an
/// error status: callers of this endpoint asked a yes/no question, and the
/// record deliberately does not reveal why the answer is no.
async fn verify(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<VerifyResponse>, ApiError> {
    let request: VerifyRequest = serde_json::from_slice(&body).map_err(|err| {
        debug!(error = %err, "rejected verify body");
        ApiError::MalformedBody
    })?;
    let scope = request.scope.as_deref().filter(|scope| !scope.is_empty());

    match state
        .service
        .check_auth(&request.token, &request.user, scope)
        .await
    {
        Ok(valid) => Ok(Json(VerifyResponse { valid })),
        Err(TokenError::InvalidToken) => Ok(Json(VerifyResponse { valid: false })),
        Err(err) => Err(err.into()),
    }
}
