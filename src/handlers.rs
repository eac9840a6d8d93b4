use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::auth::AdminAuth;
use crate::config::Config;
use crate::error::ApiError;
use crate::middleware::{client_ip, UNKNOWN_CLIENT};
use crate::rate_limiter::{RateLimitDecision, RateLimiter};
use crate::response::{AdminListResponse, CountResponse, HealthResponse, MessageResponse};
use crate::store::{MemoryStore, SubscriberStore};
use crate::validation::{is_valid_email, normalize_email};
use crate::verification::BotVerifier;

/// Shared application state, cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SubscriberStore>,
    pub limiter: Arc<RateLimiter>,
    pub auth: AdminAuth,
    pub verifier: BotVerifier,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            limiter: Arc::new(RateLimiter::new(
                config.rate_limit_max_requests,
                config.rate_limit_window,
            )),
            auth: AdminAuth::new(config.admin_token.as_deref()),
            verifier: BotVerifier::new(
                config.turnstile_secret.clone(),
                config.verify_url.clone(),
                config.verify_fail_closed,
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: String,
    /// Bot-verification token, if the frontend collected one.
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
    #[serde(default)]
    pub stats: bool,
    #[serde(default)]
    pub include_deleted: bool,
}

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    #[serde(default)]
    pub action: String,
}

/// POST /api/emails — signup.
///
/// The rate limit gates everything else, and its headers go on every
/// response from this path, success or failure.
pub async fn subscribe(
    State(state): State<AppState>,
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    body: Result<Json<SubscribeRequest>, JsonRejection>,
) -> Response {
    let ip = client_ip(&headers, connect_info.map(|info| info.0));
    let decision = state.limiter.check(&ip);

    let mut response = if decision.allowed {
        match body {
            Ok(Json(payload)) => handle_subscribe(&state, payload, &ip)
                .await
                .into_response(),
            Err(rejection) => {
                ApiError::InvalidRequest(rejection.body_text()).into_response()
            }
        }
    } else {
        rate_limited_response(&decision)
    };

    apply_rate_limit_headers(&mut response, state.limiter.max_requests(), &decision);
    response
}

async fn handle_subscribe(
    state: &AppState,
    payload: SubscribeRequest,
    ip: &str,
) -> Result<Response, ApiError> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::InvalidRequest("email is required".to_string()));
    }

    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        return Err(ApiError::InvalidRequest("invalid email address".to_string()));
    }

    let remote_ip = (ip != UNKNOWN_CLIENT).then_some(ip);
    let token = payload.token.as_deref().unwrap_or_default();
    if !state.verifier.verify(token, remote_ip).await {
        return Err(ApiError::VerificationFailed);
    }

    let subscriber = state.store.insert(&email)?;
    info!(id = subscriber.id, "new waitlist signup");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Email saved successfully")),
    )
        .into_response())
}

fn rate_limited_response(decision: &RateLimitDecision) -> Response {
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(serde_json::json!({
            "error": "rate_limit_exceeded",
            "message": "too many signup attempts, try again later",
            "code": 429,
            "reset": decision.reset_epoch_secs(),
        })),
    )
        .into_response()
}

fn apply_rate_limit_headers(response: &mut Response, limit: u32, decision: &RateLimitDecision) {
    let headers = response.headers_mut();
    if let Ok(value) = limit.to_string().parse() {
        headers.insert("X-RateLimit-Limit", value);
    }
    if let Ok(value) = decision.remaining.to_string().parse() {
        headers.insert("X-RateLimit-Remaining", value);
    }
    if let Ok(value) = decision.reset_epoch_secs().to_string().parse() {
        headers.insert("X-RateLimit-Reset", value);
    }
}

/// GET /api/emails — public count, or the token-gated admin views.
pub async fn list_emails(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    if params.stats || params.include_deleted {
        state
            .auth
            .validate(&headers)
            .map_err(|e| ApiError::Unauthorized(e.to_string()))?;
    }

    if params.stats {
        let stats = state.store.stats()?;
        info!("admin action: stats requested");
        return Ok(Json(stats).into_response());
    }

    if params.include_deleted {
        let emails = state.store.all_including_deleted()?;
        let stats = state.store.stats()?;
        info!("admin action: full listing requested");
        return Ok(Json(AdminListResponse { emails, stats }).into_response());
    }

    let count = state.store.count_active()?;
    Ok(Json(CountResponse { count }).into_response())
}

/// GET /api/emails/:id — single record, soft-deleted or not.
pub async fn get_email(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    match state.store.get(id)? {
        Some(subscriber) => Ok(Json(subscriber).into_response()),
        None => Err(ApiError::NotFound),
    }
}

/// DELETE /api/emails/:id — admin soft delete.
pub async fn delete_email(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    state
        .auth
        .validate(&headers)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    let id = parse_id(&id)?;
    if !state.store.soft_delete(id)? {
        return Err(ApiError::NotFound);
    }

    info!(id, "admin action: email soft deleted");
    Ok(Json(MessageResponse::new("Email deleted successfully")).into_response())
}

/// PATCH /api/emails/:id — admin restore via `{ "action": "restore" }`.
pub async fn update_email(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<ActionRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    state
        .auth
        .validate(&headers)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    let id = parse_id(&id)?;
    let Json(payload) = body.map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))?;

    if payload.action != "restore" {
        return Err(ApiError::InvalidRequest(
            "unrecognized action, use action: \"restore\"".to_string(),
        ));
    }

    if !state.store.restore(id)? {
        return Err(ApiError::NotFound);
    }

    info!(id, "admin action: email restored");
    Ok(Json(MessageResponse::new("Email restored successfully")).into_response())
}

/// GET /health — liveness probe.
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse::healthy())
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::InvalidRequest("invalid id".to_string()))
}
