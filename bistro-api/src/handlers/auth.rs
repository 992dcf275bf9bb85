use axum::{
    Router,
    extract::State,
    handler::Handler,
    middleware,
    response::Json,
    routing::{get, post},
};
use bistro_service::auth;
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::extract::ApiForm;
use crate::models::*;
use crate::rate_limit::login_rate_limit;

use super::{AdminClaims, AppState};

pub fn router(state: &AppState) -> Router<AppState> {
    let rate_limited_token =
        issue_token.layer(middleware::from_fn_with_state(state.clone(), login_rate_limit));

    Router::new()
        .route("/api/auth/token", post(rate_limited_token))
        .route("/api/auth/me", get(get_profile))
}

#[utoipa::path(
    post,
    path = "/api/auth/token",
    request_body(content = IssueTokenRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Token issued successfully", body = IssueTokenResponse),
        (status = 401, description = "Invalid credentials", body = ApiErrorResponse),
        (status = 429, description = "Too many requests", body = ApiErrorResponse),
    ),
    tag = "auth"
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn issue_token(
    State(state): State<AppState>,
    ApiForm(payload): ApiForm<IssueTokenRequest>,
) -> Result<Json<IssueTokenResponse>, ApiError> {
    if payload.grant_type != "password" {
        return Err(ApiError::AuthenticationFailed);
    }

    let admin = state
        .db(move |conn| auth::authenticate(conn, &payload.username, &payload.password))
        .await?;
    let token = state.tokens.issue(admin.id)?;
    info!(admin_id = %admin.id, "access token issued");

    Ok(Json(IssueTokenResponse {
        token_type: token.token_type,
        access_token: token.access_token,
        expires_in: token.expires_in,
    }))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Profile of the signed-in admin", body = AdminProfile),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    admin: AdminClaims,
) -> Result<Json<AdminProfile>, ApiError> {
    let profile = state
        .db(move |conn| auth::get_admin(conn, admin.admin_id))
        .await?;
    Ok(Json(profile.into()))
}
