use axum::{Router, extract::State, response::Json, routing::get};
use bistro_service::settings::{self, SettingsUpdate};
use tracing::instrument;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::models::*;

use super::{AdminClaims, AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/settings", get(get_settings).put(update_settings))
}

#[utoipa::path(
    get,
    path = "/api/settings",
    responses(
        (status = 200, description = "Restaurant settings", body = SettingsResponse),
    ),
    tag = "settings"
)]
#[instrument(skip(state))]
pub async fn get_settings(State(state): State<AppState>) -> Result<Json<SettingsResponse>, ApiError> {
    let current = state.db(settings::get).await?;
    Ok(Json(current.into()))
}

#[utoipa::path(
    put,
    path = "/api/settings",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Settings updated", body = SettingsResponse),
        (status = 400, description = "Invalid settings", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "settings"
)]
#[instrument(skip(state))]
pub async fn update_settings(
    State(state): State<AppState>,
    _admin: AdminClaims,
    ApiJson(payload): ApiJson<UpdateSettingsRequest>,
) -> Result<Json<SettingsResponse>, ApiError> {
    let update = SettingsUpdate {
        name: payload.name,
        tagline: payload.tagline,
        phone: payload.phone,
        email: payload.email,
        address: payload.address,
        opening_hours: payload.opening_hours,
        slot_minutes: payload.slot_minutes,
        default_slot_capacity: payload.default_slot_capacity,
        max_party_size: payload.max_party_size,
    };
    let updated = state
        .db(move |conn| settings::update(conn, update))
        .await?;
    Ok(Json(updated.into()))
}
