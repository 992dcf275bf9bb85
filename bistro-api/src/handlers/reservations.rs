use axum::{
    Router,
    extract::State,
    handler::Handler,
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, patch, post, put},
};
use bistro_service::models::{ReservationStatus, TimeSlotChanges};
use bistro_service::reservations::{self, NewReservation, NewTimeSlot, ReservationFilter};
use bistro_service::{settings, timefmt};
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::*;
use crate::rate_limit::reservation_rate_limit;

use super::{AdminClaims, AppState};

pub fn router(state: &AppState) -> Router<AppState> {
    let rate_limited_create = create_reservation.layer(middleware::from_fn_with_state(
        state.clone(),
        reservation_rate_limit,
    ));

    Router::new()
        .route(
            "/api/time-slots",
            get(list_time_slots).post(create_time_slot),
        )
        .route("/api/time-slots/generate", post(generate_time_slots))
        .route(
            "/api/time-slots/{id}",
            put(update_time_slot).delete(delete_time_slot),
        )
        .route(
            "/api/reservations",
            get(list_reservations).post(rate_limited_create),
        )
        .route(
            "/api/reservations/{id}",
            get(get_reservation).delete(delete_reservation),
        )
        .route(
            "/api/reservations/{id}/status",
            patch(update_reservation_status),
        )
        .route("/api/reservations/{id}/cancel", post(cancel_reservation))
}

fn parse_status(value: &str) -> Result<ReservationStatus, ApiError> {
    value.parse::<ReservationStatus>().map_err(ApiError::BadRequest)
}

#[utoipa::path(
    get,
    path = "/api/time-slots",
    params(TimeSlotQuery),
    responses(
        (status = 200, description = "Active slots for the day with remaining seats", body = Vec<TimeSlotResponse>),
        (status = 400, description = "Invalid date", body = ApiErrorResponse),
    ),
    tag = "time-slots"
)]
#[instrument(skip(state))]
pub async fn list_time_slots(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TimeSlotQuery>,
) -> Result<Json<Vec<TimeSlotResponse>>, ApiError> {
    let date = match query.date.as_deref() {
        Some(value) => timefmt::parse_date(value)?,
        None => reservations::local_now().date(),
    };
    let slots = state
        .db(move |conn| reservations::availability(conn, date, false))
        .await?;
    Ok(Json(slots.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/api/time-slots",
    request_body = CreateTimeSlotRequest,
    responses(
        (status = 201, description = "Time slot created", body = TimeSlotResponse),
        (status = 400, description = "Invalid slot", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 409, description = "A slot already starts at that time", body = ApiErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "time-slots"
)]
#[instrument(skip(state))]
pub async fn create_time_slot(
    State(state): State<AppState>,
    _admin: AdminClaims,
    ApiJson(payload): ApiJson<CreateTimeSlotRequest>,
) -> Result<(StatusCode, Json<TimeSlotResponse>), ApiError> {
    let slot_date = timefmt::parse_date(&payload.date)?;
    let start_time = timefmt::parse_time(&payload.start_time)?;
    let end_time = timefmt::parse_time(&payload.end_time)?;

    let slot = state
        .db(move |conn| {
            let capacity = match payload.capacity {
                Some(capacity) => capacity,
                None => settings::get(conn)?.default_slot_capacity,
            };
            reservations::create_slot(
                conn,
                NewTimeSlot {
                    slot_date,
                    start_time,
                    end_time,
                    capacity,
                    is_active: payload.is_active,
                },
            )
        })
        .await?;
    Ok((StatusCode::CREATED, Json(slot.into())))
}

#[utoipa::path(
    post,
    path = "/api/time-slots/generate",
    request_body = GenerateSlotsRequest,
    responses(
        (status = 200, description = "Slots generated from the opening hours", body = GenerateSlotsResponse),
        (status = 400, description = "Invalid range", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "time-slots"
)]
#[instrument(skip(state))]
pub async fn generate_time_slots(
    State(state): State<AppState>,
    _admin: AdminClaims,
    ApiJson(payload): ApiJson<GenerateSlotsRequest>,
) -> Result<Json<GenerateSlotsResponse>, ApiError> {
    let from = match payload.from.as_deref() {
        Some(value) => timefmt::parse_date(value)?,
        None => reservations::local_now().date(),
    };
    let inserted = state
        .db(move |conn| reservations::generate_slots(conn, from, payload.days))
        .await?;
    Ok(Json(GenerateSlotsResponse { inserted }))
}

#[utoipa::path(
    put,
    path = "/api/time-slots/{id}",
    params(("id" = Uuid, Path, description = "Time slot ID")),
    request_body = UpdateTimeSlotRequest,
    responses(
        (status = 200, description = "Time slot updated", body = TimeSlotResponse),
        (status = 400, description = "Invalid slot", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Time slot not found", body = ApiErrorResponse),
        (status = 409, description = "Capacity below booked seats", body = ApiErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "time-slots"
)]
#[instrument(skip(state))]
pub async fn update_time_slot(
    State(state): State<AppState>,
    _admin: AdminClaims,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateTimeSlotRequest>,
) -> Result<Json<TimeSlotResponse>, ApiError> {
    let changes = TimeSlotChanges {
        start_time: payload
            .start_time
            .as_deref()
            .map(timefmt::parse_time)
            .transpose()?,
        end_time: payload
            .end_time
            .as_deref()
            .map(timefmt::parse_time)
            .transpose()?,
        capacity: payload.capacity,
        is_active: payload.is_active,
    };
    let slot = state
        .db(move |conn| reservations::update_slot(conn, id, changes))
        .await?;
    Ok(Json(slot.into()))
}

#[utoipa::path(
    delete,
    path = "/api/time-slots/{id}",
    params(("id" = Uuid, Path, description = "Time slot ID")),
    responses(
        (status = 204, description = "Time slot deleted"),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Time slot not found", body = ApiErrorResponse),
        (status = 409, description = "Slot has reservations", body = ApiErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "time-slots"
)]
#[instrument(skip(state))]
pub async fn delete_time_slot(
    State(state): State<AppState>,
    _admin: AdminClaims,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .db(move |conn| reservations::delete_slot(conn, id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/reservations",
    request_body = CreateReservationRequest,
    responses(
        (status = 201, description = "Reservation received, pending confirmation", body = ReservationResponse),
        (status = 400, description = "Invalid reservation or slot not bookable", body = ApiErrorResponse),
        (status = 404, description = "Time slot not found", body = ApiErrorResponse),
        (status = 409, description = "Not enough capacity", body = ApiErrorResponse),
        (status = 429, description = "Too many requests", body = ApiErrorResponse),
    ),
    tag = "reservations"
)]
#[instrument(skip(state))]
pub async fn create_reservation(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateReservationRequest>,
) -> Result<(StatusCode, Json<ReservationResponse>), ApiError> {
    let new_reservation = NewReservation {
        time_slot_id: payload.time_slot_id,
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        party_size: payload.party_size,
        special_requests: payload.special_requests,
    };
    let now = reservations::local_now();
    let details = state
        .db(move |conn| reservations::create_reservation(conn, new_reservation, now))
        .await?;
    Ok((StatusCode::CREATED, Json(details.into())))
}

#[utoipa::path(
    get,
    path = "/api/reservations",
    params(ReservationQuery),
    responses(
        (status = 200, description = "Reservations", body = Vec<ReservationResponse>),
        (status = 400, description = "Invalid filter", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "reservations"
)]
#[instrument(skip(state))]
pub async fn list_reservations(
    State(state): State<AppState>,
    _admin: AdminClaims,
    ApiQuery(query): ApiQuery<ReservationQuery>,
) -> Result<Json<Vec<ReservationResponse>>, ApiError> {
    let filter = ReservationFilter {
        date: query.date.as_deref().map(timefmt::parse_date).transpose()?,
        status: query.status.as_deref().map(parse_status).transpose()?,
    };
    let found = state
        .db(move |conn| reservations::list_reservations(conn, filter))
        .await?;
    Ok(Json(found.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/reservations/{id}",
    params(("id" = Uuid, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation", body = ReservationResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Reservation not found", body = ApiErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "reservations"
)]
#[instrument(skip(state))]
pub async fn get_reservation(
    State(state): State<AppState>,
    _admin: AdminClaims,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ReservationResponse>, ApiError> {
    let details = state
        .db(move |conn| reservations::get_reservation(conn, id))
        .await?;
    Ok(Json(details.into()))
}

#[utoipa::path(
    patch,
    path = "/api/reservations/{id}/status",
    params(("id" = Uuid, Path, description = "Reservation ID")),
    request_body = UpdateReservationStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ReservationResponse),
        (status = 400, description = "Unknown status", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Reservation not found", body = ApiErrorResponse),
        (status = 409, description = "Transition not allowed", body = ApiErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "reservations"
)]
#[instrument(skip(state))]
pub async fn update_reservation_status(
    State(state): State<AppState>,
    _admin: AdminClaims,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateReservationStatusRequest>,
) -> Result<Json<ReservationResponse>, ApiError> {
    let next = parse_status(&payload.status)?;
    let details = state
        .db(move |conn| reservations::update_status(conn, id, next))
        .await?;
    Ok(Json(details.into()))
}

#[utoipa::path(
    post,
    path = "/api/reservations/{id}/cancel",
    params(("id" = Uuid, Path, description = "Reservation ID")),
    request_body = CancelReservationRequest,
    responses(
        (status = 200, description = "Reservation cancelled", body = ReservationResponse),
        (status = 404, description = "No reservation with that ID and email", body = ApiErrorResponse),
        (status = 409, description = "Reservation can no longer be cancelled", body = ApiErrorResponse),
    ),
    tag = "reservations"
)]
#[instrument(skip(state))]
pub async fn cancel_reservation(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<CancelReservationRequest>,
) -> Result<Json<ReservationResponse>, ApiError> {
    let details = state
        .db(move |conn| reservations::cancel_reservation(conn, id, &payload.email))
        .await?;
    Ok(Json(details.into()))
}

#[utoipa::path(
    delete,
    path = "/api/reservations/{id}",
    params(("id" = Uuid, Path, description = "Reservation ID")),
    responses(
        (status = 204, description = "Reservation deleted"),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Reservation not found", body = ApiErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "reservations"
)]
#[instrument(skip(state))]
pub async fn delete_reservation(
    State(state): State<AppState>,
    _admin: AdminClaims,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .db(move |conn| reservations::delete_reservation(conn, id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
