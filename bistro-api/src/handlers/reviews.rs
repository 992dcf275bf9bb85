use axum::{
    Router,
    extract::State,
    handler::Handler,
    http::StatusCode,
    middleware,
    response::Json,
    routing::{delete, get, post},
};
use bistro_service::pagination::PageRequest;
use bistro_service::reviews::{self, NewReview};
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::*;
use crate::rate_limit::review_rate_limit;

use super::{AdminClaims, AppState};

pub fn router(state: &AppState) -> Router<AppState> {
    let rate_limited_submit =
        submit_review.layer(middleware::from_fn_with_state(state.clone(), review_rate_limit));

    Router::new()
        .route("/api/reviews", get(list_reviews).post(rate_limited_submit))
        .route("/api/reviews/summary", get(review_summary))
        .route("/api/admin/reviews", get(list_all_reviews))
        .route("/api/reviews/{id}/approve", post(approve_review))
        .route("/api/reviews/{id}", delete(delete_review))
}

#[utoipa::path(
    get,
    path = "/api/reviews",
    params(PageQuery),
    responses(
        (status = 200, description = "Approved reviews, newest first", body = ReviewPage),
    ),
    tag = "reviews"
)]
#[instrument(skip(state))]
pub async fn list_reviews(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<ReviewPage>, ApiError> {
    let page = PageRequest::new(query.page, query.per_page);
    let approved = state
        .db(move |conn| reviews::list_approved(conn, page))
        .await?;
    Ok(Json(approved.into()))
}

#[utoipa::path(
    post,
    path = "/api/reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review received, awaiting moderation", body = ReviewResponse),
        (status = 400, description = "Invalid review", body = ApiErrorResponse),
        (status = 429, description = "Too many requests", body = ApiErrorResponse),
    ),
    tag = "reviews"
)]
#[instrument(skip(state))]
pub async fn submit_review(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>), ApiError> {
    let new_review = NewReview {
        author_name: payload.author_name,
        rating: payload.rating,
        comment: payload.comment,
    };
    let review = state
        .db(move |conn| reviews::submit(conn, new_review))
        .await?;
    Ok((StatusCode::CREATED, Json(review.into())))
}

#[utoipa::path(
    get,
    path = "/api/reviews/summary",
    responses(
        (status = 200, description = "Rating summary over approved reviews", body = ReviewSummaryResponse),
    ),
    tag = "reviews"
)]
#[instrument(skip(state))]
pub async fn review_summary(
    State(state): State<AppState>,
) -> Result<Json<ReviewSummaryResponse>, ApiError> {
    let summary = state.db(reviews::summary).await?;
    Ok(Json(summary.into()))
}

#[utoipa::path(
    get,
    path = "/api/admin/reviews",
    params(AdminReviewQuery),
    responses(
        (status = 200, description = "All reviews, optionally filtered by approval", body = Vec<ReviewResponse>),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "reviews"
)]
#[instrument(skip(state))]
pub async fn list_all_reviews(
    State(state): State<AppState>,
    _admin: AdminClaims,
    ApiQuery(query): ApiQuery<AdminReviewQuery>,
) -> Result<Json<Vec<ReviewResponse>>, ApiError> {
    let found = state
        .db(move |conn| reviews::list_all(conn, query.approved))
        .await?;
    Ok(Json(found.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/api/reviews/{id}/approve",
    params(("id" = Uuid, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Review approved", body = ReviewResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Review not found", body = ApiErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "reviews"
)]
#[instrument(skip(state))]
pub async fn approve_review(
    State(state): State<AppState>,
    _admin: AdminClaims,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let review = state.db(move |conn| reviews::approve(conn, id)).await?;
    Ok(Json(review.into()))
}

#[utoipa::path(
    delete,
    path = "/api/reviews/{id}",
    params(("id" = Uuid, Path, description = "Review ID")),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Review not found", body = ApiErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "reviews"
)]
#[instrument(skip(state))]
pub async fn delete_review(
    State(state): State<AppState>,
    _admin: AdminClaims,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.db(move |conn| reviews::delete(conn, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
