use axum::{Router, extract::State, response::Json, routing::get};
use bistro_service::customers;
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::{ApiPath, ApiQuery};
use crate::models::*;

use super::{AdminClaims, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/customers", get(list_customers))
        .route("/api/customers/{id}", get(get_customer))
}

#[utoipa::path(
    get,
    path = "/api/customers",
    params(CustomerQuery),
    responses(
        (status = 200, description = "Customers", body = Vec<CustomerResponse>),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "customers"
)]
#[instrument(skip(state))]
pub async fn list_customers(
    State(state): State<AppState>,
    _admin: AdminClaims,
    ApiQuery(query): ApiQuery<CustomerQuery>,
) -> Result<Json<Vec<CustomerResponse>>, ApiError> {
    let found = state
        .db(move |conn| customers::list_customers(conn, query.search.as_deref()))
        .await?;
    Ok(Json(found.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer with reservation history", body = CustomerDetailResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Customer not found", body = ApiErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "customers"
)]
#[instrument(skip(state))]
pub async fn get_customer(
    State(state): State<AppState>,
    _admin: AdminClaims,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<CustomerDetailResponse>, ApiError> {
    let (customer, reservations) = state
        .db(move |conn| customers::get_customer(conn, id))
        .await?;
    Ok(Json(CustomerDetailResponse {
        customer: customer.into(),
        reservations: reservations.into_iter().map(Into::into).collect(),
    }))
}
