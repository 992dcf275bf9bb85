pub mod auth;
pub mod blog;
pub mod customers;
pub mod health;
pub mod menu;
pub mod reservations;
pub mod reviews;
pub mod settings;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderValue, header};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Identity of an authenticated admin, taken from the bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AdminClaims {
    pub admin_id: Uuid,
}

impl FromRequestParts<AppState> for AdminClaims {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(ApiError::AuthenticationFailed)?
            .to_str()
            .map_err(|_| ApiError::InvalidToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::InvalidToken)?;

        let admin_id = state
            .tokens
            .verify(token)
            .map_err(|_| ApiError::InvalidToken)?;

        Ok(AdminClaims { admin_id })
    }
}

pub fn cors_layer(allowed_origins: Option<&[String]>) -> CorsLayer {
    let Some(origins) = allowed_origins else {
        return CorsLayer::permissive();
    };

    let origins = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn create_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .merge(health::router())
        .merge(menu::router())
        .merge(reservations::router(&state))
        .merge(customers::router())
        .merge(blog::router())
        .merge(reviews::router(&state))
        .merge(settings::router())
        .merge(auth::router(&state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        menu::full_menu,
        menu::list_categories,
        menu::get_category,
        menu::create_category,
        menu::update_category,
        menu::delete_category,
        menu::list_items,
        menu::get_item,
        menu::create_item,
        menu::update_item,
        menu::delete_item,
        reservations::list_time_slots,
        reservations::create_time_slot,
        reservations::generate_time_slots,
        reservations::update_time_slot,
        reservations::delete_time_slot,
        reservations::create_reservation,
        reservations::list_reservations,
        reservations::get_reservation,
        reservations::update_reservation_status,
        reservations::cancel_reservation,
        reservations::delete_reservation,
        customers::list_customers,
        customers::get_customer,
        blog::list_posts,
        blog::get_post,
        blog::create_post,
        blog::update_post,
        blog::delete_post,
        blog::list_all_posts,
        blog::list_categories,
        blog::create_category,
        blog::delete_category,
        reviews::list_reviews,
        reviews::submit_review,
        reviews::review_summary,
        reviews::list_all_reviews,
        reviews::approve_review,
        reviews::delete_review,
        settings::get_settings,
        settings::update_settings,
        auth::issue_token,
        auth::get_profile,
    ),
    components(
        schemas(
            crate::models::ApiErrorResponse,
            crate::models::HealthResponse,
            crate::models::MenuCategoryResponse,
            crate::models::MenuItemResponse,
            crate::models::MenuSection,
            crate::models::CreateMenuCategoryRequest,
            crate::models::UpdateMenuCategoryRequest,
            crate::models::CreateMenuItemRequest,
            crate::models::UpdateMenuItemRequest,
            crate::models::TimeSlotResponse,
            crate::models::CreateTimeSlotRequest,
            crate::models::UpdateTimeSlotRequest,
            crate::models::GenerateSlotsRequest,
            crate::models::GenerateSlotsResponse,
            crate::models::CreateReservationRequest,
            crate::models::ReservationResponse,
            crate::models::UpdateReservationStatusRequest,
            crate::models::CancelReservationRequest,
            crate::models::CustomerResponse,
            crate::models::CustomerReservation,
            crate::models::CustomerDetailResponse,
            crate::models::BlogPostResponse,
            crate::models::BlogPostPage,
            crate::models::CreateBlogPostRequest,
            crate::models::UpdateBlogPostRequest,
            crate::models::BlogCategoryResponse,
            crate::models::CreateBlogCategoryRequest,
            crate::models::ReviewResponse,
            crate::models::ReviewPage,
            crate::models::CreateReviewRequest,
            crate::models::ReviewSummaryResponse,
            crate::models::SettingsResponse,
            crate::models::UpdateSettingsRequest,
            crate::models::IssueTokenRequest,
            crate::models::IssueTokenResponse,
            crate::models::AdminProfile,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness endpoint"),
        (name = "menu", description = "Menu categories and items"),
        (name = "time-slots", description = "Bookable time slots"),
        (name = "reservations", description = "Table reservations"),
        (name = "customers", description = "Guests who made reservations"),
        (name = "blog", description = "Blog posts and categories"),
        (name = "reviews", description = "Guest reviews and moderation"),
        (name = "settings", description = "Restaurant settings"),
        (name = "auth", description = "Admin authentication")
    ),
    info(
        title = "Bistro API",
        description = "Backend for the restaurant website",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            use utoipa::openapi::security::*;
            let password_flow = Password::new("/api/auth/token", Scopes::default());
            components.add_security_scheme(
                "bearer",
                SecurityScheme::OAuth2(OAuth2::new([Flow::Password(password_flow)])),
            );
        }
    }
}
