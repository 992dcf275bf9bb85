use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::get,
};
use bistro_service::menu::{
    self, CategoryUpdate, ItemFilter, MenuItemUpdate, NewCategory, NewMenuItem,
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::*;

use super::{AdminClaims, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/menu", get(full_menu))
        .route(
            "/api/menu/categories",
            get(list_categories).post(create_category),
        )
        .route(
            "/api/menu/categories/{id}",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
        .route("/api/menu/items", get(list_items).post(create_item))
        .route(
            "/api/menu/items/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
}

#[utoipa::path(
    get,
    path = "/api/menu",
    responses(
        (status = 200, description = "Categories with their available items", body = Vec<MenuSection>),
    ),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn full_menu(State(state): State<AppState>) -> Result<Json<Vec<MenuSection>>, ApiError> {
    let sections = state.db(menu::full_menu).await?;
    Ok(Json(sections.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/menu/categories",
    responses(
        (status = 200, description = "Menu categories", body = Vec<MenuCategoryResponse>),
    ),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<MenuCategoryResponse>>, ApiError> {
    let categories = state.db(menu::list_categories).await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/menu/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Menu category", body = MenuCategoryResponse),
        (status = 404, description = "Category not found", body = ApiErrorResponse),
    ),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn get_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MenuCategoryResponse>, ApiError> {
    let category = state.db(move |conn| menu::get_category(conn, id)).await?;
    Ok(Json(category.into()))
}

#[utoipa::path(
    post,
    path = "/api/menu/categories",
    request_body = CreateMenuCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = MenuCategoryResponse),
        (status = 400, description = "Invalid category", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 409, description = "Slug already in use", body = ApiErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn create_category(
    State(state): State<AppState>,
    _admin: AdminClaims,
    ApiJson(payload): ApiJson<CreateMenuCategoryRequest>,
) -> Result<(StatusCode, Json<MenuCategoryResponse>), ApiError> {
    let new_category = NewCategory {
        name: payload.name,
        slug: payload.slug,
        description: payload.description,
        sort_order: payload.sort_order,
    };
    let category = state
        .db(move |conn| menu::create_category(conn, new_category))
        .await?;
    Ok((StatusCode::CREATED, Json(category.into())))
}

#[utoipa::path(
    put,
    path = "/api/menu/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = UpdateMenuCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = MenuCategoryResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Category not found", body = ApiErrorResponse),
        (status = 409, description = "Slug already in use", body = ApiErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn update_category(
    State(state): State<AppState>,
    _admin: AdminClaims,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateMenuCategoryRequest>,
) -> Result<Json<MenuCategoryResponse>, ApiError> {
    let update = CategoryUpdate {
        name: payload.name,
        slug: payload.slug,
        description: payload.description,
        sort_order: payload.sort_order,
    };
    let category = state
        .db(move |conn| menu::update_category(conn, id, update))
        .await?;
    Ok(Json(category.into()))
}

#[utoipa::path(
    delete,
    path = "/api/menu/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Category not found", body = ApiErrorResponse),
        (status = 409, description = "Category still has items", body = ApiErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    _admin: AdminClaims,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.db(move |conn| menu::delete_category(conn, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/menu/items",
    params(MenuItemQuery),
    responses(
        (status = 200, description = "Menu items", body = Vec<MenuItemResponse>),
    ),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn list_items(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MenuItemQuery>,
) -> Result<Json<Vec<MenuItemResponse>>, ApiError> {
    let filter = ItemFilter {
        category_id: query.category_id,
        available: query.available,
        featured: query.featured,
    };
    let items = state.db(move |conn| menu::list_items(conn, filter)).await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/menu/items/{id}",
    params(("id" = Uuid, Path, description = "Menu item ID")),
    responses(
        (status = 200, description = "Menu item", body = MenuItemResponse),
        (status = 404, description = "Menu item not found", body = ApiErrorResponse),
    ),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn get_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MenuItemResponse>, ApiError> {
    let item = state.db(move |conn| menu::get_item(conn, id)).await?;
    Ok(Json(item.into()))
}

#[utoipa::path(
    post,
    path = "/api/menu/items",
    request_body = CreateMenuItemRequest,
    responses(
        (status = 201, description = "Menu item created", body = MenuItemResponse),
        (status = 400, description = "Invalid item or unknown category", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn create_item(
    State(state): State<AppState>,
    _admin: AdminClaims,
    ApiJson(payload): ApiJson<CreateMenuItemRequest>,
) -> Result<(StatusCode, Json<MenuItemResponse>), ApiError> {
    let new_item = NewMenuItem {
        category_id: payload.category_id,
        name: payload.name,
        description: payload.description,
        price: payload.price,
        image_url: payload.image_url,
        dietary_tags: payload.dietary_tags,
        is_available: payload.is_available,
        is_featured: payload.is_featured,
        sort_order: payload.sort_order,
    };
    let item = state
        .db(move |conn| menu::create_item(conn, new_item))
        .await?;
    Ok((StatusCode::CREATED, Json(item.into())))
}

#[utoipa::path(
    put,
    path = "/api/menu/items/{id}",
    params(("id" = Uuid, Path, description = "Menu item ID")),
    request_body = UpdateMenuItemRequest,
    responses(
        (status = 200, description = "Menu item updated", body = MenuItemResponse),
        (status = 400, description = "Invalid item or unknown category", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Menu item not found", body = ApiErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn update_item(
    State(state): State<AppState>,
    _admin: AdminClaims,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateMenuItemRequest>,
) -> Result<Json<MenuItemResponse>, ApiError> {
    let update = MenuItemUpdate {
        category_id: payload.category_id,
        name: payload.name,
        description: payload.description,
        price: payload.price,
        image_url: payload.image_url,
        dietary_tags: payload.dietary_tags,
        is_available: payload.is_available,
        is_featured: payload.is_featured,
        sort_order: payload.sort_order,
    };
    let item = state
        .db(move |conn| menu::update_item(conn, id, update))
        .await?;
    Ok(Json(item.into()))
}

#[utoipa::path(
    delete,
    path = "/api/menu/items/{id}",
    params(("id" = Uuid, Path, description = "Menu item ID")),
    responses(
        (status = 204, description = "Menu item deleted"),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Menu item not found", body = ApiErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn delete_item(
    State(state): State<AppState>,
    _admin: AdminClaims,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.db(move |conn| menu::delete_item(conn, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
