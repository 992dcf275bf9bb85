use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{delete, get},
};
use bistro_service::blog::{self, NewBlogCategory, NewPost, PostFilter, PostUpdate};
use bistro_service::pagination::PageRequest;
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::*;

use super::{AdminClaims, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/blog/posts", get(list_posts).post(create_post))
        // GET looks posts up by slug, PUT and DELETE by id.
        .route(
            "/api/blog/posts/{post}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/api/admin/blog/posts", get(list_all_posts))
        .route(
            "/api/blog/categories",
            get(list_categories).post(create_category),
        )
        .route("/api/blog/categories/{id}", delete(delete_category))
}

#[utoipa::path(
    get,
    path = "/api/blog/posts",
    params(BlogPostQuery),
    responses(
        (status = 200, description = "Published posts, newest first", body = BlogPostPage),
        (status = 404, description = "Unknown category", body = ApiErrorResponse),
    ),
    tag = "blog"
)]
#[instrument(skip(state))]
pub async fn list_posts(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<BlogPostQuery>,
) -> Result<Json<BlogPostPage>, ApiError> {
    let filter = PostFilter {
        category_slug: query.category,
    };
    let page = PageRequest::new(query.page, query.per_page);
    let posts = state
        .db(move |conn| blog::list_published(conn, &filter, page))
        .await?;
    Ok(Json(posts.into()))
}

#[utoipa::path(
    get,
    path = "/api/blog/posts/{slug}",
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "Published post", body = BlogPostResponse),
        (status = 404, description = "Post not found", body = ApiErrorResponse),
    ),
    tag = "blog"
)]
#[instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<BlogPostResponse>, ApiError> {
    let post = state
        .db(move |conn| blog::get_published_by_slug(conn, &slug))
        .await?;
    Ok(Json(post.into()))
}

#[utoipa::path(
    get,
    path = "/api/admin/blog/posts",
    params(PageQuery),
    responses(
        (status = 200, description = "All posts including drafts", body = BlogPostPage),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "blog"
)]
#[instrument(skip(state))]
pub async fn list_all_posts(
    State(state): State<AppState>,
    _admin: AdminClaims,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<BlogPostPage>, ApiError> {
    let page = PageRequest::new(query.page, query.per_page);
    let posts = state.db(move |conn| blog::list_all(conn, page)).await?;
    Ok(Json(posts.into()))
}

#[utoipa::path(
    post,
    path = "/api/blog/posts",
    request_body = CreateBlogPostRequest,
    responses(
        (status = 201, description = "Post created", body = BlogPostResponse),
        (status = 400, description = "Invalid post", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 409, description = "Slug already in use", body = ApiErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "blog"
)]
#[instrument(skip(state))]
pub async fn create_post(
    State(state): State<AppState>,
    _admin: AdminClaims,
    ApiJson(payload): ApiJson<CreateBlogPostRequest>,
) -> Result<(StatusCode, Json<BlogPostResponse>), ApiError> {
    let new_post = NewPost {
        category_id: payload.category_id,
        title: payload.title,
        slug: payload.slug,
        excerpt: payload.excerpt,
        content: payload.content,
        cover_image_url: payload.cover_image_url,
        author: payload.author,
        published: payload.published,
    };
    let post = state
        .db(move |conn| blog::create_post(conn, new_post))
        .await?;
    Ok((StatusCode::CREATED, Json(post.into())))
}

#[utoipa::path(
    put,
    path = "/api/blog/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body = UpdateBlogPostRequest,
    responses(
        (status = 200, description = "Post updated", body = BlogPostResponse),
        (status = 400, description = "Invalid post", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Post not found", body = ApiErrorResponse),
        (status = 409, description = "Slug already in use", body = ApiErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "blog"
)]
#[instrument(skip(state))]
pub async fn update_post(
    State(state): State<AppState>,
    _admin: AdminClaims,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateBlogPostRequest>,
) -> Result<Json<BlogPostResponse>, ApiError> {
    let update = PostUpdate {
        category_id: payload.category_id,
        title: payload.title,
        slug: payload.slug,
        excerpt: payload.excerpt,
        content: payload.content,
        cover_image_url: payload.cover_image_url,
        author: payload.author,
        published: payload.published,
    };
    let post = state
        .db(move |conn| blog::update_post(conn, id, update))
        .await?;
    Ok(Json(post.into()))
}

#[utoipa::path(
    delete,
    path = "/api/blog/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Post not found", body = ApiErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "blog"
)]
#[instrument(skip(state))]
pub async fn delete_post(
    State(state): State<AppState>,
    _admin: AdminClaims,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.db(move |conn| blog::delete_post(conn, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/blog/categories",
    responses(
        (status = 200, description = "Blog categories", body = Vec<BlogCategoryResponse>),
    ),
    tag = "blog"
)]
#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<BlogCategoryResponse>>, ApiError> {
    let categories = state.db(blog::list_categories).await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/api/blog/categories",
    request_body = CreateBlogCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = BlogCategoryResponse),
        (status = 400, description = "Invalid category", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 409, description = "Slug already in use", body = ApiErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "blog"
)]
#[instrument(skip(state))]
pub async fn create_category(
    State(state): State<AppState>,
    _admin: AdminClaims,
    ApiJson(payload): ApiJson<CreateBlogCategoryRequest>,
) -> Result<(StatusCode, Json<BlogCategoryResponse>), ApiError> {
    let new_category = NewBlogCategory {
        name: payload.name,
        slug: payload.slug,
    };
    let category = state
        .db(move |conn| blog::create_category(conn, new_category))
        .await?;
    Ok((StatusCode::CREATED, Json(category.into())))
}

#[utoipa::path(
    delete,
    path = "/api/blog/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted, its posts become uncategorized"),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 404, description = "Category not found", body = ApiErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "blog"
)]
#[instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    _admin: AdminClaims,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .db(move |conn| blog::delete_category(conn, id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
