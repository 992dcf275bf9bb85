use chrono::{DateTime, Utc};
use diesel::{insert_into, pg::Pg, prelude::*, PgConnection};
use tracing::info;
use uuid::Uuid;

use crate::menu::validate_name;
use crate::models::{BlogCategory, BlogPost, BlogPostChanges};
use crate::pagination::{Page, PageRequest};
use crate::{schema, slug, ServiceError};

const WORDS_PER_MINUTE: usize = 200;
const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Clone)]
pub struct NewPost {
    pub category_id: Option<Uuid>,
    pub title: String,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image_url: Option<String>,
    pub author: String,
    pub published: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PostUpdate {
    pub category_id: Option<Option<Uuid>>,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<Option<String>>,
    pub content: Option<String>,
    pub cover_image_url: Option<Option<String>>,
    pub author: Option<String>,
    pub published: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub category_slug: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewBlogCategory {
    pub name: String,
    pub slug: Option<String>,
}

pub fn reading_minutes(content: &str) -> i32 {
    let words = content.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as i32
}

fn validate_title(title: &str) -> Result<String, ServiceError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ServiceError::invalid("Title is required"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ServiceError::invalid(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(title.to_string())
}

fn validate_content(content: &str) -> Result<String, ServiceError> {
    if content.trim().is_empty() {
        return Err(ServiceError::invalid("Content is required"));
    }
    Ok(content.to_string())
}

fn posts_query<'a>(
    published_only: bool,
    category_id: Option<Uuid>,
) -> schema::blog_posts::BoxedQuery<'a, Pg> {
    let mut query = schema::blog_posts::table.into_boxed();
    if published_only {
        query = query.filter(schema::blog_posts::published.eq(true));
    }
    if let Some(cid) = category_id {
        query = query.filter(schema::blog_posts::category_id.eq(cid));
    }
    query
}

fn load_page(
    conn: &mut PgConnection,
    published_only: bool,
    category_id: Option<Uuid>,
    page: PageRequest,
) -> Result<Page<BlogPost>, ServiceError> {
    let total: i64 = posts_query(published_only, category_id)
        .count()
        .get_result(conn)?;
    let posts = posts_query(published_only, category_id)
        .select(BlogPost::as_select())
        .order((
            schema::blog_posts::published_at.desc(),
            schema::blog_posts::created_at.desc(),
        ))
        .limit(page.limit())
        .offset(page.offset())
        .load(conn)?;
    Ok(Page::new(posts, page, total))
}

pub fn list_published(
    conn: &mut PgConnection,
    filter: &PostFilter,
    page: PageRequest,
) -> Result<Page<BlogPost>, ServiceError> {
    let category_id = match &filter.category_slug {
        Some(category_slug) => Some(get_category_by_slug(conn, category_slug)?.id),
        None => None,
    };
    load_page(conn, true, category_id, page)
}

pub fn list_all(conn: &mut PgConnection, page: PageRequest) -> Result<Page<BlogPost>, ServiceError> {
    load_page(conn, false, None, page)
}

pub fn get_published_by_slug(conn: &mut PgConnection, post_slug: &str) -> Result<BlogPost, ServiceError> {
    schema::blog_posts::table
        .filter(schema::blog_posts::slug.eq(post_slug))
        .filter(schema::blog_posts::published.eq(true))
        .select(BlogPost::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ServiceError::not_found("Blog post"))
}

pub fn get_post(conn: &mut PgConnection, post_id: Uuid) -> Result<BlogPost, ServiceError> {
    schema::blog_posts::table
        .find(post_id)
        .select(BlogPost::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ServiceError::not_found("Blog post"))
}

pub fn create_post(conn: &mut PgConnection, payload: NewPost) -> Result<BlogPost, ServiceError> {
    let title = validate_title(&payload.title)?;
    let now = Utc::now();
    let post = BlogPost {
        id: Uuid::new_v4(),
        category_id: payload.category_id,
        slug: slug::resolve_slug(payload.slug.as_deref(), &title)?,
        title,
        excerpt: payload.excerpt,
        content: validate_content(&payload.content)?,
        cover_image_url: payload.cover_image_url,
        author: validate_name("Author", &payload.author)?,
        published: payload.published,
        published_at: payload.published.then_some(now),
        created_at: now,
        updated_at: now,
    };

    insert_into(schema::blog_posts::table)
        .values(&post)
        .execute(conn)?;
    info!(post_id = %post.id, slug = %post.slug, published = post.published, "blog post created");
    Ok(post)
}

pub fn update_post(
    conn: &mut PgConnection,
    post_id: Uuid,
    update: PostUpdate,
) -> Result<BlogPost, ServiceError> {
    conn.transaction(|conn| {
        let existing = schema::blog_posts::table
            .find(post_id)
            .select(BlogPost::as_select())
            .for_update()
            .first(conn)
            .optional()?
            .ok_or_else(|| ServiceError::not_found("Blog post"))?;

        let now = Utc::now();
        let changes = BlogPostChanges {
            category_id: update.category_id,
            title: update.title.as_deref().map(validate_title).transpose()?,
            slug: update
                .slug
                .as_deref()
                .map(|s| slug::resolve_slug(Some(s), ""))
                .transpose()?,
            excerpt: update.excerpt.clone(),
            content: update.content.as_deref().map(validate_content).transpose()?,
            cover_image_url: update.cover_image_url.clone(),
            author: update
                .author
                .as_deref()
                .map(|a| validate_name("Author", a))
                .transpose()?,
            published: update.published,
            published_at: published_at_change(existing.published_at, update.published, now),
            updated_at: Some(now),
        };

        let post = diesel::update(schema::blog_posts::table.find(post_id))
            .set(&changes)
            .returning(BlogPost::as_returning())
            .get_result(conn)?;
        info!(post_id = %post.id, published = post.published, "blog post updated");
        Ok(post)
    })
}

/// `published_at` is stamped the first time a post is published and never
/// touched afterwards, so unpublishing and republishing keeps the original date.
fn published_at_change(
    current: Option<DateTime<Utc>>,
    published: Option<bool>,
    now: DateTime<Utc>,
) -> Option<Option<DateTime<Utc>>> {
    (published == Some(true) && current.is_none()).then_some(Some(now))
}

pub fn delete_post(conn: &mut PgConnection, post_id: Uuid) -> Result<(), ServiceError> {
    let deleted = diesel::delete(schema::blog_posts::table.find(post_id)).execute(conn)?;
    if deleted == 0 {
        return Err(ServiceError::not_found("Blog post"));
    }
    info!(%post_id, "blog post deleted");
    Ok(())
}

pub fn list_categories(conn: &mut PgConnection) -> Result<Vec<BlogCategory>, ServiceError> {
    Ok(schema::blog_categories::table
        .select(BlogCategory::as_select())
        .order(schema::blog_categories::name.asc())
        .load(conn)?)
}

pub fn get_category_by_slug(
    conn: &mut PgConnection,
    category_slug: &str,
) -> Result<BlogCategory, ServiceError> {
    schema::blog_categories::table
        .filter(schema::blog_categories::slug.eq(category_slug))
        .select(BlogCategory::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ServiceError::not_found("Blog category"))
}

pub fn create_category(
    conn: &mut PgConnection,
    payload: NewBlogCategory,
) -> Result<BlogCategory, ServiceError> {
    let name = validate_name("Category name", &payload.name)?;
    let category = BlogCategory {
        id: Uuid::new_v4(),
        slug: slug::resolve_slug(payload.slug.as_deref(), &name)?,
        name,
    };
    insert_into(schema::blog_categories::table)
        .values(&category)
        .execute(conn)?;
    info!(category_id = %category.id, slug = %category.slug, "blog category created");
    Ok(category)
}

/// Posts in the category stay, with their category cleared.
pub fn delete_category(conn: &mut PgConnection, category_id: Uuid) -> Result<(), ServiceError> {
    let deleted =
        diesel::delete(schema::blog_categories::table.find(category_id)).execute(conn)?;
    if deleted == 0 {
        return Err(ServiceError::not_found("Blog category"));
    }
    info!(%category_id, "blog category deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_minutes() {
        assert_eq!(reading_minutes(""), 1);
        assert_eq!(reading_minutes(&"word ".repeat(200)), 1);
        assert_eq!(reading_minutes(&"word ".repeat(201)), 2);
        assert_eq!(reading_minutes(&"word\n".repeat(1000)), 5);
    }

    #[test]
    fn test_validate_title() {
        assert_eq!(validate_title("  Spring Menu  ").unwrap(), "Spring Menu");
        assert!(validate_title("").is_err());
        assert!(validate_title(&"t".repeat(201)).is_err());
    }

    #[test]
    fn test_published_at_set_once() {
        let first = Utc::now() - chrono::TimeDelta::days(3);
        let now = Utc::now();

        assert_eq!(published_at_change(None, Some(true), now), Some(Some(now)));
        assert_eq!(published_at_change(None, Some(false), now), None);
        assert_eq!(published_at_change(None, None, now), None);
        assert_eq!(published_at_change(Some(first), Some(true), now), None);
        assert_eq!(published_at_change(Some(first), Some(false), now), None);
    }

    #[test]
    #[ignore = "requires DATABASE_URL"]
    fn test_published_at_survives_republish() {
        let mut conn = crate::establish_connection().unwrap();
        conn.test_transaction::<_, ServiceError, _>(|conn| {
            crate::run_migrations(conn)?;
            let draft = create_post(
                conn,
                NewPost {
                    category_id: None,
                    title: "Truffle season".to_string(),
                    slug: Some("truffle-season-test".to_string()),
                    excerpt: None,
                    content: "Shaved over everything.".to_string(),
                    cover_image_url: None,
                    author: "Chef".to_string(),
                    published: false,
                },
            )?;
            assert_eq!(draft.published_at, None);
            assert!(get_published_by_slug(conn, &draft.slug).is_err());

            let publish = |published| PostUpdate {
                published: Some(published),
                ..Default::default()
            };
            let published = update_post(conn, draft.id, publish(true))?;
            let first_published_at = published.published_at;
            assert!(first_published_at.is_some());

            let hidden = update_post(conn, draft.id, publish(false))?;
            assert!(!hidden.published);
            assert_eq!(hidden.published_at, first_published_at);

            let republished = update_post(conn, draft.id, publish(true))?;
            assert_eq!(republished.published_at, first_published_at);
            assert_eq!(get_published_by_slug(conn, &draft.slug)?.id, draft.id);
            Ok(())
        });
    }

    #[test]
    fn test_validate_content() {
        assert!(validate_content(" \n ").is_err());
        assert_eq!(validate_content("Hello").unwrap(), "Hello");
    }
}
