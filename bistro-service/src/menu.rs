use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::Utc;
use diesel::{insert_into, prelude::*, PgConnection};
use tracing::info;
use uuid::Uuid;

use crate::models::{MenuCategory, MenuCategoryChanges, MenuItem, MenuItemChanges};
use crate::{schema, slug, ServiceError};

const MAX_NAME_LEN: usize = 100;

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<Option<String>>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewMenuItem {
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub image_url: Option<String>,
    pub dietary_tags: Vec<String>,
    pub is_available: Option<bool>,
    pub is_featured: Option<bool>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct MenuItemUpdate {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<String>,
    pub image_url: Option<Option<String>>,
    pub dietary_tags: Option<Vec<String>>,
    pub is_available: Option<bool>,
    pub is_featured: Option<bool>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ItemFilter {
    pub category_id: Option<Uuid>,
    pub available: Option<bool>,
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryWithItems {
    pub category: MenuCategory,
    pub items: Vec<MenuItem>,
}

pub fn validate_name(field: &str, value: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::invalid(format!("{field} is required")));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(ServiceError::invalid(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Prices are positive amounts with at most two decimal places.
pub fn parse_price(value: &str) -> Result<BigDecimal, ServiceError> {
    let price = BigDecimal::from_str(value.trim())
        .map_err(|_| ServiceError::invalid(format!("Invalid price '{value}'")))?;
    if price <= BigDecimal::zero() {
        return Err(ServiceError::invalid("Price must be greater than zero"));
    }
    let (_, scale) = price.normalized().as_bigint_and_exponent();
    if scale > 2 {
        return Err(ServiceError::invalid(
            "Price must have at most two decimal places",
        ));
    }
    Ok(price.with_scale(2))
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut tags: Vec<String> = tags
        .into_iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

pub fn full_menu(conn: &mut PgConnection) -> Result<Vec<CategoryWithItems>, ServiceError> {
    let categories = list_categories(conn)?;

    let items = MenuItem::belonging_to(&categories)
        .select(MenuItem::as_select())
        .filter(schema::menu_items::is_available.eq(true))
        .order((
            schema::menu_items::sort_order.asc(),
            schema::menu_items::name.asc(),
        ))
        .load(conn)?
        .grouped_by(&categories);

    Ok(categories
        .into_iter()
        .zip(items)
        .map(|(category, items)| CategoryWithItems { category, items })
        .collect())
}

pub fn list_categories(conn: &mut PgConnection) -> Result<Vec<MenuCategory>, ServiceError> {
    use schema::menu_categories::dsl::*;

    Ok(menu_categories
        .select(MenuCategory::as_select())
        .order((sort_order.asc(), name.asc()))
        .load(conn)?)
}

pub fn get_category(conn: &mut PgConnection, category_id: Uuid) -> Result<MenuCategory, ServiceError> {
    schema::menu_categories::table
        .find(category_id)
        .select(MenuCategory::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ServiceError::not_found("Menu category"))
}

pub fn create_category(
    conn: &mut PgConnection,
    payload: NewCategory,
) -> Result<MenuCategory, ServiceError> {
    let name = validate_name("Category name", &payload.name)?;
    let now = Utc::now();
    let category = MenuCategory {
        id: Uuid::new_v4(),
        slug: slug::resolve_slug(payload.slug.as_deref(), &name)?,
        name,
        description: payload.description,
        sort_order: payload.sort_order.unwrap_or(0),
        created_at: now,
        updated_at: now,
    };

    insert_into(schema::menu_categories::table)
        .values(&category)
        .execute(conn)?;
    info!(category_id = %category.id, slug = %category.slug, "menu category created");
    Ok(category)
}

pub fn update_category(
    conn: &mut PgConnection,
    category_id: Uuid,
    update: CategoryUpdate,
) -> Result<MenuCategory, ServiceError> {
    let changes = MenuCategoryChanges {
        name: update
            .name
            .map(|n| validate_name("Category name", &n))
            .transpose()?,
        slug: update
            .slug
            .map(|s| slug::resolve_slug(Some(&s), ""))
            .transpose()?,
        description: update.description,
        sort_order: update.sort_order,
        updated_at: Some(Utc::now()),
    };

    diesel::update(schema::menu_categories::table.find(category_id))
        .set(&changes)
        .returning(MenuCategory::as_returning())
        .get_result(conn)
        .optional()?
        .ok_or_else(|| ServiceError::not_found("Menu category"))
}

pub fn delete_category(conn: &mut PgConnection, category_id: Uuid) -> Result<(), ServiceError> {
    conn.transaction(|conn| {
        let item_count: i64 = schema::menu_items::table
            .filter(schema::menu_items::category_id.eq(category_id))
            .count()
            .get_result(conn)?;
        if item_count > 0 {
            return Err(ServiceError::conflict(format!(
                "Menu category still has {item_count} item(s)"
            )));
        }

        let deleted = diesel::delete(schema::menu_categories::table.find(category_id))
            .execute(conn)?;
        if deleted == 0 {
            return Err(ServiceError::not_found("Menu category"));
        }
        info!(%category_id, "menu category deleted");
        Ok(())
    })
}

pub fn list_items(conn: &mut PgConnection, filter: ItemFilter) -> Result<Vec<MenuItem>, ServiceError> {
    use schema::menu_items::dsl::*;

    let mut query = menu_items.select(MenuItem::as_select()).into_boxed();
    if let Some(cid) = filter.category_id {
        query = query.filter(category_id.eq(cid));
    }
    if let Some(available) = filter.available {
        query = query.filter(is_available.eq(available));
    }
    if let Some(featured) = filter.featured {
        query = query.filter(is_featured.eq(featured));
    }

    Ok(query
        .order((category_id.asc(), sort_order.asc(), name.asc()))
        .load(conn)?)
}

pub fn get_item(conn: &mut PgConnection, item_id: Uuid) -> Result<MenuItem, ServiceError> {
    schema::menu_items::table
        .find(item_id)
        .select(MenuItem::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ServiceError::not_found("Menu item"))
}

pub fn create_item(conn: &mut PgConnection, payload: NewMenuItem) -> Result<MenuItem, ServiceError> {
    let now = Utc::now();
    let item = MenuItem {
        id: Uuid::new_v4(),
        category_id: payload.category_id,
        name: validate_name("Item name", &payload.name)?,
        description: payload.description,
        price: parse_price(&payload.price)?,
        image_url: payload.image_url,
        dietary_tags: normalize_tags(payload.dietary_tags),
        is_available: payload.is_available.unwrap_or(true),
        is_featured: payload.is_featured.unwrap_or(false),
        sort_order: payload.sort_order.unwrap_or(0),
        created_at: now,
        updated_at: now,
    };

    insert_into(schema::menu_items::table)
        .values(&item)
        .execute(conn)?;
    info!(item_id = %item.id, category_id = %item.category_id, "menu item created");
    Ok(item)
}

pub fn update_item(
    conn: &mut PgConnection,
    item_id: Uuid,
    update: MenuItemUpdate,
) -> Result<MenuItem, ServiceError> {
    let changes = MenuItemChanges {
        category_id: update.category_id,
        name: update
            .name
            .map(|n| validate_name("Item name", &n))
            .transpose()?,
        description: update.description,
        price: update.price.map(|p| parse_price(&p)).transpose()?,
        image_url: update.image_url,
        dietary_tags: update.dietary_tags.map(normalize_tags),
        is_available: update.is_available,
        is_featured: update.is_featured,
        sort_order: update.sort_order,
        updated_at: Some(Utc::now()),
    };

    diesel::update(schema::menu_items::table.find(item_id))
        .set(&changes)
        .returning(MenuItem::as_returning())
        .get_result(conn)
        .optional()?
        .ok_or_else(|| ServiceError::not_found("Menu item"))
}

pub fn delete_item(conn: &mut PgConnection, item_id: Uuid) -> Result<(), ServiceError> {
    let deleted = diesel::delete(schema::menu_items::table.find(item_id)).execute(conn)?;
    if deleted == 0 {
        return Err(ServiceError::not_found("Menu item"));
    }
    info!(%item_id, "menu item deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("12.5").unwrap().to_string(), "12.50");
        assert_eq!(parse_price(" 8 ").unwrap().to_string(), "8.00");
        assert!(matches!(
            parse_price("0"),
            Err(ServiceError::InvalidArgument(_))
        ));
        assert!(parse_price("-3.00").is_err());
        assert!(parse_price("4.999").is_err());
        assert!(parse_price("free").is_err());
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("Name", "  Antipasti ").unwrap(), "Antipasti");
        assert!(validate_name("Name", "   ").is_err());
        assert!(validate_name("Name", &"x".repeat(101)).is_err());
    }

    #[test]
    #[ignore = "requires DATABASE_URL"]
    fn test_delete_category_with_items_conflicts() {
        let mut conn = crate::establish_connection().unwrap();
        conn.test_transaction::<_, ServiceError, _>(|conn| {
            crate::run_migrations(conn)?;
            let category = create_category(
                conn,
                NewCategory {
                    name: "Raw Bar".to_string(),
                    slug: Some("raw-bar-test".to_string()),
                    description: None,
                    sort_order: None,
                },
            )?;
            let item = create_item(
                conn,
                NewMenuItem {
                    category_id: category.id,
                    name: "Oysters".to_string(),
                    description: None,
                    price: "18".to_string(),
                    image_url: None,
                    dietary_tags: vec![],
                    is_available: None,
                    is_featured: None,
                    sort_order: None,
                },
            )?;

            assert!(matches!(
                delete_category(conn, category.id),
                Err(ServiceError::Conflict(_))
            ));
            assert_eq!(get_category(conn, category.id)?.id, category.id);

            delete_item(conn, item.id)?;
            delete_category(conn, category.id)?;
            assert!(matches!(
                get_category(conn, category.id),
                Err(ServiceError::NotFound(_))
            ));
            Ok(())
        });
    }

    #[test]
    fn test_normalize_tags() {
        let tags = normalize_tags(vec![
            "Vegan".to_string(),
            " gluten-free ".to_string(),
            "vegan".to_string(),
            "".to_string(),
        ]);
        assert_eq!(tags, vec!["gluten-free".to_string(), "vegan".to_string()]);
    }
}
