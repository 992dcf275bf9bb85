//! Demo data for local development. Every step checks for existing rows
//! first, so running the seed twice leaves the database unchanged.

use chrono::{NaiveDate, NaiveTime};
use diesel::{dsl::count_star, prelude::*, PgConnection};
use tracing::info;

use crate::blog::{self, NewBlogCategory, NewPost};
use crate::menu::{self, NewCategory, NewMenuItem};
use crate::models::{BlogCategory, MenuCategory};
use crate::reservations;
use crate::reviews::{self, NewReview};
use crate::settings::{self, DayHours, OpeningHours, SettingsUpdate};
use crate::{schema, ServiceError};

pub const SEED_SLOT_DAYS: u32 = 14;

#[derive(Debug, Default, PartialEq)]
pub struct SeedReport {
    pub menu_categories: usize,
    pub menu_items: usize,
    pub blog_posts: usize,
    pub reviews: usize,
    pub time_slots: usize,
}

struct DemoItem {
    name: &'static str,
    description: &'static str,
    price: &'static str,
    tags: &'static [&'static str],
    featured: bool,
}

const DEMO_MENU: &[(&str, &str, &[DemoItem])] = &[
    (
        "Starters",
        "Small plates to share",
        &[
            DemoItem {
                name: "Burrata",
                description: "Heirloom tomatoes, basil oil, grilled sourdough",
                price: "14.50",
                tags: &["vegetarian"],
                featured: true,
            },
            DemoItem {
                name: "Beef Tartare",
                description: "Hand-cut sirloin, capers, cured yolk",
                price: "16.00",
                tags: &["gluten-free"],
                featured: false,
            },
        ],
    ),
    (
        "Mains",
        "From the wood-fired grill",
        &[
            DemoItem {
                name: "Roast Chicken",
                description: "Half chicken, salsa verde, crispy potatoes",
                price: "26.00",
                tags: &["gluten-free"],
                featured: true,
            },
            DemoItem {
                name: "Mushroom Risotto",
                description: "Carnaroli rice, wild mushrooms, aged parmesan",
                price: "22.00",
                tags: &["vegetarian"],
                featured: false,
            },
        ],
    ),
    (
        "Desserts",
        "",
        &[DemoItem {
            name: "Dark Chocolate Tart",
            description: "Sea salt, crème fraîche",
            price: "11.00",
            tags: &["vegetarian"],
            featured: false,
        }],
    ),
];

const DEMO_REVIEWS: &[(&str, i32, &str)] = &[
    ("Maya", 5, "The roast chicken was the best I've had in years."),
    ("Tom", 4, "Lovely terrace, friendly staff. Desserts could be bigger."),
    ("Priya", 5, "Booked online for eight people and everything was ready."),
];

fn demo_hours() -> OpeningHours {
    let day = |open: u32, close: u32| {
        NaiveTime::from_hms_opt(open, 0, 0)
            .zip(NaiveTime::from_hms_opt(close, 0, 0))
            .map(|(open, close)| DayHours { open, close })
    };
    OpeningHours {
        monday: None,
        tuesday: day(17, 22),
        wednesday: day(17, 22),
        thursday: day(17, 22),
        friday: day(17, 23),
        saturday: day(12, 23),
        sunday: day(12, 21),
    }
}

fn find_menu_category(
    conn: &mut PgConnection,
    category_slug: &str,
) -> Result<Option<MenuCategory>, ServiceError> {
    Ok(schema::menu_categories::table
        .filter(schema::menu_categories::slug.eq(category_slug))
        .select(MenuCategory::as_select())
        .first(conn)
        .optional()?)
}

fn find_blog_category(
    conn: &mut PgConnection,
    category_slug: &str,
) -> Result<Option<BlogCategory>, ServiceError> {
    Ok(schema::blog_categories::table
        .filter(schema::blog_categories::slug.eq(category_slug))
        .select(BlogCategory::as_select())
        .first(conn)
        .optional()?)
}

fn seed_menu(conn: &mut PgConnection, report: &mut SeedReport) -> Result<(), ServiceError> {
    for (position, (name, description, items)) in DEMO_MENU.iter().enumerate() {
        let category_slug = crate::slug::slugify(name);
        if find_menu_category(conn, &category_slug)?.is_some() {
            continue;
        }

        let category = menu::create_category(
            conn,
            NewCategory {
                name: name.to_string(),
                slug: Some(category_slug),
                description: (!description.is_empty()).then(|| description.to_string()),
                sort_order: Some(position as i32),
            },
        )?;
        report.menu_categories += 1;

        for (item_position, item) in items.iter().enumerate() {
            menu::create_item(
                conn,
                NewMenuItem {
                    category_id: category.id,
                    name: item.name.to_string(),
                    description: Some(item.description.to_string()),
                    price: item.price.to_string(),
                    image_url: None,
                    dietary_tags: item.tags.iter().map(|t| t.to_string()).collect(),
                    is_available: Some(true),
                    is_featured: Some(item.featured),
                    sort_order: Some(item_position as i32),
                },
            )?;
            report.menu_items += 1;
        }
    }
    Ok(())
}

fn seed_blog(conn: &mut PgConnection, report: &mut SeedReport) -> Result<(), ServiceError> {
    let category = match find_blog_category(conn, "news")? {
        Some(category) => category,
        None => blog::create_category(
            conn,
            NewBlogCategory {
                name: "News".to_string(),
                slug: Some("news".to_string()),
            },
        )?,
    };

    let post_slug = "we-are-open";
    let exists = schema::blog_posts::table
        .filter(schema::blog_posts::slug.eq(post_slug))
        .select(count_star())
        .get_result::<i64>(conn)?
        > 0;
    if !exists {
        blog::create_post(
            conn,
            NewPost {
                category_id: Some(category.id),
                title: "We are open".to_string(),
                slug: Some(post_slug.to_string()),
                excerpt: Some("Our doors open this week with a seasonal menu.".to_string()),
                content: "After months of work our kitchen is finally ready. \
                          Expect a short seasonal menu that changes every week, \
                          natural wines and a terrace open until late."
                    .to_string(),
                cover_image_url: None,
                author: "The Kitchen".to_string(),
                published: true,
            },
        )?;
        report.blog_posts += 1;
    }
    Ok(())
}

fn seed_reviews(conn: &mut PgConnection, report: &mut SeedReport) -> Result<(), ServiceError> {
    let existing = schema::reviews::table
        .select(count_star())
        .get_result::<i64>(conn)?;
    if existing > 0 {
        return Ok(());
    }

    for (author, rating, comment) in DEMO_REVIEWS {
        let review = reviews::submit(
            conn,
            NewReview {
                author_name: author.to_string(),
                rating: *rating,
                comment: comment.to_string(),
            },
        )?;
        reviews::approve(conn, review.id)?;
        report.reviews += 1;
    }
    Ok(())
}

/// Loads the demo data set and generates slots starting at `today`.
pub fn run(conn: &mut PgConnection, today: NaiveDate) -> Result<SeedReport, ServiceError> {
    conn.transaction(|conn| {
        let mut report = SeedReport::default();

        let current = settings::get(conn)?.parsed_opening_hours()?;
        if current == OpeningHours::default() {
            settings::update(
                conn,
                SettingsUpdate {
                    tagline: Some(Some("Seasonal cooking, wood-fired grill".to_string())),
                    opening_hours: Some(demo_hours()),
                    ..Default::default()
                },
            )?;
        }

        seed_menu(conn, &mut report)?;
        seed_blog(conn, &mut report)?;
        seed_reviews(conn, &mut report)?;
        report.time_slots = reservations::generate_slots(conn, today, SEED_SLOT_DAYS)?;

        info!(?report, "seed finished");
        Ok(report)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_hours_are_valid() {
        let hours = demo_hours();
        hours.validate().unwrap();
        assert!(hours.monday.is_none());
        assert!(hours.saturday.is_some());
    }

    #[test]
    fn test_demo_menu_prices_parse() {
        for (name, _, items) in DEMO_MENU {
            assert!(crate::slug::is_valid_slug(&crate::slug::slugify(name)));
            for item in items.iter() {
                menu::parse_price(item.price).unwrap();
            }
        }
    }

    #[test]
    #[ignore = "requires DATABASE_URL"]
    fn test_seed_is_idempotent() {
        let mut conn = crate::establish_connection().unwrap();
        conn.test_transaction::<_, ServiceError, _>(|conn| {
            crate::run_migrations(conn)?;
            let today = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
            run(conn, today)?;
            let second = run(conn, today)?;
            assert_eq!(second, SeedReport::default());
            Ok(())
        });
    }
}
