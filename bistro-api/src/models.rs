use bistro_service::blog::reading_minutes;
use bistro_service::menu::CategoryWithItems;
use bistro_service::models::{
    AdminUser, BlogCategory, BlogPost, Customer, MenuCategory, MenuItem, Reservation,
    RestaurantSettings, Review, TimeSlot,
};
use bistro_service::pagination::Page;
use bistro_service::reservations::{ReservationDetails, SlotAvailability};
use bistro_service::reviews::ReviewSummary;
use bistro_service::settings::OpeningHours;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in PATCH-like bodies.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn hhmm(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorResponse {
    /// Error message
    pub error: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// Menu

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuCategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MenuCategory> for MenuCategoryResponse {
    fn from(c: MenuCategory) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
            description: c.description,
            sort_order: c.sort_order,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuItemResponse {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Decimal price with two fraction digits, e.g. "14.50"
    pub price: String,
    pub image_url: Option<String>,
    pub dietary_tags: Vec<String>,
    pub is_available: bool,
    pub is_featured: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MenuItem> for MenuItemResponse {
    fn from(i: MenuItem) -> Self {
        Self {
            id: i.id,
            category_id: i.category_id,
            name: i.name,
            description: i.description,
            price: i.price.with_scale(2).to_string(),
            image_url: i.image_url,
            dietary_tags: i.dietary_tags,
            is_available: i.is_available,
            is_featured: i.is_featured,
            sort_order: i.sort_order,
            created_at: i.created_at,
            updated_at: i.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuSection {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub items: Vec<MenuItemResponse>,
}

impl From<CategoryWithItems> for MenuSection {
    fn from(section: CategoryWithItems) -> Self {
        Self {
            id: section.category.id,
            name: section.category.name,
            slug: section.category.slug,
            description: section.category.description,
            items: section.items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMenuCategoryRequest {
    pub name: String,
    /// Derived from the name when omitted
    pub slug: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMenuCategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMenuItemRequest {
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Decimal price, e.g. "14.50"
    pub price: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub dietary_tags: Vec<String>,
    pub is_available: Option<bool>,
    pub is_featured: Option<bool>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMenuItemRequest {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub price: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub image_url: Option<Option<String>>,
    pub dietary_tags: Option<Vec<String>>,
    pub is_available: Option<bool>,
    pub is_featured: Option<bool>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MenuItemQuery {
    pub category_id: Option<Uuid>,
    pub available: Option<bool>,
    pub featured: Option<bool>,
}

// Time slots and reservations

#[derive(Debug, Serialize, ToSchema)]
pub struct TimeSlotResponse {
    pub id: Uuid,
    pub date: NaiveDate,
    /// HH:MM
    pub start_time: String,
    /// HH:MM
    pub end_time: String,
    pub capacity: i32,
    pub is_active: bool,
    /// Seats held by pending and confirmed reservations
    pub booked: i64,
    pub remaining: i64,
}

impl From<SlotAvailability> for TimeSlotResponse {
    fn from(a: SlotAvailability) -> Self {
        Self {
            id: a.slot.id,
            date: a.slot.slot_date,
            start_time: hhmm(a.slot.start_time),
            end_time: hhmm(a.slot.end_time),
            capacity: a.slot.capacity,
            is_active: a.slot.is_active,
            booked: a.booked,
            remaining: a.remaining,
        }
    }
}

impl From<TimeSlot> for TimeSlotResponse {
    fn from(slot: TimeSlot) -> Self {
        SlotAvailability::new(slot, 0).into()
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TimeSlotQuery {
    /// YYYY-MM-DD, defaults to today
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTimeSlotRequest {
    /// YYYY-MM-DD
    pub date: String,
    /// HH:MM
    pub start_time: String,
    /// HH:MM
    pub end_time: String,
    /// Defaults to the configured slot capacity
    pub capacity: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTimeSlotRequest {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub capacity: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateSlotsRequest {
    /// First day, YYYY-MM-DD; defaults to today
    pub from: Option<String>,
    pub days: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GenerateSlotsResponse {
    pub inserted: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReservationRequest {
    pub time_slot_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub party_size: i32,
    pub special_requests: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReservationResponse {
    pub id: Uuid,
    pub time_slot_id: Uuid,
    pub customer_id: Uuid,
    pub date: NaiveDate,
    /// HH:MM
    pub start_time: String,
    /// HH:MM
    pub end_time: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub party_size: i32,
    /// PENDING, CONFIRMED, CANCELLED, COMPLETED or NO_SHOW
    pub status: String,
    pub special_requests: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ReservationDetails> for ReservationResponse {
    fn from(details: ReservationDetails) -> Self {
        let ReservationDetails { reservation: r, slot } = details;
        Self {
            id: r.id,
            time_slot_id: r.time_slot_id,
            customer_id: r.customer_id,
            date: slot.slot_date,
            start_time: hhmm(slot.start_time),
            end_time: hhmm(slot.end_time),
            name: r.name,
            email: r.email,
            phone: r.phone,
            party_size: r.party_size,
            status: r.status.to_string(),
            special_requests: r.special_requests,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReservationQuery {
    /// YYYY-MM-DD
    pub date: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateReservationStatusRequest {
    /// CONFIRMED, CANCELLED, COMPLETED or NO_SHOW
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelReservationRequest {
    /// Email the reservation was made with
    pub email: String,
}

// Customers

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub reservation_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Customer> for CustomerResponse {
    fn from(c: Customer) -> Self {
        Self {
            id: c.id,
            name: c.name,
            email: c.email,
            phone: c.phone,
            reservation_count: c.reservation_count,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerReservation {
    pub id: Uuid,
    pub time_slot_id: Uuid,
    pub party_size: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<Reservation> for CustomerReservation {
    fn from(r: Reservation) -> Self {
        Self {
            id: r.id,
            time_slot_id: r.time_slot_id,
            party_size: r.party_size,
            status: r.status.to_string(),
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerDetailResponse {
    pub customer: CustomerResponse,
    pub reservations: Vec<CustomerReservation>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CustomerQuery {
    /// Matches name or email
    pub search: Option<String>,
}

// Blog

#[derive(Debug, Serialize, ToSchema)]
pub struct BlogPostResponse {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image_url: Option<String>,
    pub author: String,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub reading_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BlogPost> for BlogPostResponse {
    fn from(p: BlogPost) -> Self {
        Self {
            reading_minutes: reading_minutes(&p.content),
            id: p.id,
            category_id: p.category_id,
            title: p.title,
            slug: p.slug,
            excerpt: p.excerpt,
            content: p.content,
            cover_image_url: p.cover_image_url,
            author: p.author,
            published: p.published,
            published_at: p.published_at,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BlogPostPage {
    pub items: Vec<BlogPostResponse>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

impl From<Page<BlogPost>> for BlogPostPage {
    fn from(page: Page<BlogPost>) -> Self {
        let page = page.map(BlogPostResponse::from);
        Self {
            items: page.items,
            page: page.page,
            per_page: page.per_page,
            total: page.total,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BlogPostQuery {
    pub category: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBlogPostRequest {
    pub category_id: Option<Uuid>,
    pub title: String,
    /// Derived from the title when omitted
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image_url: Option<String>,
    pub author: String,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBlogPostRequest {
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub category_id: Option<Option<Uuid>>,
    pub title: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub excerpt: Option<Option<String>>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub cover_image_url: Option<Option<String>>,
    pub author: Option<String>,
    pub published: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BlogCategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<BlogCategory> for BlogCategoryResponse {
    fn from(c: BlogCategory) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBlogCategoryRequest {
    pub name: String,
    pub slug: Option<String>,
}

// Reviews

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub author_name: String,
    pub rating: i16,
    pub comment: String,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(r: Review) -> Self {
        Self {
            id: r.id,
            author_name: r.author_name,
            rating: r.rating,
            comment: r.comment,
            approved: r.approved,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewPage {
    pub items: Vec<ReviewResponse>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

impl From<Page<Review>> for ReviewPage {
    fn from(page: Page<Review>) -> Self {
        let page = page.map(ReviewResponse::from);
        Self {
            items: page.items,
            page: page.page,
            per_page: page.per_page,
            total: page.total,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    pub author_name: String,
    /// 1 to 5
    pub rating: i32,
    pub comment: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewSummaryResponse {
    pub count: i64,
    /// Rounded to one decimal, 0 when there are no reviews
    pub average: f64,
    /// Review counts for 1 to 5 stars
    #[schema(value_type = Vec<i64>)]
    pub distribution: [i64; 5],
}

impl From<ReviewSummary> for ReviewSummaryResponse {
    fn from(s: ReviewSummary) -> Self {
        Self {
            count: s.count,
            average: s.average,
            distribution: s.distribution,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminReviewQuery {
    pub approved: Option<bool>,
}

// Settings

#[derive(Debug, Serialize, ToSchema)]
pub struct SettingsResponse {
    pub name: String,
    pub tagline: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Weekday name to `{"open": "HH:MM", "close": "HH:MM"}` or null when closed
    #[schema(value_type = Object)]
    pub opening_hours: serde_json::Value,
    pub slot_minutes: i32,
    pub default_slot_capacity: i32,
    pub max_party_size: i32,
    pub updated_at: DateTime<Utc>,
}

impl From<RestaurantSettings> for SettingsResponse {
    fn from(s: RestaurantSettings) -> Self {
        Self {
            name: s.name,
            tagline: s.tagline,
            phone: s.phone,
            email: s.email,
            address: s.address,
            opening_hours: s.opening_hours,
            slot_minutes: s.slot_minutes,
            default_slot_capacity: s.default_slot_capacity,
            max_party_size: s.max_party_size,
            updated_at: s.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSettingsRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub tagline: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub address: Option<Option<String>>,
    #[schema(value_type = Option<Object>)]
    pub opening_hours: Option<OpeningHours>,
    pub slot_minutes: Option<i32>,
    pub default_slot_capacity: Option<i32>,
    pub max_party_size: Option<i32>,
}

// Auth

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IssueTokenRequest {
    /// Grant type (must be "password")
    pub grant_type: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IssueTokenResponse {
    /// Always "bearer"
    pub token_type: String,
    pub access_token: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminProfile {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<AdminUser> for AdminProfile {
    fn from(a: AdminUser) -> Self {
        Self {
            id: a.id,
            username: a.username,
            created_at: a.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_patch_distinguishes_null_from_missing() {
        let missing: UpdateMenuCategoryRequest = serde_json::from_str(r#"{"name": "Wine"}"#).unwrap();
        assert_eq!(missing.description, None);

        let cleared: UpdateMenuCategoryRequest =
            serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));

        let set: UpdateMenuCategoryRequest =
            serde_json::from_str(r#"{"description": "Natural wines"}"#).unwrap();
        assert_eq!(set.description, Some(Some("Natural wines".to_string())));
    }

    #[test]
    fn test_menu_item_price_has_two_decimals() {
        let now = Utc::now();
        let item = MenuItem {
            id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            name: "Burrata".to_string(),
            description: None,
            price: BigDecimal::from_str("14.5").unwrap(),
            image_url: None,
            dietary_tags: vec!["vegetarian".to_string()],
            is_available: true,
            is_featured: false,
            sort_order: 0,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(MenuItemResponse::from(item).price, "14.50");
    }

    #[test]
    fn test_time_slot_formats_times() {
        let slot = TimeSlot {
            id: Uuid::new_v4(),
            slot_date: NaiveDate::from_ymd_opt(2030, 5, 4).unwrap(),
            start_time: NaiveTime::from_hms_opt(18, 30, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            capacity: 20,
            is_active: true,
        };
        let response = TimeSlotResponse::from(SlotAvailability::new(slot, 12));
        assert_eq!(response.start_time, "18:30");
        assert_eq!(response.end_time, "19:00");
        assert_eq!(response.remaining, 8);
    }
}
