use std::env;

use diesel::r2d2::{ConnectionManager, Pool};
use diesel::{Connection, PgConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use dotenvy::dotenv;

pub mod auth;
pub mod blog;
pub mod customers;
pub mod error;
pub mod events;
pub mod menu;
pub mod models;
pub mod pagination;
pub mod reservations;
pub mod reviews;
pub mod schema;
pub mod seed;
pub mod settings;
pub mod slug;
pub mod timefmt;

pub use error::ServiceError;

pub const RESERVATION_EVENT_CHANNEL: &str = "reservation.event";
pub const REVIEW_EVENT_CHANNEL: &str = "review.event";

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub fn establish_connection() -> Result<PgConnection, ServiceError> {
    dotenv().ok();

    let database_url = env::var("DATABASE_URL")
        .map_err(|_| ServiceError::Internal("DATABASE_URL must be set".to_string()))?;
    PgConnection::establish(&database_url)
        .map_err(|e| ServiceError::Internal(format!("Error connecting to database: {e}")))
}

/// Builds a connection pool without opening any connection up front.
pub fn build_pool(database_url: &str, max_size: u32) -> DbPool {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder().max_size(max_size).build_unchecked(manager)
}

pub fn run_migrations(conn: &mut PgConnection) -> Result<usize, ServiceError> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| ServiceError::Internal(format!("Failed to run migrations: {e}")))?;
    Ok(applied.len())
}
