use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Invalid credentials")]
    Unauthorized,
    #[error("database error: {0}")]
    Database(DieselError),
    #[error("connection pool error: {0}")]
    Pool(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(what: &str) -> Self {
        ServiceError::NotFound(format!("{what} not found"))
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        ServiceError::InvalidArgument(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ServiceError::Conflict(message.into())
    }
}

impl From<DieselError> for ServiceError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => ServiceError::NotFound("Record not found".to_string()),
            DieselError::DatabaseError(kind, info) => match kind {
                DatabaseErrorKind::UniqueViolation => ServiceError::Conflict(format!(
                    "A record with the same {} already exists",
                    info.constraint_name()
                        .and_then(constraint_field)
                        .unwrap_or("key")
                )),
                DatabaseErrorKind::ForeignKeyViolation => ServiceError::InvalidArgument(
                    "Referenced record does not exist or is still in use".to_string(),
                ),
                DatabaseErrorKind::CheckViolation | DatabaseErrorKind::NotNullViolation => {
                    ServiceError::InvalidArgument(info.message().to_string())
                }
                _ => ServiceError::Database(DieselError::DatabaseError(kind, info)),
            },
            other => ServiceError::Database(other),
        }
    }
}

impl From<diesel::r2d2::PoolError> for ServiceError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        ServiceError::Pool(err.to_string())
    }
}

/// Postgres names unique constraints `<table>_<column>_key`.
fn constraint_field(constraint: &str) -> Option<&str> {
    let stripped = constraint.strip_suffix("_key")?;
    [
        "menu_categories_",
        "blog_categories_",
        "blog_posts_",
        "customers_",
        "admin_users_",
        "time_slots_",
    ]
    .iter()
    .find_map(|table| stripped.strip_prefix(table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_not_found() {
        let err: ServiceError = DieselError::NotFound.into();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn test_constraint_field() {
        assert_eq!(constraint_field("blog_posts_slug_key"), Some("slug"));
        assert_eq!(
            constraint_field("time_slots_slot_date_start_time_key"),
            Some("slot_date_start_time")
        );
        assert_eq!(constraint_field("menu_items_pkey"), None);
    }

    #[test]
    fn test_other_diesel_errors_stay_database_errors() {
        let err: ServiceError = DieselError::RollbackTransaction.into();
        assert!(matches!(err, ServiceError::Database(_)));
    }
}
