use chrono::Utc;
use diesel::{insert_into, prelude::*, upsert::excluded, PgConnection};
use uuid::Uuid;

use crate::models::{Customer, Reservation};
use crate::{schema, ServiceError};

#[derive(Debug, Clone)]
pub struct CustomerContact {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Trimmed, lowercased address with a local part and a dotted domain.
pub fn normalize_email(value: &str) -> Result<String, ServiceError> {
    let email = value.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(ServiceError::invalid(format!("Invalid email address '{value}'")))
    }
}

/// Inserts the customer or refreshes the existing row for the same email,
/// counting one more reservation either way.
pub fn upsert_by_email(
    conn: &mut PgConnection,
    contact: &CustomerContact,
) -> Result<Customer, ServiceError> {
    use schema::customers::dsl::*;

    let now = Utc::now();
    let customer = Customer {
        id: Uuid::new_v4(),
        name: contact.name.clone(),
        email: contact.email.clone(),
        phone: contact.phone.clone(),
        reservation_count: 1,
        created_at: now,
        updated_at: now,
    };

    let query = insert_into(customers).values(&customer).on_conflict(email);
    let result = if contact.phone.is_some() {
        query
            .do_update()
            .set((
                name.eq(excluded(name)),
                phone.eq(excluded(phone)),
                reservation_count.eq(reservation_count + 1),
                updated_at.eq(now),
            ))
            .returning(Customer::as_returning())
            .get_result(conn)?
    } else {
        query
            .do_update()
            .set((
                name.eq(excluded(name)),
                reservation_count.eq(reservation_count + 1),
                updated_at.eq(now),
            ))
            .returning(Customer::as_returning())
            .get_result(conn)?
    };
    Ok(result)
}

pub fn list_customers(
    conn: &mut PgConnection,
    search: Option<&str>,
) -> Result<Vec<Customer>, ServiceError> {
    use schema::customers::dsl::*;

    let mut query = customers.select(Customer::as_select()).into_boxed();
    if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = format!("%{}%", escape_like(term));
        query = query.filter(name.ilike(pattern.clone()).or(email.ilike(pattern)));
    }
    Ok(query.order(name.asc()).load(conn)?)
}

pub fn get_customer(
    conn: &mut PgConnection,
    customer_id: Uuid,
) -> Result<(Customer, Vec<Reservation>), ServiceError> {
    let customer = schema::customers::table
        .find(customer_id)
        .select(Customer::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ServiceError::not_found("Customer"))?;

    let reservations = Reservation::belonging_to(&customer)
        .select(Reservation::as_select())
        .order(schema::reservations::created_at.desc())
        .load(conn)?;

    Ok((customer, reservations))
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email("  Guest@Example.COM ").unwrap(),
            "guest@example.com"
        );
        assert!(normalize_email("guest").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("guest@localhost").is_err());
        assert!(normalize_email("gu est@example.com").is_err());
        assert!(normalize_email("a@b@example.com").is_err());
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
    }
}
