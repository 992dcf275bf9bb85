use chrono::Utc;
use diesel::{dsl::count, insert_into, prelude::*, PgConnection};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::events::EventPublisher;
use crate::menu::validate_name;
use crate::models::Review;
use crate::pagination::{Page, PageRequest};
use crate::{schema, ServiceError};

pub const MAX_COMMENT_LEN: usize = 2000;

#[derive(Debug, Clone)]
pub struct NewReview {
    pub author_name: String,
    pub rating: i32,
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReviewSummary {
    pub count: i64,
    pub average: f64,
    /// Number of reviews per star rating, index 0 holds one-star reviews.
    pub distribution: [i64; 5],
}

/// Folds `(rating, count)` pairs into a summary; out-of-range ratings are
/// ignored.
pub fn summarize(counts: impl IntoIterator<Item = (i16, i64)>) -> ReviewSummary {
    let mut distribution = [0i64; 5];
    for (rating, n) in counts {
        if (1..=5).contains(&rating) {
            distribution[(rating - 1) as usize] += n;
        }
    }

    let count: i64 = distribution.iter().sum();
    let weighted: i64 = distribution
        .iter()
        .enumerate()
        .map(|(i, n)| (i as i64 + 1) * n)
        .sum();
    let average = if count == 0 {
        0.0
    } else {
        (weighted as f64 / count as f64 * 10.0).round() / 10.0
    };

    ReviewSummary {
        count,
        average,
        distribution,
    }
}

fn validate(payload: &NewReview) -> Result<(String, i16, String), ServiceError> {
    let author_name = validate_name("Name", &payload.author_name)?;
    if !(1..=5).contains(&payload.rating) {
        return Err(ServiceError::invalid("Rating must be between 1 and 5"));
    }
    let comment = payload.comment.trim();
    if comment.is_empty() {
        return Err(ServiceError::invalid("Comment is required"));
    }
    if comment.chars().count() > MAX_COMMENT_LEN {
        return Err(ServiceError::invalid(format!(
            "Comment must be at most {MAX_COMMENT_LEN} characters"
        )));
    }
    Ok((author_name, payload.rating as i16, comment.to_string()))
}

pub fn submit(conn: &mut PgConnection, payload: NewReview) -> Result<Review, ServiceError> {
    let (author_name, rating, comment) = validate(&payload)?;
    let review = Review {
        id: Uuid::new_v4(),
        author_name,
        rating,
        comment,
        approved: false,
        created_at: Utc::now(),
    };

    conn.transaction(|conn| {
        insert_into(schema::reviews::table)
            .values(&review)
            .execute(conn)?;
        EventPublisher::new(conn).review_submitted(&review)?;
        Ok::<_, ServiceError>(())
    })?;
    info!(review_id = %review.id, rating = review.rating, "review submitted");
    Ok(review)
}

pub fn list_approved(conn: &mut PgConnection, page: PageRequest) -> Result<Page<Review>, ServiceError> {
    use schema::reviews::dsl::*;

    let total: i64 = reviews.filter(approved.eq(true)).count().get_result(conn)?;
    let items = reviews
        .filter(approved.eq(true))
        .select(Review::as_select())
        .order(created_at.desc())
        .limit(page.limit())
        .offset(page.offset())
        .load(conn)?;
    Ok(Page::new(items, page, total))
}

pub fn summary(conn: &mut PgConnection) -> Result<ReviewSummary, ServiceError> {
    use schema::reviews::dsl::*;

    let counts = reviews
        .filter(approved.eq(true))
        .group_by(rating)
        .select((rating, count(id)))
        .load::<(i16, i64)>(conn)?;
    Ok(summarize(counts))
}

pub fn list_all(conn: &mut PgConnection, approved_filter: Option<bool>) -> Result<Vec<Review>, ServiceError> {
    use schema::reviews::dsl::*;

    let mut query = reviews.select(Review::as_select()).into_boxed();
    if let Some(flag) = approved_filter {
        query = query.filter(approved.eq(flag));
    }
    Ok(query.order(created_at.desc()).load(conn)?)
}

pub fn approve(conn: &mut PgConnection, review_id: Uuid) -> Result<Review, ServiceError> {
    let review = diesel::update(schema::reviews::table.find(review_id))
        .set(schema::reviews::approved.eq(true))
        .returning(Review::as_returning())
        .get_result(conn)
        .optional()?
        .ok_or_else(|| ServiceError::not_found("Review"))?;
    info!(%review_id, "review approved");
    Ok(review)
}

pub fn delete(conn: &mut PgConnection, review_id: Uuid) -> Result<(), ServiceError> {
    let deleted = diesel::delete(schema::reviews::table.find(review_id)).execute(conn)?;
    if deleted == 0 {
        return Err(ServiceError::not_found("Review"));
    }
    info!(%review_id, "review deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(Vec::new());
        assert_eq!(summary.count, 0);
        assert_eq!(summary.average, 0.0);
        assert_eq!(summary.distribution, [0; 5]);
    }

    #[test]
    fn test_summarize_rounds_average() {
        // 5,5,4 => 4.666.. => 4.7
        let summary = summarize(vec![(5, 2), (4, 1)]);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.average, 4.7);
        assert_eq!(summary.distribution, [0, 0, 0, 1, 2]);
    }

    #[test]
    fn test_summarize_ignores_out_of_range() {
        let summary = summarize(vec![(0, 4), (6, 1), (3, 2)]);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.average, 3.0);
    }

    #[test]
    fn test_validate_review() {
        let ok = NewReview {
            author_name: " Marta ".to_string(),
            rating: 4,
            comment: " Lovely risotto. ".to_string(),
        };
        let (name, rating, comment) = validate(&ok).unwrap();
        assert_eq!(name, "Marta");
        assert_eq!(rating, 4);
        assert_eq!(comment, "Lovely risotto.");

        let bad_rating = NewReview { rating: 6, ..ok.clone() };
        assert!(validate(&bad_rating).is_err());

        let long = NewReview {
            comment: "a".repeat(MAX_COMMENT_LEN + 1),
            ..ok
        };
        assert!(validate(&long).is_err());
    }
}
