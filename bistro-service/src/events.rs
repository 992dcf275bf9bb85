use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::{prelude::*, PgConnection};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{self, NewOutbox, ReservationStatus};
use crate::{schema, RESERVATION_EVENT_CHANNEL, REVIEW_EVENT_CHANNEL};

#[derive(Serialize, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum ReservationEvent {
    ReservationCreated {
        reservation_id: Uuid,
        customer_id: Uuid,
        name: String,
        email: String,
        party_size: i32,
        slot_date: NaiveDate,
        start_time: NaiveTime,
    },
    ReservationStatusChanged {
        reservation_id: Uuid,
        email: String,
        previous: ReservationStatus,
        current: ReservationStatus,
        changed_at: DateTime<Utc>,
    },
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum ReviewEvent {
    ReviewSubmitted {
        review_id: Uuid,
        author_name: String,
        rating: i16,
    },
}

/// Writes events into the outbox table on the caller's connection, so they
/// commit or roll back together with the change that produced them.
pub struct EventPublisher<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> EventPublisher<'a> {
    pub fn new(conn: &'a mut PgConnection) -> Self {
        Self { conn }
    }

    pub fn reservation_created(
        &mut self,
        reservation: &models::Reservation,
        slot: &models::TimeSlot,
    ) -> QueryResult<()> {
        let event = ReservationEvent::ReservationCreated {
            reservation_id: reservation.id,
            customer_id: reservation.customer_id,
            name: reservation.name.clone(),
            email: reservation.email.clone(),
            party_size: reservation.party_size,
            slot_date: slot.slot_date,
            start_time: slot.start_time,
        };
        self.publish(RESERVATION_EVENT_CHANNEL, &reservation.id, &event)
    }

    pub fn reservation_status_changed(
        &mut self,
        reservation: &models::Reservation,
        previous: ReservationStatus,
    ) -> QueryResult<()> {
        let event = ReservationEvent::ReservationStatusChanged {
            reservation_id: reservation.id,
            email: reservation.email.clone(),
            previous,
            current: reservation.status,
            changed_at: reservation.updated_at,
        };
        self.publish(RESERVATION_EVENT_CHANNEL, &reservation.id, &event)
    }

    pub fn review_submitted(&mut self, review: &models::Review) -> QueryResult<()> {
        let event = ReviewEvent::ReviewSubmitted {
            review_id: review.id,
            author_name: review.author_name.clone(),
            rating: review.rating,
        };
        self.publish(REVIEW_EVENT_CHANNEL, &review.id, &event)
    }

    fn publish(&mut self, topic: &str, key: &Uuid, event: &impl Serialize) -> QueryResult<()> {
        let value = serde_json::to_vec(event)
            .map_err(|e| diesel::result::Error::SerializationError(Box::new(e)))?;

        diesel::insert_into(schema::outbox::table)
            .values(NewOutbox {
                topic: topic.to_string(),
                key: key.to_string(),
                value,
            })
            .execute(self.conn)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reservation_event_is_tagged() {
        let id = Uuid::nil();
        let event = ReservationEvent::ReservationStatusChanged {
            reservation_id: id,
            email: "guest@example.com".to_string(),
            previous: ReservationStatus::Pending,
            current: ReservationStatus::Confirmed,
            changed_at: DateTime::from_timestamp(0, 0).unwrap(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ReservationStatusChanged");
        assert_eq!(json["previous"], "PENDING");
        assert_eq!(json["current"], "CONFIRMED");
    }

    #[test]
    fn test_review_event_payload() {
        let event = ReviewEvent::ReviewSubmitted {
            review_id: Uuid::nil(),
            author_name: "Ana".to_string(),
            rating: 5,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ReviewSubmitted");
        assert_eq!(json["rating"], 5);
    }
}
