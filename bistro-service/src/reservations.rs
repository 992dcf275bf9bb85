use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use diesel::{dsl::sum, insert_into, prelude::*, PgConnection};
use tracing::{info, warn};
use uuid::Uuid;

use crate::customers::{self, CustomerContact};
use crate::events::EventPublisher;
use crate::models::{Reservation, ReservationStatus, TimeSlot, TimeSlotChanges};
use crate::settings::{self, OpeningHours};
use crate::{schema, ServiceError};

pub const MAX_GENERATE_DAYS: u32 = 90;
const MAX_SPECIAL_REQUESTS_LEN: usize = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct SlotAvailability {
    pub slot: TimeSlot,
    pub booked: i64,
    pub remaining: i64,
}

impl SlotAvailability {
    pub fn new(slot: TimeSlot, booked: i64) -> Self {
        let remaining = remaining_seats(slot.capacity, booked);
        Self {
            slot,
            booked,
            remaining,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewTimeSlot {
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: i32,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewReservation {
    pub time_slot_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub party_size: i32,
    pub special_requests: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReservationFilter {
    pub date: Option<NaiveDate>,
    pub status: Option<ReservationStatus>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReservationDetails {
    pub reservation: Reservation,
    pub slot: TimeSlot,
}

pub fn remaining_seats(capacity: i32, booked: i64) -> i64 {
    (i64::from(capacity) - booked).max(0)
}

/// Decides whether `party_size` more guests fit into `slot`, given the seats
/// already held by active reservations.
pub fn check_booking(
    slot: &TimeSlot,
    booked: i64,
    party_size: i32,
    max_party_size: i32,
    now: NaiveDateTime,
) -> Result<(), ServiceError> {
    if party_size < 1 {
        return Err(ServiceError::invalid("Party size must be at least 1"));
    }
    if party_size > max_party_size {
        return Err(ServiceError::invalid(format!(
            "Parties larger than {max_party_size} must call the restaurant"
        )));
    }
    if !slot.is_active {
        return Err(ServiceError::invalid("Time slot is not available for booking"));
    }
    if slot.slot_date.and_time(slot.start_time) <= now {
        return Err(ServiceError::invalid("Time slot has already started"));
    }
    if booked + i64::from(party_size) > i64::from(slot.capacity) {
        return Err(ServiceError::conflict(format!(
            "Not enough capacity: {} seat(s) left in this time slot",
            remaining_seats(slot.capacity, booked)
        )));
    }
    Ok(())
}

/// Expands weekly opening hours into back-to-back slots of `slot_minutes`,
/// keeping only slots that end by closing time.
pub fn plan_slots(
    hours: &OpeningHours,
    from: NaiveDate,
    days: u32,
    slot_minutes: i32,
    capacity: i32,
) -> Vec<NewTimeSlot> {
    let step = Duration::minutes(i64::from(slot_minutes.max(1)));
    let mut slots = Vec::new();

    for offset in 0..days {
        let Some(date) = from.checked_add_signed(Duration::days(i64::from(offset))) else {
            break;
        };
        let Some(day) = hours.for_weekday(date.weekday()) else {
            continue;
        };

        let mut start = day.open;
        loop {
            let end = start + step;
            if end <= start || end > day.close {
                break;
            }
            slots.push(NewTimeSlot {
                slot_date: date,
                start_time: start,
                end_time: end,
                capacity,
                is_active: Some(true),
            });
            start = end;
        }
    }
    slots
}

fn validate_slot_times(start: NaiveTime, end: NaiveTime) -> Result<(), ServiceError> {
    if end <= start {
        return Err(ServiceError::invalid("Time slot must end after it starts"));
    }
    Ok(())
}

fn validate_capacity(capacity: i32) -> Result<(), ServiceError> {
    if capacity < 1 {
        return Err(ServiceError::invalid("Capacity must be at least 1"));
    }
    Ok(())
}

pub fn booked_seats(conn: &mut PgConnection, slot_id: Uuid) -> Result<i64, ServiceError> {
    use schema::reservations::dsl::*;

    let seats: Option<i64> = reservations
        .filter(time_slot_id.eq(slot_id))
        .filter(status.eq_any(ReservationStatus::ACTIVE))
        .select(sum(party_size))
        .first(conn)?;
    Ok(seats.unwrap_or(0))
}

pub fn availability(
    conn: &mut PgConnection,
    date: NaiveDate,
    include_inactive: bool,
) -> Result<Vec<SlotAvailability>, ServiceError> {
    let mut query = schema::time_slots::table
        .select(TimeSlot::as_select())
        .filter(schema::time_slots::slot_date.eq(date))
        .into_boxed();
    if !include_inactive {
        query = query.filter(schema::time_slots::is_active.eq(true));
    }
    let slots: Vec<TimeSlot> = query
        .order(schema::time_slots::start_time.asc())
        .load(conn)?;

    let slot_ids: Vec<Uuid> = slots.iter().map(|s| s.id).collect();
    let booked: HashMap<Uuid, i64> = {
        use schema::reservations::dsl::*;

        reservations
            .filter(time_slot_id.eq_any(&slot_ids))
            .filter(status.eq_any(ReservationStatus::ACTIVE))
            .group_by(time_slot_id)
            .select((time_slot_id, sum(party_size)))
            .load::<(Uuid, Option<i64>)>(conn)?
            .into_iter()
            .map(|(slot_id, seats)| (slot_id, seats.unwrap_or(0)))
            .collect()
    };

    Ok(slots
        .into_iter()
        .map(|slot| {
            let seats = booked.get(&slot.id).copied().unwrap_or(0);
            SlotAvailability::new(slot, seats)
        })
        .collect())
}

pub fn get_slot(conn: &mut PgConnection, slot_id: Uuid) -> Result<TimeSlot, ServiceError> {
    schema::time_slots::table
        .find(slot_id)
        .select(TimeSlot::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ServiceError::not_found("Time slot"))
}

pub fn create_slot(conn: &mut PgConnection, payload: NewTimeSlot) -> Result<TimeSlot, ServiceError> {
    validate_slot_times(payload.start_time, payload.end_time)?;
    validate_capacity(payload.capacity)?;

    let slot = TimeSlot {
        id: Uuid::new_v4(),
        slot_date: payload.slot_date,
        start_time: payload.start_time,
        end_time: payload.end_time,
        capacity: payload.capacity,
        is_active: payload.is_active.unwrap_or(true),
    };
    insert_into(schema::time_slots::table)
        .values(&slot)
        .execute(conn)?;
    info!(slot_id = %slot.id, date = %slot.slot_date, start = %slot.start_time, "time slot created");
    Ok(slot)
}

pub fn update_slot(
    conn: &mut PgConnection,
    slot_id: Uuid,
    changes: TimeSlotChanges,
) -> Result<SlotAvailability, ServiceError> {
    conn.transaction(|conn| {
        let slot = schema::time_slots::table
            .find(slot_id)
            .select(TimeSlot::as_select())
            .for_update()
            .first(conn)
            .optional()?
            .ok_or_else(|| ServiceError::not_found("Time slot"))?;
        let booked = booked_seats(conn, slot.id)?;

        if changes.is_empty() {
            return Ok(SlotAvailability::new(slot, booked));
        }

        validate_slot_times(
            changes.start_time.unwrap_or(slot.start_time),
            changes.end_time.unwrap_or(slot.end_time),
        )?;
        if let Some(capacity) = changes.capacity {
            validate_capacity(capacity)?;
            if i64::from(capacity) < booked {
                return Err(ServiceError::conflict(format!(
                    "Capacity cannot drop below the {booked} seat(s) already booked"
                )));
            }
        }

        let updated = diesel::update(schema::time_slots::table.find(slot_id))
            .set(&changes)
            .returning(TimeSlot::as_returning())
            .get_result(conn)?;
        Ok(SlotAvailability::new(updated, booked))
    })
}

pub fn delete_slot(conn: &mut PgConnection, slot_id: Uuid) -> Result<(), ServiceError> {
    conn.transaction(|conn| {
        let reservation_count: i64 = schema::reservations::table
            .filter(schema::reservations::time_slot_id.eq(slot_id))
            .count()
            .get_result(conn)?;
        if reservation_count > 0 {
            return Err(ServiceError::conflict(
                "Time slot has reservations; deactivate it instead",
            ));
        }

        let deleted = diesel::delete(schema::time_slots::table.find(slot_id)).execute(conn)?;
        if deleted == 0 {
            return Err(ServiceError::not_found("Time slot"));
        }
        info!(%slot_id, "time slot deleted");
        Ok(())
    })
}

/// Creates slots for `days` days starting at `from` from the configured
/// opening hours. Existing slots with the same date and start are kept.
pub fn generate_slots(
    conn: &mut PgConnection,
    from: NaiveDate,
    days: u32,
) -> Result<usize, ServiceError> {
    if days == 0 || days > MAX_GENERATE_DAYS {
        return Err(ServiceError::invalid(format!(
            "days must be between 1 and {MAX_GENERATE_DAYS}"
        )));
    }

    let settings = settings::get(conn)?;
    let hours = settings.parsed_opening_hours()?;
    let planned = plan_slots(
        &hours,
        from,
        days,
        settings.slot_minutes,
        settings.default_slot_capacity,
    );
    let rows: Vec<TimeSlot> = planned
        .into_iter()
        .map(|p| TimeSlot {
            id: Uuid::new_v4(),
            slot_date: p.slot_date,
            start_time: p.start_time,
            end_time: p.end_time,
            capacity: p.capacity,
            is_active: p.is_active.unwrap_or(true),
        })
        .collect();

    let inserted = insert_into(schema::time_slots::table)
        .values(&rows)
        .on_conflict((
            schema::time_slots::slot_date,
            schema::time_slots::start_time,
        ))
        .do_nothing()
        .execute(conn)?;
    info!(%from, days, planned = rows.len(), inserted, "time slots generated");
    Ok(inserted)
}

pub fn create_reservation(
    conn: &mut PgConnection,
    payload: NewReservation,
    now: NaiveDateTime,
) -> Result<ReservationDetails, ServiceError> {
    let contact = CustomerContact {
        name: crate::menu::validate_name("Name", &payload.name)?,
        email: customers::normalize_email(&payload.email)?,
        phone: payload
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty()),
    };
    let special_requests = payload
        .special_requests
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    if matches!(&special_requests, Some(s) if s.chars().count() > MAX_SPECIAL_REQUESTS_LEN) {
        return Err(ServiceError::invalid(format!(
            "Special requests must be at most {MAX_SPECIAL_REQUESTS_LEN} characters"
        )));
    }

    conn.transaction(|conn| {
        let settings = settings::get(conn)?;
        let slot = schema::time_slots::table
            .find(payload.time_slot_id)
            .select(TimeSlot::as_select())
            .for_update()
            .first(conn)
            .optional()?
            .ok_or_else(|| ServiceError::not_found("Time slot"))?;

        let booked = booked_seats(conn, slot.id)?;
        if let Err(err) = check_booking(&slot, booked, payload.party_size, settings.max_party_size, now)
        {
            warn!(slot_id = %slot.id, booked, party_size = payload.party_size, "reservation rejected: {err}");
            return Err(err);
        }

        let customer = customers::upsert_by_email(conn, &contact)?;
        let created_at = Utc::now();
        let reservation = Reservation {
            id: Uuid::new_v4(),
            time_slot_id: slot.id,
            customer_id: customer.id,
            name: contact.name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            party_size: payload.party_size,
            status: ReservationStatus::Pending,
            special_requests: special_requests.clone(),
            created_at,
            updated_at: created_at,
        };
        insert_into(schema::reservations::table)
            .values(&reservation)
            .execute(conn)?;

        EventPublisher::new(conn).reservation_created(&reservation, &slot)?;
        info!(reservation_id = %reservation.id, slot_id = %slot.id, party_size = reservation.party_size, "reservation created");

        Ok(ReservationDetails { reservation, slot })
    })
}

pub fn get_reservation(
    conn: &mut PgConnection,
    reservation_id: Uuid,
) -> Result<ReservationDetails, ServiceError> {
    schema::reservations::table
        .inner_join(schema::time_slots::table)
        .filter(schema::reservations::id.eq(reservation_id))
        .select((Reservation::as_select(), TimeSlot::as_select()))
        .first::<(Reservation, TimeSlot)>(conn)
        .optional()?
        .map(|(reservation, slot)| ReservationDetails { reservation, slot })
        .ok_or_else(|| ServiceError::not_found("Reservation"))
}

pub fn list_reservations(
    conn: &mut PgConnection,
    filter: ReservationFilter,
) -> Result<Vec<ReservationDetails>, ServiceError> {
    let mut query = schema::reservations::table
        .inner_join(schema::time_slots::table)
        .select((Reservation::as_select(), TimeSlot::as_select()))
        .into_boxed();
    if let Some(date) = filter.date {
        query = query.filter(schema::time_slots::slot_date.eq(date));
    }
    if let Some(status) = filter.status {
        query = query.filter(schema::reservations::status.eq(status));
    }

    Ok(query
        .order((
            schema::time_slots::slot_date.asc(),
            schema::time_slots::start_time.asc(),
            schema::reservations::created_at.asc(),
        ))
        .load::<(Reservation, TimeSlot)>(conn)?
        .into_iter()
        .map(|(reservation, slot)| ReservationDetails { reservation, slot })
        .collect())
}

fn lock_reservation(
    conn: &mut PgConnection,
    reservation_id: Uuid,
) -> Result<Reservation, ServiceError> {
    schema::reservations::table
        .find(reservation_id)
        .select(Reservation::as_select())
        .for_update()
        .first(conn)
        .optional()?
        .ok_or_else(|| ServiceError::not_found("Reservation"))
}

fn transition(
    conn: &mut PgConnection,
    reservation: Reservation,
    next: ReservationStatus,
) -> Result<Reservation, ServiceError> {
    let previous = reservation.status;
    if !previous.can_transition_to(next) {
        return Err(ServiceError::conflict(format!(
            "Cannot change reservation from {previous} to {next}"
        )));
    }

    let updated = diesel::update(schema::reservations::table.find(reservation.id))
        .set((
            schema::reservations::status.eq(next),
            schema::reservations::updated_at.eq(Utc::now()),
        ))
        .returning(Reservation::as_returning())
        .get_result(conn)?;

    EventPublisher::new(conn).reservation_status_changed(&updated, previous)?;
    info!(reservation_id = %updated.id, %previous, current = %next, "reservation status changed");
    Ok(updated)
}

pub fn update_status(
    conn: &mut PgConnection,
    reservation_id: Uuid,
    next: ReservationStatus,
) -> Result<ReservationDetails, ServiceError> {
    conn.transaction(|conn| {
        let reservation = lock_reservation(conn, reservation_id)?;
        let reservation = transition(conn, reservation, next)?;
        let slot = get_slot(conn, reservation.time_slot_id)?;
        Ok(ReservationDetails { reservation, slot })
    })
}

/// Guest self-service cancellation; the email on file acts as the credential.
pub fn cancel_reservation(
    conn: &mut PgConnection,
    reservation_id: Uuid,
    email: &str,
) -> Result<ReservationDetails, ServiceError> {
    let email = customers::normalize_email(email)?;
    conn.transaction(|conn| {
        let reservation = lock_reservation(conn, reservation_id)?;
        if reservation.email != email {
            return Err(ServiceError::not_found("Reservation"));
        }
        let reservation = transition(conn, reservation, ReservationStatus::Cancelled)?;
        let slot = get_slot(conn, reservation.time_slot_id)?;
        Ok(ReservationDetails { reservation, slot })
    })
}

pub fn delete_reservation(conn: &mut PgConnection, reservation_id: Uuid) -> Result<(), ServiceError> {
    let deleted =
        diesel::delete(schema::reservations::table.find(reservation_id)).execute(conn)?;
    if deleted == 0 {
        return Err(ServiceError::not_found("Reservation"));
    }
    info!(%reservation_id, "reservation deleted");
    Ok(())
}

/// Wall-clock time used for "slot already started" checks.
pub fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DayHours;
    use crate::timefmt::{parse_date, parse_time};

    fn slot(capacity: i32) -> TimeSlot {
        TimeSlot {
            id: Uuid::new_v4(),
            slot_date: parse_date("2030-05-10").unwrap(),
            start_time: parse_time("19:00").unwrap(),
            end_time: parse_time("19:30").unwrap(),
            capacity,
            is_active: true,
        }
    }

    fn before_service() -> NaiveDateTime {
        parse_date("2030-05-10")
            .unwrap()
            .and_time(parse_time("12:00").unwrap())
    }

    #[test]
    fn test_remaining_seats() {
        assert_eq!(remaining_seats(20, 5), 15);
        assert_eq!(remaining_seats(20, 25), 0);
        assert_eq!(SlotAvailability::new(slot(10), 4).remaining, 6);
    }

    #[test]
    fn test_check_booking_fits_exactly() {
        assert!(check_booking(&slot(10), 6, 4, 12, before_service()).is_ok());
    }

    #[test]
    fn test_check_booking_over_capacity() {
        let err = check_booking(&slot(10), 7, 4, 12, before_service()).unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert!(err.to_string().contains("3 seat(s) left"));
    }

    #[test]
    fn test_check_booking_party_size_limits() {
        assert!(matches!(
            check_booking(&slot(40), 0, 0, 12, before_service()),
            Err(ServiceError::InvalidArgument(_))
        ));
        assert!(matches!(
            check_booking(&slot(40), 0, 13, 12, before_service()),
            Err(ServiceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_check_booking_inactive_or_started() {
        let mut inactive = slot(10);
        inactive.is_active = false;
        assert!(matches!(
            check_booking(&inactive, 0, 2, 12, before_service()),
            Err(ServiceError::InvalidArgument(_))
        ));

        let started = parse_date("2030-05-10")
            .unwrap()
            .and_time(parse_time("19:00").unwrap());
        assert!(matches!(
            check_booking(&slot(10), 0, 2, 12, started),
            Err(ServiceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_plan_slots_respects_hours() {
        let mut hours = OpeningHours::default();
        // 2030-05-10 is a Friday
        hours.friday = Some(DayHours {
            open: parse_time("18:00").unwrap(),
            close: parse_time("20:15").unwrap(),
        });

        let slots = plan_slots(&hours, parse_date("2030-05-10").unwrap(), 7, 30, 16);
        let starts: Vec<String> = slots
            .iter()
            .map(|s| s.start_time.format("%H:%M").to_string())
            .collect();
        assert_eq!(starts, vec!["18:00", "18:30", "19:00", "19:30"]);
        assert!(slots.iter().all(|s| s.capacity == 16));
        assert!(slots
            .iter()
            .all(|s| s.slot_date == parse_date("2030-05-10").unwrap()));
        assert_eq!(slots.last().unwrap().end_time, parse_time("20:00").unwrap());
    }

    #[test]
    fn test_plan_slots_closed_week() {
        let slots = plan_slots(
            &OpeningHours::default(),
            parse_date("2030-05-10").unwrap(),
            14,
            30,
            10,
        );
        assert!(slots.is_empty());
    }

    #[test]
    fn test_plan_slots_does_not_wrap_midnight() {
        let mut hours = OpeningHours::default();
        hours.saturday = Some(DayHours {
            open: parse_time("23:00").unwrap(),
            close: parse_time("23:59").unwrap(),
        });
        let slots = plan_slots(&hours, parse_date("2030-05-11").unwrap(), 1, 45, 10);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].end_time, parse_time("23:45").unwrap());
    }

    #[test]
    #[ignore = "requires DATABASE_URL"]
    fn test_booking_flow_against_database() {
        let mut conn = crate::establish_connection().unwrap();
        conn.test_transaction::<_, ServiceError, _>(|conn| {
            crate::run_migrations(conn)?;
            let slot = create_slot(
                conn,
                NewTimeSlot {
                    slot_date: parse_date("2030-05-10")?,
                    start_time: parse_time("21:10")?,
                    end_time: parse_time("21:40")?,
                    capacity: 4,
                    is_active: None,
                },
            )?;
            let booking = |party_size| NewReservation {
                time_slot_id: slot.id,
                name: "Ada Lovelace".to_string(),
                email: "Ada@Example.com".to_string(),
                phone: None,
                party_size,
                special_requests: None,
            };

            let first = create_reservation(conn, booking(3), before_service())?;
            assert_eq!(first.reservation.status, ReservationStatus::Pending);
            assert_eq!(first.reservation.email, "ada@example.com");

            let err = create_reservation(conn, booking(2), before_service()).unwrap_err();
            assert!(matches!(err, ServiceError::Conflict(_)));

            let err = cancel_reservation(conn, first.reservation.id, "someone@else.com").unwrap_err();
            assert!(matches!(err, ServiceError::NotFound(_)));
            cancel_reservation(conn, first.reservation.id, "ADA@example.com")?;

            create_reservation(conn, booking(2), before_service())?;
            assert_eq!(booked_seats(conn, slot.id)?, 2);
            assert!(matches!(delete_slot(conn, slot.id), Err(ServiceError::Conflict(_))));
            Ok(())
        });
    }

    #[test]
    #[ignore = "requires DATABASE_URL"]
    fn test_repeat_guest_and_capacity_floor() {
        let mut conn = crate::establish_connection().unwrap();
        conn.test_transaction::<_, ServiceError, _>(|conn| {
            crate::run_migrations(conn)?;
            let slot = create_slot(
                conn,
                NewTimeSlot {
                    slot_date: parse_date("2030-05-10")?,
                    start_time: parse_time("21:50")?,
                    end_time: parse_time("22:20")?,
                    capacity: 6,
                    is_active: None,
                },
            )?;
            let booking = |name: &str| NewReservation {
                time_slot_id: slot.id,
                name: name.to_string(),
                email: "grace@example.com".to_string(),
                phone: None,
                party_size: 2,
                special_requests: None,
            };

            let first = create_reservation(conn, booking("Grace"), before_service())?;
            let second = create_reservation(conn, booking("Grace Hopper"), before_service())?;
            assert_eq!(first.reservation.customer_id, second.reservation.customer_id);

            let (customer, history) = customers::get_customer(conn, first.reservation.customer_id)?;
            assert_eq!(customer.reservation_count, 2);
            assert_eq!(customer.name, "Grace Hopper");
            assert_eq!(history.len(), 2);

            let lower = |capacity| TimeSlotChanges {
                capacity: Some(capacity),
                ..Default::default()
            };
            assert!(matches!(
                update_slot(conn, slot.id, lower(3)),
                Err(ServiceError::Conflict(_))
            ));
            let updated = update_slot(conn, slot.id, lower(4))?;
            assert_eq!(updated.slot.capacity, 4);
            assert_eq!(updated.booked, 4);
            assert_eq!(updated.remaining, 0);
            Ok(())
        });
    }

    #[test]
    #[ignore = "requires DATABASE_URL"]
    fn test_generate_slots_keeps_existing_rows() {
        let mut conn = crate::establish_connection().unwrap();
        conn.test_transaction::<_, ServiceError, _>(|conn| {
            crate::run_migrations(conn)?;
            let mut hours = OpeningHours::default();
            // 2031-01-06 is a Monday
            hours.monday = Some(DayHours {
                open: parse_time("18:00")?,
                close: parse_time("19:00")?,
            });
            settings::update(
                conn,
                settings::SettingsUpdate {
                    opening_hours: Some(hours),
                    slot_minutes: Some(30),
                    default_slot_capacity: Some(20),
                    ..Default::default()
                },
            )?;

            let monday = parse_date("2031-01-06")?;
            let existing = create_slot(
                conn,
                NewTimeSlot {
                    slot_date: monday,
                    start_time: parse_time("18:00")?,
                    end_time: parse_time("18:30")?,
                    capacity: 3,
                    is_active: Some(false),
                },
            )?;

            assert_eq!(generate_slots(conn, monday, 1)?, 1);
            assert_eq!(generate_slots(conn, monday, 1)?, 0);

            let kept = get_slot(conn, existing.id)?;
            assert_eq!(kept.capacity, 3);
            assert!(!kept.is_active);

            let all = availability(conn, monday, true)?;
            assert_eq!(all.len(), 2);
            assert_eq!(all[1].slot.start_time, parse_time("18:30")?);
            assert_eq!(all[1].slot.capacity, 20);
            Ok(())
        });
    }
}
