use chrono::{NaiveTime, Utc, Weekday};
use diesel::{prelude::*, PgConnection};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{RestaurantSettings, RestaurantSettingsChanges};
use crate::{schema, timefmt, ServiceError};

pub const SETTINGS_ID: i32 = 1;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayHours {
    #[serde(with = "timefmt::hhmm")]
    pub open: NaiveTime,
    #[serde(with = "timefmt::hhmm")]
    pub close: NaiveTime,
}

/// Weekly opening hours; a missing day means the restaurant is closed.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct OpeningHours {
    pub monday: Option<DayHours>,
    pub tuesday: Option<DayHours>,
    pub wednesday: Option<DayHours>,
    pub thursday: Option<DayHours>,
    pub friday: Option<DayHours>,
    pub saturday: Option<DayHours>,
    pub sunday: Option<DayHours>,
}

impl OpeningHours {
    pub fn for_weekday(&self, weekday: Weekday) -> Option<&DayHours> {
        match weekday {
            Weekday::Mon => self.monday.as_ref(),
            Weekday::Tue => self.tuesday.as_ref(),
            Weekday::Wed => self.wednesday.as_ref(),
            Weekday::Thu => self.thursday.as_ref(),
            Weekday::Fri => self.friday.as_ref(),
            Weekday::Sat => self.saturday.as_ref(),
            Weekday::Sun => self.sunday.as_ref(),
        }
    }

    pub fn validate(&self) -> Result<(), ServiceError> {
        let days = [
            ("monday", &self.monday),
            ("tuesday", &self.tuesday),
            ("wednesday", &self.wednesday),
            ("thursday", &self.thursday),
            ("friday", &self.friday),
            ("saturday", &self.saturday),
            ("sunday", &self.sunday),
        ];
        for (day, hours) in days {
            if let Some(hours) = hours {
                if hours.open >= hours.close {
                    return Err(ServiceError::invalid(format!(
                        "Opening hours for {day} must open before they close"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl RestaurantSettings {
    pub fn parsed_opening_hours(&self) -> Result<OpeningHours, ServiceError> {
        serde_json::from_value(self.opening_hours.clone())
            .map_err(|e| ServiceError::Internal(format!("Stored opening hours are invalid: {e}")))
    }
}

#[derive(Debug, Default)]
pub struct SettingsUpdate {
    pub name: Option<String>,
    pub tagline: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub opening_hours: Option<OpeningHours>,
    pub slot_minutes: Option<i32>,
    pub default_slot_capacity: Option<i32>,
    pub max_party_size: Option<i32>,
}

impl SettingsUpdate {
    fn into_changes(self) -> Result<RestaurantSettingsChanges, ServiceError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(ServiceError::invalid("Restaurant name must not be empty"));
            }
        }
        if let Some(minutes) = self.slot_minutes {
            if !(5..=240).contains(&minutes) {
                return Err(ServiceError::invalid(
                    "slot_minutes must be between 5 and 240",
                ));
            }
        }
        if matches!(self.default_slot_capacity, Some(c) if c < 1) {
            return Err(ServiceError::invalid("default_slot_capacity must be at least 1"));
        }
        if matches!(self.max_party_size, Some(p) if p < 1) {
            return Err(ServiceError::invalid("max_party_size must be at least 1"));
        }
        let opening_hours = match self.opening_hours {
            Some(hours) => {
                hours.validate()?;
                Some(
                    serde_json::to_value(hours)
                        .map_err(|e| ServiceError::Internal(e.to_string()))?,
                )
            }
            None => None,
        };

        Ok(RestaurantSettingsChanges {
            name: self.name.map(|n| n.trim().to_string()),
            tagline: self.tagline,
            phone: self.phone,
            email: self.email,
            address: self.address,
            opening_hours,
            slot_minutes: self.slot_minutes,
            default_slot_capacity: self.default_slot_capacity,
            max_party_size: self.max_party_size,
            updated_at: Some(Utc::now()),
        })
    }
}

pub fn get(conn: &mut PgConnection) -> Result<RestaurantSettings, ServiceError> {
    schema::restaurant_settings::table
        .find(SETTINGS_ID)
        .select(RestaurantSettings::as_select())
        .first(conn)
        .map_err(|err| match err {
            diesel::result::Error::NotFound => ServiceError::not_found("Restaurant settings"),
            other => other.into(),
        })
}

pub fn update(
    conn: &mut PgConnection,
    update: SettingsUpdate,
) -> Result<RestaurantSettings, ServiceError> {
    let changes = update.into_changes()?;
    let settings = diesel::update(schema::restaurant_settings::table.find(SETTINGS_ID))
        .set(&changes)
        .returning(RestaurantSettings::as_returning())
        .get_result(conn)?;
    info!("restaurant settings updated");
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours(open: &str, close: &str) -> DayHours {
        DayHours {
            open: timefmt::parse_time(open).unwrap(),
            close: timefmt::parse_time(close).unwrap(),
        }
    }

    #[test]
    fn test_opening_hours_json() {
        let json = serde_json::json!({
            "tuesday": {"open": "17:00", "close": "22:30"},
            "sunday": null
        });
        let parsed: OpeningHours = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.tuesday, Some(hours("17:00", "22:30")));
        assert_eq!(parsed.monday, None);
        assert_eq!(parsed.for_weekday(Weekday::Tue), Some(&hours("17:00", "22:30")));

        let back = serde_json::to_value(&parsed).unwrap();
        assert_eq!(back["tuesday"]["close"], "22:30");
    }

    #[test]
    fn test_opening_hours_validation() {
        let mut week = OpeningHours::default();
        week.friday = Some(hours("18:00", "23:00"));
        assert!(week.validate().is_ok());

        week.saturday = Some(hours("23:00", "18:00"));
        assert!(week.validate().is_err());
    }

    #[test]
    fn test_settings_update_validation() {
        let update = SettingsUpdate {
            slot_minutes: Some(2),
            ..Default::default()
        };
        assert!(matches!(
            update.into_changes(),
            Err(ServiceError::InvalidArgument(_))
        ));

        let update = SettingsUpdate {
            name: Some("  Chez Nous ".to_string()),
            max_party_size: Some(8),
            ..Default::default()
        };
        let changes = update.into_changes().unwrap();
        assert_eq!(changes.name.as_deref(), Some("Chez Nous"));
        assert_eq!(changes.max_party_size, Some(8));
        assert!(changes.updated_at.is_some());
    }
}
