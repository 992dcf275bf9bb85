use chrono::{NaiveDate, NaiveTime};

use crate::ServiceError;

pub fn parse_date(value: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ServiceError::invalid(format!("Invalid date '{value}', expected YYYY-MM-DD")))
}

/// Accepts `HH:MM` and `HH:MM:SS`.
pub fn parse_time(value: &str) -> Result<NaiveTime, ServiceError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| ServiceError::invalid(format!("Invalid time '{value}', expected HH:MM")))
}

/// Serde adapter storing times as `HH:MM`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_time(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_formats() {
        let expected = NaiveTime::from_hms_opt(18, 30, 0).unwrap();
        assert_eq!(parse_time("18:30").unwrap(), expected);
        assert_eq!(parse_time("18:30:00").unwrap(), expected);
        assert!(parse_time("6pm").is_err());
        assert!(parse_time("25:00").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2025-07-14").unwrap(),
            NaiveDate::from_ymd_opt(2025, 7, 14).unwrap()
        );
        assert!(parse_date("14/07/2025").is_err());
    }
}
