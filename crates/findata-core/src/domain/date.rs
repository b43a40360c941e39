use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::Date;

use crate::ValidationError;

const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// ISO-8601 calendar date without a time component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(Date);

impl CalendarDate {
    /// Parse a strict `YYYY-MM-DD` date.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let shape_ok = trimmed.len() == 10
            && trimmed.bytes().enumerate().all(|(index, byte)| match index {
                4 | 7 => byte == b'-',
                _ => byte.is_ascii_digit(),
            });
        if !shape_ok {
            return Err(ValidationError::InvalidDate {
                value: input.to_owned(),
            });
        }

        Date::parse(trimmed, ISO_DATE)
            .map(Self)
            .map_err(|_| ValidationError::InvalidDate {
                value: input.to_owned(),
            })
    }

    /// Parse the leading calendar date of a timestamp such as
    /// `2024-01-02T14:30:00Z` or `2024-01-02 09:30:00 EST`.
    pub fn parse_prefix(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        match trimmed.get(..10) {
            Some(prefix) => Self::parse(prefix).map_err(|_| ValidationError::InvalidDate {
                value: input.to_owned(),
            }),
            None => Err(ValidationError::InvalidDate {
                value: input.to_owned(),
            }),
        }
    }
}

impl Display for CalendarDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // `time::Date` displays as YYYY-MM-DD.
        Display::fmt(&self.0, f)
    }
}

impl Serialize for CalendarDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_date() {
        let parsed = CalendarDate::parse("2024-02-29").expect("leap day must parse");
        assert_eq!(parsed.to_string(), "2024-02-29");
    }

    #[test]
    fn rejects_impossible_date() {
        let err = CalendarDate::parse("2023-02-29").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidDate { .. }));
    }

    #[test]
    fn rejects_datetime_and_loose_formats() {
        for input in ["2024-01-01T00:00:00Z", "2024/01/01", "01-02-2024", "20240101", ""] {
            assert!(
                CalendarDate::parse(input).is_err(),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn parses_timestamp_prefix() {
        let parsed = CalendarDate::parse_prefix("2024-01-02 09:30:00 EST").expect("prefix");
        assert_eq!(parsed.to_string(), "2024-01-02");
    }

    #[test]
    fn orders_chronologically() {
        let earlier = CalendarDate::parse("2023-12-31").expect("date");
        let later = CalendarDate::parse("2024-01-01").expect("date");
        assert!(earlier < later);
    }
}
