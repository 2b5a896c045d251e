use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

const EVENT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const CALENDAR_DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_OF_DAY_FORMAT: &str = "%H:%M";
const PRECISE_TIME_OF_DAY_FORMAT: &str = "%H:%M:%S%.f";
const CHANGE_LABEL_FORMAT: &str = "%d.%m.%Y %H:%M";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(with = "event_date")]
    pub date: NaiveDateTime,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "optional_time_of_day"
    )]
    pub time: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn from_create(id: impl Into<String>, dto: CreateEventDto, now: DateTime<Utc>) -> Self {
        let date = dto.event_date();
        Self {
            id: id.into(),
            title: dto.title,
            description: dto.description,
            date,
            time: dto.time,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }

    /// Merges an update into the record. Optional fields missing from the update keep their
    /// stored values.
    pub fn apply_update(&mut self, dto: &UpdateEventDto, now: DateTime<Utc>) {
        self.title = dto.title.clone();
        self.date = dto.event_date();
        if let Some(description) = dto.description.as_ref() {
            self.description = Some(description.clone());
        }
        if let Some(time) = dto.time {
            self.time = Some(time);
        }
        self.updated_at = now;
    }

    pub fn change_label(&self) -> String {
        if self.updated_at > self.created_at {
            format!("Updated at: {}", self.updated_at.format(CHANGE_LABEL_FORMAT))
        } else {
            format!("Created at: {}", self.created_at.format(CHANGE_LABEL_FORMAT))
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "event.id")?;
        validate_non_empty(&self.title, "event.title")?;
        if self.updated_at < self.created_at {
            return Err("event.updated_at must be >= event.created_at".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateEventDto {
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
}

impl CreateEventDto {
    pub fn event_date(&self) -> NaiveDateTime {
        self.date.and_time(self.time.unwrap_or(NaiveTime::MIN))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateEventDto {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
}

impl UpdateEventDto {
    pub fn event_date(&self) -> NaiveDateTime {
        self.date.and_time(self.time.unwrap_or(NaiveTime::MIN))
    }
}

/// One cell of the month grid. `id` is regenerated on every build and is never a durable key.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CalendarDay {
    pub id: String,
    pub date: NaiveDate,
    pub day_of_month: u32,
    pub weekday_label: String,
    pub is_in_anchor_month: bool,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActiveDaySelection {
    pub id: String,
    #[serde(with = "calendar_date")]
    pub date: NaiveDate,
}

impl ActiveDaySelection {
    pub fn for_day(day: &CalendarDay) -> Self {
        Self {
            id: day.id.clone(),
            date: day.date,
        }
    }
}

/// Parses an event timestamp. Accepts `YYYY-MM-DDTHH:MM[:SS]`, RFC 3339 with an offset (the wall
/// clock value is kept as written) and a bare `YYYY-MM-DD`.
pub fn parse_event_datetime(value: &str) -> Result<NaiveDateTime, String> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.naive_local());
    }
    let formats = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    for format in formats {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed);
        }
    }
    NaiveDate::parse_from_str(value, CALENDAR_DATE_FORMAT)
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|_| format!("'{value}' is not a recognised event date"))
}

pub fn parse_calendar_date(value: &str) -> Result<NaiveDate, String> {
    parse_event_datetime(value).map(|parsed| parsed.date())
}

fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

mod event_date {
    use super::{EVENT_DATE_FORMAT, parse_event_datetime};
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(EVENT_DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_event_datetime(&raw).map_err(serde::de::Error::custom)
    }
}

pub(crate) mod calendar_date {
    use super::{CALENDAR_DATE_FORMAT, parse_calendar_date};
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(CALENDAR_DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_calendar_date(&raw).map_err(serde::de::Error::custom)
    }
}

pub(crate) mod optional_time_of_day {
    use super::{PRECISE_TIME_OF_DAY_FORMAT, TIME_OF_DAY_FORMAT};
    use chrono::{NaiveTime, Timelike};
    use serde::{Deserialize, Deserializer, Serializer};

    // `HH:MM` on the wire; seconds are only written when present.
    pub fn serialize<S: Serializer>(
        value: &Option<NaiveTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(time) if time.second() == 0 && time.nanosecond() == 0 => {
                serializer.collect_str(&time.format(TIME_OF_DAY_FORMAT))
            }
            Some(time) => serializer.collect_str(&time.format(PRECISE_TIME_OF_DAY_FORMAT)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveTime>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
            None => Ok(None),
            Some(value) => NaiveTime::parse_from_str(value, TIME_OF_DAY_FORMAT)
                .or_else(|_| NaiveTime::parse_from_str(value, PRECISE_TIME_OF_DAY_FORMAT))
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("'{value}' must be HH:MM"))),
        }
    }
}
