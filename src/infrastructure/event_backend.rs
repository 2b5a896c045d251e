use crate::domain::models::{CreateEventDto, Event, UpdateEventDto};
use crate::infrastructure::config::BackendKind;
use crate::infrastructure::error::InfraError;
use async_trait::async_trait;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventsChange {
    Replaced(Vec<Event>),
    Upserted(Event),
    Removed(String),
}

impl EventsChange {
    pub fn apply(self, events: &mut Vec<Event>) {
        match self {
            Self::Replaced(replacement) => *events = replacement,
            Self::Upserted(record) => {
                match events.iter_mut().find(|existing| existing.id == record.id) {
                    Some(existing) => *existing = record,
                    None => events.push(record),
                }
            }
            Self::Removed(id) => events.retain(|existing| existing.id != id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendOutcome {
    pub change: EventsChange,
    pub current: Option<Event>,
}

impl BackendOutcome {
    pub fn upserted(record: Event) -> Self {
        Self {
            current: Some(record.clone()),
            change: EventsChange::Upserted(record),
        }
    }

    pub fn removed(id: impl Into<String>) -> Self {
        Self {
            change: EventsChange::Removed(id.into()),
            current: None,
        }
    }
}

#[async_trait]
pub trait EventBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Events dated in the month before `anchor`, the month of `anchor` or the month after.
    async fn fetch_window(&self, anchor: NaiveDate) -> Result<Vec<Event>, InfraError>;

    async fn get_event(&self, id: &str) -> Result<Event, InfraError>;

    async fn create(&self, dto: CreateEventDto) -> Result<BackendOutcome, InfraError>;

    async fn update(&self, dto: UpdateEventDto) -> Result<BackendOutcome, InfraError>;

    async fn delete(&self, id: &str) -> Result<BackendOutcome, InfraError>;

    async fn set_current_date(&self, date: NaiveDate) -> Result<(), InfraError>;

    async fn ensure_user(&self) -> Result<(), InfraError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn event(id: &str, title: &str) -> Event {
        let stamp = DateTime::parse_from_rfc3339("2024-02-01T08:00:00Z")
            .expect("valid datetime")
            .with_timezone(&Utc);
        Event {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            date: NaiveDate::from_ymd_opt(2024, 2, 10)
                .expect("valid date")
                .and_hms_opt(10, 0, 0)
                .expect("valid time"),
            time: None,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    #[test]
    fn upsert_replaces_in_place_or_appends() {
        let mut events = vec![event("a", "first"), event("b", "second")];
        EventsChange::Upserted(event("a", "renamed")).apply(&mut events);
        EventsChange::Upserted(event("c", "third")).apply(&mut events);

        let titles: Vec<&str> = events.iter().map(|event| event.title.as_str()).collect();
        assert_eq!(titles, vec!["renamed", "second", "third"]);
    }

    #[test]
    fn remove_and_replace_change_the_list() {
        let mut events = vec![event("a", "first"), event("b", "second")];
        EventsChange::Removed("a".to_string()).apply(&mut events);
        assert_eq!(events.len(), 1);
        EventsChange::Removed("missing".to_string()).apply(&mut events);
        assert_eq!(events.len(), 1);
        EventsChange::Replaced(Vec::new()).apply(&mut events);
        assert!(events.is_empty());
    }
}
