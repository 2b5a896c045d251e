use crate::domain::models::{ActiveDaySelection, Event, parse_calendar_date};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::key_value_store::KeyValueStore;
use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

pub const LAST_VIEWED_DATE_KEY: &str = "last_viewed_date";
pub const SELECTED_DAY_KEY: &str = "selected_day";
pub const SAVED_EVENTS_KEY: &str = "saved_events";

#[derive(Clone)]
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn last_viewed_date(&self) -> Result<Option<NaiveDate>, InfraError> {
        let Some(raw) = self.read::<String>(LAST_VIEWED_DATE_KEY)? else {
            return Ok(None);
        };
        parse_calendar_date(&raw).map(Some).map_err(InfraError::InvalidDate)
    }

    pub fn save_last_viewed_date(&self, date: NaiveDate) -> Result<(), InfraError> {
        self.write(LAST_VIEWED_DATE_KEY, &date.format("%Y-%m-%d").to_string())
    }

    pub fn selected_day(&self) -> Result<Option<ActiveDaySelection>, InfraError> {
        self.read(SELECTED_DAY_KEY)
    }

    pub fn save_selected_day(&self, selection: &ActiveDaySelection) -> Result<(), InfraError> {
        self.write(SELECTED_DAY_KEY, selection)
    }

    pub fn clear_selected_day(&self) -> Result<(), InfraError> {
        self.store.remove(SELECTED_DAY_KEY)
    }

    pub fn saved_events(&self) -> Result<Option<Vec<Event>>, InfraError> {
        self.read(SAVED_EVENTS_KEY)
    }

    pub fn save_events(&self, events: &[Event]) -> Result<(), InfraError> {
        self.write(SAVED_EVENTS_KEY, &events)
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, InfraError> {
        match self.store.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), InfraError> {
        let encoded = serde_json::to_string(value)?;
        self.store.set(key, &encoded)
    }
}
