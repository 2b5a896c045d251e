use crate::domain::fetch_window::FetchWindow;
use crate::domain::models::{CreateEventDto, Event, UpdateEventDto};
use crate::infrastructure::config::BackendKind;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::event_backend::{BackendOutcome, EventBackend};
use crate::infrastructure::settings_store::SettingsStore;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub type NowProvider = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;
pub type IdGenerator = Arc<dyn Fn() -> String + Send + Sync>;

pub struct LocalEventBackend {
    settings: SettingsStore,
    write_lock: Mutex<()>,
    now_provider: NowProvider,
    id_generator: IdGenerator,
}

impl LocalEventBackend {
    pub fn new(settings: SettingsStore) -> Self {
        Self {
            settings,
            write_lock: Mutex::new(()),
            now_provider: Arc::new(Utc::now),
            id_generator: Arc::new(|| Uuid::new_v4().to_string()),
        }
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    pub fn with_id_generator(mut self, id_generator: IdGenerator) -> Self {
        self.id_generator = id_generator;
        self
    }

    fn stored_events(&self) -> Result<Vec<Event>, InfraError> {
        match self.settings.saved_events()? {
            Some(events) => Ok(events),
            None => {
                self.settings.save_events(&[])?;
                Ok(Vec::new())
            }
        }
    }

    fn modify<T>(
        &self,
        change: impl FnOnce(&mut Vec<Event>) -> Result<T, InfraError>,
    ) -> Result<T, InfraError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|error| {
                InfraError::InvalidConfig(format!("local event store lock poisoned: {error}"))
            })?;
        let mut events = self.stored_events()?;
        let result = change(&mut events)?;
        self.settings.save_events(&events)?;
        Ok(result)
    }
}

#[async_trait]
impl EventBackend for LocalEventBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn fetch_window(&self, anchor: NaiveDate) -> Result<Vec<Event>, InfraError> {
        Ok(FetchWindow::around(anchor).filter(self.stored_events()?))
    }

    async fn get_event(&self, id: &str) -> Result<Event, InfraError> {
        self.stored_events()?
            .into_iter()
            .find(|event| event.id == id)
            .ok_or_else(|| InfraError::NotFound(id.to_string()))
    }

    async fn create(&self, dto: CreateEventDto) -> Result<BackendOutcome, InfraError> {
        let record = Event::from_create((self.id_generator)(), dto, (self.now_provider)());
        self.modify(|events| {
            events.push(record.clone());
            Ok(())
        })?;
        Ok(BackendOutcome::upserted(record))
    }

    async fn update(&self, dto: UpdateEventDto) -> Result<BackendOutcome, InfraError> {
        let now = (self.now_provider)();
        let record = self.modify(|events| {
            let existing = events
                .iter_mut()
                .find(|event| event.id == dto.id)
                .ok_or_else(|| InfraError::NotFound(dto.id.clone()))?;
            existing.apply_update(&dto, now);
            Ok(existing.clone())
        })?;
        Ok(BackendOutcome::upserted(record))
    }

    async fn delete(&self, id: &str) -> Result<BackendOutcome, InfraError> {
        self.modify(|events| {
            let before = events.len();
            events.retain(|event| event.id != id);
            if events.len() == before {
                return Err(InfraError::NotFound(id.to_string()));
            }
            Ok(())
        })?;
        Ok(BackendOutcome::removed(id))
    }

    async fn set_current_date(&self, date: NaiveDate) -> Result<(), InfraError> {
        self.settings.save_last_viewed_date(date)
    }

    async fn ensure_user(&self) -> Result<(), InfraError> {
        Ok(())
    }
}
