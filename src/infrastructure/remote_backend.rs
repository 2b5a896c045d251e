use crate::domain::fetch_window::FetchWindow;
use crate::domain::models::{CreateEventDto, Event, UpdateEventDto};
use crate::infrastructure::config::BackendKind;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::event_backend::{BackendOutcome, EventBackend};
use crate::infrastructure::events_api_client::EventsApiClient;
use crate::infrastructure::settings_store::SettingsStore;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct RemoteEventBackend<C: ?Sized> {
    client: Arc<C>,
    settings: SettingsStore,
}

impl<C> RemoteEventBackend<C>
where
    C: EventsApiClient + ?Sized,
{
    pub fn new(client: Arc<C>, settings: SettingsStore) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl<C> EventBackend for RemoteEventBackend<C>
where
    C: EventsApiClient + ?Sized + 'static,
{
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn fetch_window(&self, anchor: NaiveDate) -> Result<Vec<Event>, InfraError> {
        let fetched = self.client.list_events().await?;
        let total = fetched.len();
        let valid: Vec<Event> = fetched
            .into_iter()
            .filter(|event| match event.validate() {
                Ok(()) => true,
                Err(reason) => {
                    warn!(event_id = %event.id, %reason, "dropping invalid remote event");
                    false
                }
            })
            .collect();
        let events = FetchWindow::around(anchor).filter(valid);
        debug!(%anchor, total, in_window = events.len(), "fetched remote events");
        Ok(events)
    }

    async fn get_event(&self, id: &str) -> Result<Event, InfraError> {
        self.client.get_event(id).await
    }

    async fn create(&self, dto: CreateEventDto) -> Result<BackendOutcome, InfraError> {
        let record = self.client.create_event(&dto).await?;
        Ok(BackendOutcome::upserted(record))
    }

    async fn update(&self, dto: UpdateEventDto) -> Result<BackendOutcome, InfraError> {
        let record = self.client.update_event(&dto).await?;
        Ok(BackendOutcome::upserted(record))
    }

    async fn delete(&self, id: &str) -> Result<BackendOutcome, InfraError> {
        let response = self.client.delete_event(id).await?;
        if !response.deleted {
            return Err(InfraError::NotFound(id.to_string()));
        }
        Ok(BackendOutcome::removed(id))
    }

    async fn set_current_date(&self, date: NaiveDate) -> Result<(), InfraError> {
        self.settings.save_last_viewed_date(date)
    }

    async fn ensure_user(&self) -> Result<(), InfraError> {
        let response = self.client.create_user().await?;
        info!(message = %response.msg, "remote user ensured");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::event_backend::EventsChange;
    use crate::infrastructure::events_api_client::{CreateUserResponse, DeleteEventResponse};
    use crate::infrastructure::key_value_store::InMemoryKeyValueStore;
    use chrono::{DateTime, Utc};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeEventsApiClient {
        list_responses: Mutex<VecDeque<Result<Vec<Event>, InfraError>>>,
        delete_responses: Mutex<VecDeque<Result<DeleteEventResponse, InfraError>>>,
        update_responses: Mutex<VecDeque<Result<Event, InfraError>>>,
        created: Mutex<Vec<CreateEventDto>>,
        user_calls: AtomicUsize,
        list_calls: AtomicUsize,
    }

    #[async_trait]
    impl EventsApiClient for FakeEventsApiClient {
        async fn list_events(&self) -> Result<Vec<Event>, InfraError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.list_responses
                .lock()
                .expect("lock list responses")
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn get_event(&self, event_id: &str) -> Result<Event, InfraError> {
            Err(InfraError::NotFound(event_id.to_string()))
        }

        async fn create_event(&self, dto: &CreateEventDto) -> Result<Event, InfraError> {
            self.created.lock().expect("lock created").push(dto.clone());
            Ok(Event::from_create("server-1", dto.clone(), stamp("2024-02-01T08:00:00Z")))
        }

        async fn update_event(&self, _dto: &UpdateEventDto) -> Result<Event, InfraError> {
            self.update_responses
                .lock()
                .expect("lock update responses")
                .pop_front()
                .unwrap_or_else(|| Err(InfraError::Transport("no update response".to_string())))
        }

        async fn delete_event(&self, _event_id: &str) -> Result<DeleteEventResponse, InfraError> {
            self.delete_responses
                .lock()
                .expect("lock delete responses")
                .pop_front()
                .unwrap_or(Ok(DeleteEventResponse { deleted: true }))
        }

        async fn create_user(&self) -> Result<CreateUserResponse, InfraError> {
            self.user_calls.fetch_add(1, Ordering::SeqCst);
            Ok(CreateUserResponse {
                msg: "user exists".to_string(),
            })
        }
    }

    fn stamp(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn event_on(id: &str, on: NaiveDate) -> Event {
        Event {
            id: id.to_string(),
            title: format!("event {id}"),
            description: None,
            date: on.and_hms_opt(12, 0, 0).expect("valid time"),
            time: None,
            created_at: stamp("2024-01-01T00:00:00Z"),
            updated_at: stamp("2024-01-01T00:00:00Z"),
        }
    }

    fn backend(
        client: Arc<FakeEventsApiClient>,
    ) -> (SettingsStore, RemoteEventBackend<FakeEventsApiClient>) {
        let settings = SettingsStore::new(Arc::new(InMemoryKeyValueStore::default()));
        (settings.clone(), RemoteEventBackend::new(client, settings))
    }

    #[tokio::test]
    async fn fetch_window_filters_client_side_and_drops_invalid_records() {
        let client = Arc::new(FakeEventsApiClient::default());
        let mut blank_title = event_on("blank", date(2024, 2, 3));
        blank_title.title = " ".to_string();
        client.list_responses.lock().expect("lock").push_back(Ok(vec![
            event_on("old", date(2023, 12, 31)),
            event_on("jan", date(2024, 1, 15)),
            blank_title,
            event_on("mar", date(2024, 3, 1)),
            event_on("apr", date(2024, 4, 1)),
        ]));
        let (_, backend) = backend(client.clone());

        let ids: Vec<String> = backend
            .fetch_window(date(2024, 2, 10))
            .await
            .expect("fetch")
            .into_iter()
            .map(|event| event.id)
            .collect();
        assert_eq!(ids, vec!["jan".to_string(), "mar".to_string()]);
        assert_eq!(client.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn every_fetch_issues_its_own_request() {
        let client = Arc::new(FakeEventsApiClient::default());
        let (_, backend) = backend(client.clone());
        backend.fetch_window(date(2024, 2, 10)).await.expect("first fetch");
        backend.fetch_window(date(2024, 2, 10)).await.expect("second fetch");
        assert_eq!(client.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn create_returns_server_record_as_current() {
        let client = Arc::new(FakeEventsApiClient::default());
        let (_, backend) = backend(client.clone());
        let outcome = backend
            .create(CreateEventDto {
                title: "Review".to_string(),
                description: None,
                date: date(2024, 2, 20),
                time: None,
            })
            .await
            .expect("create");

        let current = outcome.current.expect("server record");
        assert_eq!(current.id, "server-1");
        assert_eq!(outcome.change, EventsChange::Upserted(current));
        assert_eq!(client.created.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn failures_keep_not_found_and_transport_apart() {
        let client = Arc::new(FakeEventsApiClient::default());
        client
            .delete_responses
            .lock()
            .expect("lock")
            .push_back(Ok(DeleteEventResponse { deleted: false }));
        client
            .update_responses
            .lock()
            .expect("lock")
            .push_back(Err(InfraError::Transport("http 500".to_string())));
        let (_, backend) = backend(client);

        assert!(backend.delete("evt-1").await.expect_err("not deleted").is_not_found());
        assert!(backend.get_event("evt-1").await.expect_err("missing").is_not_found());
        let error = backend
            .update(UpdateEventDto {
                id: "evt-1".to_string(),
                title: "x".to_string(),
                description: None,
                date: date(2024, 2, 20),
                time: None,
            })
            .await
            .expect_err("server error");
        assert!(matches!(error, InfraError::Transport(_)));
    }

    #[tokio::test]
    async fn current_date_is_stored_locally_and_user_is_created_remotely() {
        let client = Arc::new(FakeEventsApiClient::default());
        let (settings, backend) = backend(client.clone());

        backend.set_current_date(date(2024, 7, 1)).await.expect("persist date");
        backend.ensure_user().await.expect("ensure user");

        assert_eq!(settings.last_viewed_date().expect("read date"), Some(date(2024, 7, 1)));
        assert_eq!(client.user_calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.kind(), BackendKind::Remote);
    }
}
