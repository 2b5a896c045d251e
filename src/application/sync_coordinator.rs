use crate::domain::models::{CreateEventDto, Event, UpdateEventDto};
use crate::infrastructure::config::BackendKind;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::event_backend::{BackendOutcome, EventBackend, EventsChange};
use chrono::NaiveDate;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{debug, info, warn};

pub const NOT_FOUND_MESSAGE: &str = "Not found";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncState {
    pub events: Vec<Event>,
    pub current_anchor_date: NaiveDate,
    pub current_event: Option<Event>,
    pub loading: bool,
    pub error_message: Option<String>,
}

impl SyncState {
    fn new(current_anchor_date: NaiveDate) -> Self {
        Self {
            events: Vec::new(),
            current_anchor_date,
            current_event: None,
            loading: false,
            error_message: None,
        }
    }
}

pub struct SyncCoordinator {
    backend: RwLock<Arc<dyn EventBackend>>,
    state: Mutex<SyncState>,
    fetch_sequence: AtomicU64,
    discard_stale_fetches: bool,
}

impl SyncCoordinator {
    pub fn new(backend: Arc<dyn EventBackend>, anchor: NaiveDate) -> Self {
        Self {
            backend: RwLock::new(backend),
            state: Mutex::new(SyncState::new(anchor)),
            fetch_sequence: AtomicU64::new(0),
            discard_stale_fetches: false,
        }
    }

    pub fn with_discard_stale_fetches(mut self, enabled: bool) -> Self {
        self.discard_stale_fetches = enabled;
        self
    }

    pub fn state(&self) -> SyncState {
        self.lock_state().clone()
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.active_backend().kind()
    }

    pub fn replace_backend(&self, backend: Arc<dyn EventBackend>) {
        let kind = backend.kind();
        *self.backend.write().unwrap_or_else(PoisonError::into_inner) = backend;
        let mut state = self.lock_state();
        state.events.clear();
        state.current_event = None;
        state.error_message = None;
        state.loading = false;
        info!(backend = %kind, "active backend replaced");
    }

    pub async fn fetch_events(&self, anchor: NaiveDate) {
        let backend = self.active_backend();
        let sequence = self.fetch_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.begin(&*backend, "fetch_events");
        let result = backend.fetch_window(anchor).await;

        if self.discard_stale_fetches && sequence != self.fetch_sequence.load(Ordering::SeqCst) {
            debug!(%anchor, sequence, "discarding stale fetch result");
            return;
        }

        let mut state = self.lock_state();
        state.loading = false;
        match result {
            Ok(events) => {
                debug!(%anchor, count = events.len(), "events fetched");
                state.events = events;
                state.error_message = None;
            }
            Err(error) => record_failure(&mut state, "fetch_events", &error),
        }
    }

    pub async fn refetch(&self) {
        let anchor = self.lock_state().current_anchor_date;
        self.fetch_events(anchor).await;
    }

    pub async fn load_event(&self, id: &str) {
        let backend = self.active_backend();
        self.begin(&*backend, "load_event");
        let result = backend.get_event(id).await;

        let mut state = self.lock_state();
        state.loading = false;
        match result {
            Ok(event) => {
                state.current_event = Some(event);
                state.error_message = None;
            }
            Err(error) => record_failure(&mut state, "load_event", &error),
        }
    }

    pub async fn create_event(&self, dto: CreateEventDto) {
        let backend = self.active_backend();
        self.begin(&*backend, "create_event");
        let result = backend.create(dto).await;
        if self.settle_mutation("create_event", result) {
            self.refetch().await;
        }
    }

    pub async fn update_event(&self, dto: UpdateEventDto) {
        let backend = self.active_backend();
        self.begin(&*backend, "update_event");
        let result = backend.update(dto).await;
        if self.settle_mutation("update_event", result) {
            self.refetch().await;
        }
    }

    pub async fn delete_event(&self, id: &str) {
        let backend = self.active_backend();
        self.begin(&*backend, "delete_event");
        let result = backend.delete(id).await;
        if self.settle_mutation("delete_event", result) {
            self.refetch().await;
        }
    }

    /// Moves the anchor, persists it through the backend and fetches the new window. A failure to
    /// persist the anchor is reported after the fetch settles.
    pub async fn change_anchor_date(&self, anchor: NaiveDate) {
        self.lock_state().current_anchor_date = anchor;
        let backend = self.active_backend();
        let persisted = backend.set_current_date(anchor).await;
        self.fetch_events(anchor).await;
        if let Err(error) = persisted {
            self.report_error("change_anchor_date", &error);
        }
    }

    pub async fn ensure_user(&self) -> Result<(), InfraError> {
        let backend = self.active_backend();
        self.begin(&*backend, "ensure_user");
        let result = backend.ensure_user().await;

        let mut state = self.lock_state();
        state.loading = false;
        match &result {
            Ok(()) => state.error_message = None,
            Err(error) => record_failure(&mut state, "ensure_user", error),
        }
        result
    }

    pub fn report_error(&self, operation: &str, error: &InfraError) {
        record_failure(&mut self.lock_state(), operation, error);
    }

    fn settle_mutation(&self, operation: &str, result: Result<BackendOutcome, InfraError>) -> bool {
        let mut state = self.lock_state();
        state.loading = false;
        match result {
            Ok(outcome) => {
                let current = outcome.current.as_ref().map(|event| event.id.as_str());
                info!(operation, ?current, "event mutation applied");
                let removed_current = match (&outcome.change, state.current_event.as_ref()) {
                    (EventsChange::Removed(id), Some(current)) => current.id == *id,
                    _ => false,
                };
                outcome.change.apply(&mut state.events);
                if let Some(current) = outcome.current {
                    state.current_event = Some(current);
                } else if removed_current {
                    state.current_event = None;
                }
                state.error_message = None;
                true
            }
            Err(error) => {
                record_failure(&mut state, operation, &error);
                false
            }
        }
    }

    fn begin(&self, backend: &dyn EventBackend, operation: &str) {
        let kind = backend.kind();
        debug!(operation, backend = %kind, "dispatching");
        if kind == BackendKind::Remote {
            self.lock_state().loading = true;
        }
    }

    fn active_backend(&self) -> Arc<dyn EventBackend> {
        self.backend.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn record_failure(state: &mut SyncState, operation: &str, error: &InfraError) {
    warn!(operation, %error, "event operation failed");
    state.error_message = Some(error_message(error));
}

pub fn error_message(error: &InfraError) -> String {
    if error.is_not_found() {
        NOT_FOUND_MESSAGE.to_string()
    } else {
        error.to_string()
    }
}
