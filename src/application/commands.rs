use crate::application::active_day_selector::ActiveDaySelector;
use crate::application::bootstrap::BootstrapResult;
use crate::application::sync_coordinator::SyncCoordinator;
use crate::domain::calendar_grid::{WEEKDAY_LABELS, build_month_grid, month_title, shift_month};
use crate::domain::event_binder::bind_events;
use crate::domain::models::{ActiveDaySelection, CalendarDay, CreateEventDto, Event, UpdateEventDto};
use crate::infrastructure::config::{AppConfig, BackendKind};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::event_backend::EventBackend;
use crate::infrastructure::events_api_client::ReqwestEventsApiClient;
use crate::infrastructure::key_value_store::SqliteKeyValueStore;
use crate::infrastructure::local_backend::LocalEventBackend;
use crate::infrastructure::remote_backend::RemoteEventBackend;
use crate::infrastructure::settings_store::SettingsStore;
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{error, info};

pub type BackendFactory = Arc<
    dyn Fn(BackendKind, &SettingsStore) -> Result<Arc<dyn EventBackend>, InfraError> + Send + Sync,
>;
pub type TodayProvider = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

type DeferredFailures = Vec<(&'static str, InfraError)>;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CalendarView {
    pub title: String,
    pub day_list: Vec<CalendarDay>,
    pub active_day: Option<ActiveDaySelection>,
    pub current_event: Option<Event>,
    pub backend: BackendKind,
    pub loading: bool,
    pub error_message: Option<String>,
}

impl CalendarView {
    pub fn render_text(&self) -> String {
        let header = WEEKDAY_LABELS.map(|label| format!("{label:>3} ")).join("");
        let mut lines = vec![self.title.clone(), header.trim_end().to_string()];

        for week in self.day_list.chunks(7) {
            let row: String = week
                .iter()
                .map(|day| {
                    if !day.is_in_anchor_month {
                        return "    ".to_string();
                    }
                    let active = self
                        .active_day
                        .as_ref()
                        .is_some_and(|selection| selection.date == day.date);
                    let marker = if active {
                        '*'
                    } else if day.events.is_empty() {
                        ' '
                    } else {
                        '+'
                    };
                    format!("{:>3}{marker}", day.day_of_month)
                })
                .collect();
            lines.push(row.trim_end().to_string());
        }

        if let Some(active) = self.active_day.as_ref() {
            let events = self
                .day_list
                .iter()
                .find(|day| day.date == active.date)
                .map(|day| day.events.as_slice())
                .unwrap_or_default();
            lines.push(String::new());
            lines.push(active.date.format("%A, %d %B %Y").to_string());
            if events.is_empty() {
                lines.push("  no events".to_string());
            }
            for event in events {
                let time = event
                    .time
                    .map(|time| time.format("%H:%M").to_string())
                    .unwrap_or_else(|| "--:--".to_string());
                lines.push(format!("  {time} {} ({})", event.title, event.change_label()));
            }
        }

        if self.loading {
            lines.push("loading...".to_string());
        }
        if let Some(message) = self.error_message.as_ref() {
            lines.push(format!("error: {message}"));
        }
        lines.join("\n")
    }
}

#[derive(Debug)]
struct GridState {
    anchor: NaiveDate,
    days: Vec<CalendarDay>,
    active_day: Option<ActiveDaySelection>,
}

pub struct CalendarApp {
    settings: SettingsStore,
    coordinator: SyncCoordinator,
    selector: ActiveDaySelector,
    backend_factory: BackendFactory,
    today_provider: TodayProvider,
    grid: Mutex<GridState>,
}

impl CalendarApp {
    pub fn new(bootstrap: &BootstrapResult) -> Result<Self, InfraError> {
        let store = SqliteKeyValueStore::new(&bootstrap.database_path);
        let settings = SettingsStore::new(Arc::new(store));
        Self::from_parts(
            settings,
            &bootstrap.config,
            default_backend_factory(&bootstrap.config),
            Arc::new(|| Local::now().date_naive()),
        )
    }

    pub fn from_parts(
        settings: SettingsStore,
        config: &AppConfig,
        backend_factory: BackendFactory,
        today_provider: TodayProvider,
    ) -> Result<Self, InfraError> {
        let backend = backend_factory(config.backend, &settings)?;
        let today = today_provider();
        let coordinator = SyncCoordinator::new(backend, today)
            .with_discard_stale_fetches(config.discard_stale_fetches);
        Ok(Self {
            selector: ActiveDaySelector::new(settings.clone()),
            settings,
            coordinator,
            backend_factory,
            today_provider,
            grid: Mutex::new(GridState {
                anchor: today,
                days: build_month_grid(today),
                active_day: None,
            }),
        })
    }

    /// Failures before the first fetch are reported once it settles.
    pub async fn initialize(&self) {
        let backend = self.coordinator.backend_kind();
        info!(command = "initialize", %backend, "initializing calendar");
        let mut failures = DeferredFailures::new();
        if backend == BackendKind::Remote {
            if let Err(error) = self.coordinator.ensure_user().await {
                failures.push(("ensure_user", error));
            }
        }
        let anchor = match self.settings.last_viewed_date() {
            Ok(Some(date)) => date,
            Ok(None) => (self.today_provider)(),
            Err(error) => {
                failures.push(("initialize", error));
                (self.today_provider)()
            }
        };
        self.move_anchor(anchor, failures).await;
    }

    pub fn calendar_view(&self) -> CalendarView {
        let state = self.coordinator.state();
        let grid = self.lock_grid();
        CalendarView {
            title: month_title(grid.anchor),
            day_list: bind_events(grid.days.clone(), &state.events),
            active_day: grid.active_day.clone(),
            current_event: state.current_event,
            backend: self.coordinator.backend_kind(),
            loading: state.loading,
            error_message: state.error_message,
        }
    }

    pub async fn change_anchor_date(&self, anchor: NaiveDate) {
        self.move_anchor(anchor, DeferredFailures::new()).await;
    }

    pub async fn show_previous_month(&self) {
        let anchor = shift_month(self.anchor(), -1);
        self.change_anchor_date(anchor).await;
    }

    pub async fn show_next_month(&self) {
        let anchor = shift_month(self.anchor(), 1);
        self.change_anchor_date(anchor).await;
    }

    pub async fn jump_to_month(&self, year: i32, month: u32) {
        match NaiveDate::from_ymd_opt(year, month, 1) {
            Some(anchor) => self.change_anchor_date(anchor).await,
            None => self.command_error(
                "jump_to_month",
                &InfraError::InvalidDate(format!("{year}-{month:02} is not a calendar month")),
            ),
        }
    }

    pub async fn show_today(&self) {
        let mut failures = DeferredFailures::new();
        if let Err(error) = self.selector.clear() {
            failures.push(("show_today", error));
        }
        let today = (self.today_provider)();
        self.move_anchor(today, failures).await;
    }

    pub fn select_day(&self, day_id: &str) {
        let clicked = self.lock_grid().days.iter().find(|day| day.id == day_id).cloned();
        let Some(day) = clicked else {
            self.command_error("select_day", &InfraError::NotFound(day_id.to_string()));
            return;
        };
        match self.selector.select(&day) {
            Ok(selection) => self.lock_grid().active_day = Some(selection),
            Err(error) => self.command_error("select_day", &error),
        }
    }

    pub async fn load_event(&self, id: &str) {
        info!(command = "load_event", event_id = id, "loading event");
        self.coordinator.load_event(id).await;
    }

    pub async fn create_event(&self, dto: CreateEventDto) {
        info!(command = "create_event", date = %dto.date, "creating event");
        self.coordinator.create_event(dto).await;
    }

    pub async fn update_event(&self, dto: UpdateEventDto) {
        info!(command = "update_event", event_id = %dto.id, "updating event");
        self.coordinator.update_event(dto).await;
    }

    pub async fn delete_event(&self, id: &str) {
        info!(command = "delete_event", event_id = id, "deleting event");
        self.coordinator.delete_event(id).await;
    }

    pub async fn switch_backend(&self, kind: BackendKind) {
        info!(command = "switch_backend", backend = %kind, "switching backend");
        let backend = match (self.backend_factory)(kind, &self.settings) {
            Ok(backend) => backend,
            Err(error) => {
                self.command_error("switch_backend", &error);
                return;
            }
        };
        self.coordinator.replace_backend(backend);
        let mut failures = DeferredFailures::new();
        if kind == BackendKind::Remote {
            if let Err(error) = self.coordinator.ensure_user().await {
                failures.push(("ensure_user", error));
            }
        }
        self.coordinator.refetch().await;
        self.report_failures(failures);
    }

    async fn move_anchor(&self, anchor: NaiveDate, mut failures: DeferredFailures) {
        info!(command = "change_anchor_date", %anchor, "changing anchor date");
        if let Err(error) = self.rebuild_grid(anchor) {
            failures.push(("resolve_active_day", error));
        }
        self.coordinator.change_anchor_date(anchor).await;
        self.report_failures(failures);
    }

    fn rebuild_grid(&self, anchor: NaiveDate) -> Result<(), InfraError> {
        let days = build_month_grid(anchor);
        let resolved = self.selector.resolve(&days, (self.today_provider)());
        let mut grid = self.lock_grid();
        grid.anchor = anchor;
        grid.days = days;
        match resolved {
            Ok(selection) => {
                grid.active_day = selection;
                Ok(())
            }
            Err(error) => {
                grid.active_day = None;
                Err(error)
            }
        }
    }

    fn report_failures(&self, failures: DeferredFailures) {
        for (command, error) in failures {
            self.command_error(command, &error);
        }
    }

    fn anchor(&self) -> NaiveDate {
        self.lock_grid().anchor
    }

    fn command_error(&self, command: &str, error: &InfraError) {
        error!(command, %error, "command failed");
        self.coordinator.report_error(command, error);
    }

    fn lock_grid(&self) -> MutexGuard<'_, GridState> {
        self.grid.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub fn default_backend_factory(config: &AppConfig) -> BackendFactory {
    let api_base_url = config.api_base_url.clone();
    let timeout = Duration::from_secs(config.request_timeout_seconds);
    Arc::new(
        move |kind: BackendKind,
              settings: &SettingsStore|
              -> Result<Arc<dyn EventBackend>, InfraError> {
            match kind {
                BackendKind::Local => Ok(Arc::new(LocalEventBackend::new(settings.clone()))),
                BackendKind::Remote => {
                    let client = ReqwestEventsApiClient::new(&api_base_url, timeout)?;
                    Ok(Arc::new(RemoteEventBackend::new(
                        Arc::new(client),
                        settings.clone(),
                    )))
                }
            }
        },
    )
}

pub fn default_workspace_root() -> Result<PathBuf, InfraError> {
    Ok(std::env::current_dir()?)
}
