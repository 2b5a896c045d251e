use crate::domain::active_day::resolve_active_day;
use crate::domain::models::{ActiveDaySelection, CalendarDay};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::settings_store::SettingsStore;
use chrono::NaiveDate;
use tracing::debug;

#[derive(Clone)]
pub struct ActiveDaySelector {
    settings: SettingsStore,
}

impl ActiveDaySelector {
    pub fn new(settings: SettingsStore) -> Self {
        Self { settings }
    }

    pub fn resolve(
        &self,
        grid: &[CalendarDay],
        today: NaiveDate,
    ) -> Result<Option<ActiveDaySelection>, InfraError> {
        let persisted = self.settings.selected_day()?;
        let Some(resolution) = resolve_active_day(grid, persisted.as_ref(), today) else {
            return Ok(None);
        };
        if resolution.changed {
            debug!(date = %resolution.selection.date, "persisting re-resolved active day");
            self.settings.save_selected_day(&resolution.selection)?;
        }
        Ok(Some(resolution.selection))
    }

    pub fn select(&self, day: &CalendarDay) -> Result<ActiveDaySelection, InfraError> {
        let selection = ActiveDaySelection::for_day(day);
        self.settings.save_selected_day(&selection)?;
        Ok(selection)
    }

    pub fn clear(&self) -> Result<(), InfraError> {
        self.settings.clear_selected_day()
    }
}
