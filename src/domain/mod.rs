pub mod active_day;
pub mod calendar_grid;
pub mod event_binder;
pub mod fetch_window;
pub mod models;
