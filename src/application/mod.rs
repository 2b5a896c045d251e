pub mod active_day_selector;
pub mod bootstrap;
pub mod commands;
pub mod sync_coordinator;
