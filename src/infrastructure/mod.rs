pub mod config;
pub mod error;
pub mod event_backend;
pub mod events_api_client;
pub mod key_value_store;
pub mod local_backend;
pub mod logging;
pub mod remote_backend;
pub mod settings_store;
