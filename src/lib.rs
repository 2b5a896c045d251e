pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;

use application::bootstrap::bootstrap_workspace;
use application::commands::{CalendarApp, CalendarView};
use cli::Navigation;
use infrastructure::error::InfraError;
use infrastructure::logging::init_tracing;
use std::path::Path;

pub async fn run(
    workspace_root: &Path,
    navigation: Option<Navigation>,
) -> Result<CalendarView, InfraError> {
    let bootstrap = bootstrap_workspace(workspace_root)?;
    init_tracing(&bootstrap.logs_dir)?;

    let app = CalendarApp::new(&bootstrap)?;
    app.initialize().await;
    match navigation {
        Some(Navigation::Previous) => app.show_previous_month().await,
        Some(Navigation::Next) => app.show_next_month().await,
        Some(Navigation::Today) => app.show_today().await,
        None => {}
    }
    Ok(app.calendar_view())
}
