use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "event-calendar",
    version,
    about = "Personal event calendar: prints the month view of the workspace"
)]
pub struct Cli {
    #[arg(value_enum)]
    pub navigation: Option<Navigation>,

    #[arg(long = "workspace", value_name = "DIR")]
    pub workspace: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    #[value(name = "prev", alias = "previous")]
    Previous,
    Next,
    Today,
}
